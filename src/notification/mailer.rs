// ==========================================
// 订单运营后台 - 评价邀请邮件发送器
// ==========================================
// 工具: askama 模板(HTML + 纯文本) + lettre 多段邮件
// 传输: 生产使用 SmtpTransport;测试使用 StubTransport
// ==========================================

use crate::config::MailSettings;
use crate::domain::{display_product_id, PendingReview};
use crate::notification::error::{NotificationError, NotificationResult};
use crate::notification::sender::{check_delivery_preconditions, NotificationSender};
use askama::Template;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fmt::Display;
use std::time::Duration;
use tracing::{error, info, warn};

/// 默认发件人
pub const DEFAULT_FROM_ADDRESS: &str = "noreply@inflate.review";

/// 默认主题模板({order_id} 为占位符)
pub const DEFAULT_SUBJECT_TEMPLATE: &str = "Partagez votre avis sur votre commande {order_id}";

const FALLBACK_CUSTOMER_NAME: &str = "cher client";

#[derive(Template)]
#[template(path = "email/review_request.html")]
struct ReviewRequestHtml<'a> {
    customer_name: &'a str,
    order_id: &'a str,
    shop: &'a str,
    products: &'a [String],
}

#[derive(Template)]
#[template(path = "email/review_request.txt")]
struct ReviewRequestText<'a> {
    customer_name: &'a str,
    order_id: &'a str,
    shop: &'a str,
    products: &'a [String],
}

// ==========================================
// ReviewMailer
// ==========================================
pub struct ReviewMailer<T> {
    transport: T,
    from_address: String,
    subject_template: String,
}

impl ReviewMailer<SmtpTransport> {
    /// 按邮件配置构建 SMTP 发送器
    ///
    /// 配置了用户名时走 STARTTLS + 认证;否则直连(本地中继)
    pub fn from_settings(settings: &MailSettings) -> NotificationResult<Self> {
        let builder = match settings.smtp_username.as_deref() {
            Some(username) => SmtpTransport::starttls_relay(&settings.smtp_host)?.credentials(
                Credentials::new(
                    username.to_string(),
                    settings.smtp_password.clone().unwrap_or_default(),
                ),
            ),
            None => SmtpTransport::builder_dangerous(&settings.smtp_host),
        };

        let transport = builder
            .port(settings.smtp_port)
            .timeout(Some(Duration::from_secs(settings.smtp_timeout_secs)))
            .build();

        info!(
            host = %settings.smtp_host,
            port = settings.smtp_port,
            authenticated = settings.smtp_username.is_some(),
            "SMTP 发送器已初始化"
        );

        Ok(Self::new(
            transport,
            settings.from_address.clone(),
            settings.subject_template.clone(),
        ))
    }
}

impl<T> ReviewMailer<T>
where
    T: Transport,
    T::Error: Display,
{
    pub fn new(transport: T, from_address: String, subject_template: String) -> Self {
        Self {
            transport,
            from_address,
            subject_template,
        }
    }

    /// 使用默认发件人与主题
    pub fn with_defaults(transport: T) -> Self {
        Self::new(
            transport,
            DEFAULT_FROM_ADDRESS.to_string(),
            DEFAULT_SUBJECT_TEMPLATE.to_string(),
        )
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn subject_for(&self, order_id: &str) -> String {
        self.subject_template.replace("{order_id}", order_id)
    }

    /// 渲染并构建邮件(不发送)
    pub fn build_message(&self, review: &PendingReview) -> NotificationResult<Message> {
        let to = check_delivery_preconditions(review).map_err(|e| {
            NotificationError::InvalidAddress(e.to_string())
        })?;

        let order_id = review.order.order_id.as_deref().unwrap_or_default().trim();
        let customer_name = review
            .order
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_CUSTOMER_NAME);
        let shop = review.shop_name();
        let products: Vec<String> = review.order.product_ids.iter().map(display_product_id).collect();

        let html = ReviewRequestHtml {
            customer_name,
            order_id,
            shop,
            products: &products,
        }
        .render()?;
        let text = ReviewRequestText {
            customer_name,
            order_id,
            shop,
            products: &products,
        }
        .render()?;

        let from: Mailbox = self
            .from_address
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(self.from_address.clone()))?;
        let to: Mailbox = to
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(to.clone()))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject_for(order_id))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?;

        Ok(message)
    }

    /// 构建并投递
    pub fn deliver(&self, review: &PendingReview) -> NotificationResult<()> {
        let message = self.build_message(review)?;
        self.transport
            .send(&message)
            .map_err(|e| NotificationError::Transport(e.to_string()))?;
        Ok(())
    }
}

impl<T> NotificationSender for ReviewMailer<T>
where
    T: Transport,
    T::Error: Display,
{
    fn send(&self, review: &PendingReview) -> bool {
        if let Err(e) = check_delivery_preconditions(review) {
            warn!(order = %review.display_ref(), error = %e, "不满足发送条件");
            return false;
        }

        match self.deliver(review) {
            Ok(()) => {
                info!(
                    order = %review.display_ref(),
                    to = review.order.customer_email.as_deref().unwrap_or_default(),
                    "评价邀请邮件已发送"
                );
                true
            }
            Err(e) => {
                error!(order = %review.display_ref(), error = %e, "评价邀请邮件发送失败");
                false
            }
        }
    }
}
