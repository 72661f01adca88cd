// ==========================================
// 订单运营后台 - 通知发送接口
// ==========================================
// 职责: 发送流水线与邮件投递之间的边界
// 约束: send 只返回成功/失败,不修改订单状态
// ==========================================

use crate::domain::PendingReview;
use crate::importer::record_validator::is_valid_email;
use crate::notification::error::PreconditionError;

// ==========================================
// NotificationSender Trait
// ==========================================
// 实现者: ReviewMailer<T: lettre::Transport>
pub trait NotificationSender {
    /// 发送评价邀请;仅当投递被传输层接受时返回 true
    fn send(&self, review: &PendingReview) -> bool;
}

impl<S: NotificationSender + ?Sized> NotificationSender for &S {
    fn send(&self, review: &PendingReview) -> bool {
        (**self).send(review)
    }
}

impl<S: NotificationSender + ?Sized> NotificationSender for Box<S> {
    fn send(&self, review: &PendingReview) -> bool {
        (**self).send(review)
    }
}

/// 发送前置条件(按顺序检查,首个不满足即返回)
///
/// 1. 顾客邮箱存在
/// 2. 顾客邮箱合法
/// 3. 订单号存在
/// 4. 所属商户存在
///
/// # 返回
/// - Ok(String): trim 后的收件地址
pub fn check_delivery_preconditions(review: &PendingReview) -> Result<String, PreconditionError> {
    let order = review.display_ref();

    let email = review
        .order
        .customer_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| PreconditionError::MissingEmail {
            order: order.clone(),
        })?;

    if !is_valid_email(email) {
        return Err(PreconditionError::InvalidEmail {
            order,
            email: email.to_string(),
        });
    }

    let has_order_id = review
        .order
        .order_id
        .as_deref()
        .map_or(false, |id| !id.trim().is_empty());
    if !has_order_id {
        return Err(PreconditionError::MissingOrderId { order });
    }

    if review.client.is_none() {
        return Err(PreconditionError::MissingClient { order });
    }

    Ok(email.to_string())
}
