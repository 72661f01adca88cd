// ==========================================
// 订单运营后台 - 通知层
// ==========================================
// 职责: 向未通知订单的顾客发送评价邀请邮件(每单一次)
// 组成: sender(接口 + 前置条件) / mailer(SMTP 实现) / dispatcher(批次流水线)
// ==========================================

pub mod dispatcher;
pub mod error;
pub mod mailer;
pub mod sender;

// 重导出核心类型
pub use dispatcher::{DispatchOptions, ReviewDispatcher};
pub use error::{NotificationError, NotificationResult, PreconditionError};
pub use mailer::{ReviewMailer, DEFAULT_FROM_ADDRESS, DEFAULT_SUBJECT_TEMPLATE};
pub use sender::{check_delivery_preconditions, NotificationSender};
