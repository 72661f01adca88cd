// ==========================================
// 订单运营后台 - 通知模块错误类型
// ==========================================
// PreconditionError:  单个订单不满足发送前置条件(行级,记为跳过)
// NotificationError:  发送器构建/批次事务等错误(批次级)
// ==========================================

use crate::domain::ErrorClass;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 发送前置条件错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("订单 {order}: 缺少顾客邮箱")]
    MissingEmail { order: String },

    #[error("订单 {order}: 顾客邮箱 '{email}' 不是有效的邮箱地址")]
    InvalidEmail { order: String, email: String },

    #[error("订单 {order}: 缺少订单号")]
    MissingOrderId { order: String },

    #[error("订单 {order}: 没有所属商户")]
    MissingClient { order: String },
}

impl PreconditionError {
    pub fn error_class(&self) -> ErrorClass {
        match self {
            PreconditionError::InvalidEmail { .. } => ErrorClass::InvalidFormat,
            _ => ErrorClass::EmptyField,
        }
    }
}

/// 通知模块错误类型
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("邮件模板渲染失败: {0}")]
    Template(#[from] askama::Error),

    #[error("邮件构建失败: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("邮箱地址不合法: {0}")]
    InvalidAddress(String),

    #[error("SMTP 配置错误: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("邮件投递失败: {0}")]
    Transport(String),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for NotificationError {
    fn from(err: rusqlite::Error) -> Self {
        NotificationError::DatabaseTransactionError(err.to_string())
    }
}

/// Result 类型别名
pub type NotificationResult<T> = Result<T, NotificationError>;
