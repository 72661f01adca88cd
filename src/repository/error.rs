// ==========================================
// 订单运营后台 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 唯一约束冲突必须可区分(行级 StorageConflict)
// ==========================================

use crate::domain::ErrorClass;
use rusqlite::ffi;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 数据质量错误 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },
}

impl RepositoryError {
    /// 行级错误分类: 唯一冲突 → StorageConflict,其余 → Unexpected
    pub fn error_class(&self) -> ErrorClass {
        match self {
            RepositoryError::UniqueConstraintViolation(_) => ErrorClass::StorageConflict,
            _ => ErrorClass::Unexpected,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, RepositoryError::UniqueConstraintViolation(_))
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let msg = msg.unwrap_or_else(|| code.to_string());
                if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || code.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || msg.contains("UNIQUE")
                {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if code.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY
                    || msg.contains("FOREIGN KEY")
                {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
