// ==========================================
// 订单运营后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 此处只放批次级(致命)错误;行级校验错误见 record_validator::FieldError
// ==========================================

use crate::domain::ErrorClass;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型(批次级,出现即终止,不处理任何行)
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("无权限读取文件: {0}")]
    PermissionDenied(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("无法解码文件 {path}(期望 UTF-8): {message}")]
    EncodingError { path: String, message: String },

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 结构错误 =====
    #[error("CSV 文件为空或缺少表头")]
    EmptyFile,

    #[error("CSV 缺少必需列: {}。必需列: {}", .missing.join(", "), .required.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        required: Vec<String>,
    },

    // ===== 数据库错误 =====
    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ImportError {
    pub fn error_class(&self) -> ErrorClass {
        match self {
            ImportError::EmptyFile | ImportError::MissingColumns { .. } => ErrorClass::Schema,
            _ => ErrorClass::Unexpected,
        }
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseTransactionError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
