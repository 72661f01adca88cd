// ==========================================
// 订单运营后台 - 导入层
// ==========================================
// 职责: CSV 客户/订单数据批量导入
// 流程: file_parser → import_row(record_validator) → csv_importer
// ==========================================

pub mod csv_importer;
pub mod error;
pub mod file_parser;
pub mod import_row;
pub mod record_validator;

// 重导出核心类型
pub use csv_importer::{CsvImporter, ImportOptions};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, CsvSource};
pub use import_row::{ImportRow, RawRow, REQUIRED_COLUMNS};
pub use record_validator::FieldError;
