// ==========================================
// 订单运营后台 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + SMTP
// 工作流: CSV 批量导入 / 评价邀请邮件发送
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与批处理结果
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - CSV 数据
pub mod importer;

// 通知层 - 评价邀请邮件
pub mod notification;

// 运行报告
pub mod report;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施(连接初始化/PRAGMA 统一/建表)
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    BatchOutcome, Client, CommitDecision, Customer, ErrorClass, Order, OutcomeKind, PendingReview,
    RowResult, RunMode,
};

// 流水线
pub use importer::{CsvImporter, ImportOptions};
pub use notification::{DispatchOptions, NotificationSender, ReviewDispatcher, ReviewMailer};
pub use report::{BatchRun, RunReport};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订单运营后台";
