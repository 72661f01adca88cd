// ==========================================
// 订单运营后台 - 领域模型层
// ==========================================
// 职责: 定义实体、草稿(待创建)结构与批处理结果类型
// 红线: 不含数据访问逻辑
// ==========================================

pub mod client;
pub mod order;
pub mod outcome;

// 重导出核心类型
pub use client::{Client, Customer, NewClient, NewCustomer};
pub use order::{display_product_id, NewOrder, Order, PendingReview};
pub use outcome::{
    BatchOutcome, CommitDecision, ErrorClass, OutcomeError, OutcomeKind, RowResult, RunMode,
};
