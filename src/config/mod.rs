// ==========================================
// 订单运营后台 - 配置层
// ==========================================
// 职责: 邮件等运行配置,支持多级覆写(环境变量 → config_kv → 默认值)
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

use std::path::PathBuf;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigError, ConfigManager, ConfigResult, MailSettings};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "ORDER_REVIEW_DB_PATH";

/// 获取默认数据库路径
///
/// # 返回
/// - ORDER_REVIEW_DB_PATH 环境变量(非空时)
/// - 用户数据目录/order-review-ops/order_review.db
/// - 无法获取用户数据目录时: ./order_review.db
pub fn get_default_db_path() -> PathBuf {
    // 允许通过环境变量显式指定 DB 路径(便于调试/测试/CI)
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("order-review-ops");
            // 目录创建失败时由后续打开数据库报错
            std::fs::create_dir_all(&dir).ok();
            dir.join("order_review.db")
        }
        None => PathBuf::from("./order_review.db"),
    }
}
