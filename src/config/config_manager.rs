// ==========================================
// 订单运营后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 优先级: 环境变量(ORDER_REVIEW_*) > config_kv 表(global) > 默认值
// ==========================================

use crate::notification::{DEFAULT_FROM_ADDRESS, DEFAULT_SUBJECT_TEMPLATE};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// 环境变量前缀
pub const DEFAULT_ENV_PREFIX: &str = "ORDER_REVIEW_";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置读取失败: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("配置值不合法 (key={key}, value={value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// MailSettings - 邮件发送配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSettings {
    pub from_address: String,
    pub subject_template: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_timeout_secs: u64,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            subject_template: DEFAULT_SUBJECT_TEMPLATE.to_string(),
            smtp_host: defaults::SMTP_HOST.to_string(),
            smtp_port: defaults::SMTP_PORT,
            smtp_username: None,
            smtp_password: None,
            smtp_timeout_secs: defaults::SMTP_TIMEOUT_SECS,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager<'c> {
    conn: &'c Connection,
    env_prefix: String,
}

impl<'c> ConfigManager<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self::with_env_prefix(conn, DEFAULT_ENV_PREFIX)
    }

    /// 指定环境变量前缀(测试隔离用)
    pub fn with_env_prefix(conn: &'c Connection, prefix: &str) -> Self {
        Self {
            conn,
            env_prefix: prefix.to_string(),
        }
    }

    /// 配置键对应的环境变量名: 前缀 + 大写键名,'.' 替换为 '_'
    pub fn env_var_name(&self, key: &str) -> String {
        format!("{}{}", self.env_prefix, key.replace('.', "_").to_uppercase())
    }

    /// 从 config_kv 表读取配置值(scope_id='global')
    fn get_stored_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 按优先级读取配置值
    ///
    /// # 返回
    /// - Some(String): 环境变量或 config_kv 中的值
    /// - None: 两者均未设置
    pub fn get_value(&self, key: &str) -> ConfigResult<Option<String>> {
        if let Ok(value) = std::env::var(self.env_var_name(key)) {
            if !value.trim().is_empty() {
                debug!(key = key, "配置来自环境变量");
                return Ok(Some(value));
            }
        }
        self.get_stored_value(key)
    }

    pub fn get_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    fn get_parsed<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_value(key)? {
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
                message: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    /// 写入 global 配置(UPSERT)
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        self.conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    // ===== 邮件配置 =====

    pub fn mail_settings(&self) -> ConfigResult<MailSettings> {
        Ok(MailSettings {
            from_address: self.get_or_default(config_keys::MAIL_FROM_ADDRESS, DEFAULT_FROM_ADDRESS)?,
            subject_template: self
                .get_or_default(config_keys::MAIL_SUBJECT_TEMPLATE, DEFAULT_SUBJECT_TEMPLATE)?,
            smtp_host: self.get_or_default(config_keys::MAIL_SMTP_HOST, defaults::SMTP_HOST)?,
            smtp_port: self.get_parsed(config_keys::MAIL_SMTP_PORT, defaults::SMTP_PORT)?,
            smtp_username: self.get_value(config_keys::MAIL_SMTP_USERNAME)?,
            smtp_password: self.get_value(config_keys::MAIL_SMTP_PASSWORD)?,
            smtp_timeout_secs: self
                .get_parsed(config_keys::MAIL_SMTP_TIMEOUT_SECS, defaults::SMTP_TIMEOUT_SECS)?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 发件人与主题
    pub const MAIL_FROM_ADDRESS: &str = "mail.from_address";
    pub const MAIL_SUBJECT_TEMPLATE: &str = "mail.subject_template"; // {order_id} 为占位符

    // SMTP
    pub const MAIL_SMTP_HOST: &str = "mail.smtp_host";
    pub const MAIL_SMTP_PORT: &str = "mail.smtp_port";
    pub const MAIL_SMTP_USERNAME: &str = "mail.smtp_username";
    pub const MAIL_SMTP_PASSWORD: &str = "mail.smtp_password";
    pub const MAIL_SMTP_TIMEOUT_SECS: &str = "mail.smtp_timeout_secs";
}

mod defaults {
    pub const SMTP_HOST: &str = "localhost";
    pub const SMTP_PORT: u16 = 25;
    pub const SMTP_TIMEOUT_SECS: u64 = 30;
}
