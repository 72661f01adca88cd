// ==========================================
// 订单运营后台 - 记录字段校验
// ==========================================
// 职责: 单字段纯函数校验(邮箱 / 必填文本 / 可选文本 / 列表字段)
// 约束: 无副作用;所有结果以 Result 返回,绝不 panic
// ==========================================

use crate::domain::ErrorClass;
use regex::Regex;
use serde_json::Value;
use std::net::IpAddr;
use std::sync::OnceLock;
use thiserror::Error;

/// 邮箱地址最大长度(RFC 5321)
pub const MAX_EMAIL_LENGTH: usize = 254;

/// 字段级校验错误(携带行号与字段名)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("第 {line} 行: {field} 为空")]
    EmptyField { line: usize, field: String },

    #[error("第 {line} 行: {field} '{value}' 不是有效的邮箱地址")]
    InvalidFormat {
        line: usize,
        field: String,
        value: String,
    },

    #[error("第 {line} 行: {field} 不是合法的 JSON: {detail}")]
    MalformedList {
        line: usize,
        field: String,
        detail: String,
    },

    #[error("第 {line} 行: {field} 必须是 JSON 列表")]
    NotAList { line: usize, field: String },
}

impl FieldError {
    pub fn error_class(&self) -> ErrorClass {
        match self {
            FieldError::EmptyField { .. } => ErrorClass::EmptyField,
            FieldError::InvalidFormat { .. } => ErrorClass::InvalidFormat,
            FieldError::MalformedList { .. } => ErrorClass::MalformedList,
            FieldError::NotAList { .. } => ErrorClass::NotAList,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            FieldError::EmptyField { line, .. }
            | FieldError::InvalidFormat { line, .. }
            | FieldError::MalformedList { line, .. }
            | FieldError::NotAList { line, .. } => *line,
        }
    }
}

fn local_part_regex() -> &'static Regex {
    static LOCAL_RE: OnceLock<Regex> = OnceLock::new();
    LOCAL_RE.get_or_init(|| {
        // dot-atom
        Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$")
            .expect("local part regex is valid")
    })
}

fn domain_regex() -> &'static Regex {
    static DOMAIN_RE: OnceLock<Regex> = OnceLock::new();
    DOMAIN_RE.get_or_init(|| {
        // 点分 DNS 标签,末级标签至少 2 位
        Regex::new(
            r"^([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])$",
        )
        .expect("domain regex is valid")
    })
}

/// 不需要点分结构即可接受的域名
const DOMAIN_ALLOWLIST: [&str; 1] = ["localhost"];

/// 域名部分是否合法
///
/// 依次尝试: 白名单 → 方括号 IP 字面量 → DNS 域名 → 国际化域名(转 punycode 后重试)
fn is_valid_domain(domain: &str) -> bool {
    if DOMAIN_ALLOWLIST
        .iter()
        .any(|allowed| domain.eq_ignore_ascii_case(allowed))
    {
        return true;
    }

    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        return literal.parse::<IpAddr>().is_ok();
    }

    if domain_regex().is_match(domain) {
        return true;
    }

    if domain.is_ascii() {
        return false;
    }
    match idna::domain_to_ascii(domain) {
        Ok(ascii) => domain_regex().is_match(&ascii),
        Err(_) => false,
    }
}

/// 邮箱语法是否合法(不做 trim)
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return false;
    }
    match email.rsplit_once('@') {
        Some((local, domain)) => local_part_regex().is_match(local) && is_valid_domain(domain),
        None => false,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 校验邮箱字段
///
/// # 返回
/// - Ok(String): trim 后的邮箱(大小写不变)
/// - Err(EmptyField): 缺失或空白
/// - Err(InvalidFormat): 语法不合法
pub fn validate_email(value: Option<&str>, field: &str, line: usize) -> Result<String, FieldError> {
    let email = non_blank(value).ok_or_else(|| FieldError::EmptyField {
        line,
        field: field.to_string(),
    })?;

    if !is_valid_email(email) {
        return Err(FieldError::InvalidFormat {
            line,
            field: field.to_string(),
            value: email.to_string(),
        });
    }

    Ok(email.to_string())
}

/// 校验必填文本字段
pub fn validate_required(
    value: Option<&str>,
    field: &str,
    line: usize,
) -> Result<String, FieldError> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| FieldError::EmptyField {
            line,
            field: field.to_string(),
        })
}

/// 可选文本字段: trim 后为空视为 None
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

/// 校验列表字段(商品编号)
///
/// # 返回
/// - Ok(Vec<Value>): 原样保留元素与顺序
/// - Err(EmptyField / MalformedList / NotAList)
pub fn validate_list(
    value: Option<&str>,
    field: &str,
    line: usize,
) -> Result<Vec<Value>, FieldError> {
    let raw = non_blank(value).ok_or_else(|| FieldError::EmptyField {
        line,
        field: field.to_string(),
    })?;

    let parsed: Value = serde_json::from_str(raw).map_err(|e| FieldError::MalformedList {
        line,
        field: field.to_string(),
        detail: e.to_string(),
    })?;

    match parsed {
        Value::Array(items) => Ok(items),
        _ => Err(FieldError::NotAList {
            line,
            field: field.to_string(),
        }),
    }
}
