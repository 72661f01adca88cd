// ==========================================
// 订单运营后台 - 导入行结构
// ==========================================
// RawRow:    CSV 原始行(列名 → 值)+ 物理行号
// ImportRow: 全部字段校验通过后才会产生的已校验行
// 红线: 落库阶段只接触 ImportRow,不接触原始行
// ==========================================

use crate::domain::{NewClient, NewCustomer, NewOrder};
use crate::importer::record_validator::{
    normalize_optional, validate_email, validate_list, validate_required, FieldError,
};
use serde_json::Value;
use std::collections::HashMap;

// ===== 列名 =====
pub const COL_CLIENT_EMAIL: &str = "client_email";
pub const COL_CLIENT_SHOP: &str = "client_shop";
pub const COL_CLIENT_FIRST_NAME: &str = "client_first_name";
pub const COL_CLIENT_LAST_NAME: &str = "client_last_name";
pub const COL_USER_EMAIL: &str = "user_email";
pub const COL_USER_NAME: &str = "user_name";
pub const COL_USER_LAST_NAME: &str = "user_last_name";
pub const COL_USER_LOCATION: &str = "user_location";
pub const COL_ORDER_ID: &str = "order_id";
pub const COL_PRODUCT_IDS: &str = "product_ids";

/// CSV 必需列清单(区分大小写)
pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_CLIENT_EMAIL,
    COL_CLIENT_SHOP,
    COL_CLIENT_FIRST_NAME,
    COL_CLIENT_LAST_NAME,
    COL_USER_EMAIL,
    COL_USER_NAME,
    COL_USER_LAST_NAME,
    COL_USER_LOCATION,
    COL_ORDER_ID,
    COL_PRODUCT_IDS,
];

// ==========================================
// RawRow - 原始行
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub line: usize, // 物理行号(表头为第 1 行)
    pub fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.fields.insert(column.to_string(), value.to_string());
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

// ==========================================
// ImportRow - 已校验行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub line: usize,

    // ===== 商户 =====
    pub client_email: String,
    pub client_shop: String,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,

    // ===== 顾客 =====
    pub user_email: String,
    pub user_name: Option<String>,
    pub user_last_name: Option<String>,
    pub user_location: Option<String>,

    // ===== 订单 =====
    pub order_id: String,
    pub product_ids: Vec<Value>,
}

impl ImportRow {
    /// 校验整行,收集全部字段错误
    ///
    /// # 校验顺序
    /// client_email → user_email → product_ids → client_shop → order_id
    ///
    /// # 返回
    /// - Ok(ImportRow): 全部通过
    /// - Err(Vec<FieldError>): 至少一个字段不合法(非空)
    pub fn validate(raw: &RawRow) -> Result<ImportRow, Vec<FieldError>> {
        let line = raw.line;
        let mut errors = Vec::new();

        let client_email = validate_email(raw.get(COL_CLIENT_EMAIL), COL_CLIENT_EMAIL, line)
            .map_err(|e| errors.push(e))
            .ok();
        let user_email = validate_email(raw.get(COL_USER_EMAIL), COL_USER_EMAIL, line)
            .map_err(|e| errors.push(e))
            .ok();
        let product_ids = validate_list(raw.get(COL_PRODUCT_IDS), COL_PRODUCT_IDS, line)
            .map_err(|e| errors.push(e))
            .ok();
        let client_shop = validate_required(raw.get(COL_CLIENT_SHOP), COL_CLIENT_SHOP, line)
            .map_err(|e| errors.push(e))
            .ok();
        let order_id = validate_required(raw.get(COL_ORDER_ID), COL_ORDER_ID, line)
            .map_err(|e| errors.push(e))
            .ok();

        match (client_email, user_email, product_ids, client_shop, order_id) {
            (
                Some(client_email),
                Some(user_email),
                Some(product_ids),
                Some(client_shop),
                Some(order_id),
            ) if errors.is_empty() => Ok(ImportRow {
                line,
                client_email,
                client_shop,
                client_first_name: normalize_optional(raw.get(COL_CLIENT_FIRST_NAME)),
                client_last_name: normalize_optional(raw.get(COL_CLIENT_LAST_NAME)),
                user_email,
                user_name: normalize_optional(raw.get(COL_USER_NAME)),
                user_last_name: normalize_optional(raw.get(COL_USER_LAST_NAME)),
                user_location: normalize_optional(raw.get(COL_USER_LOCATION)),
                order_id,
                product_ids,
            }),
            _ => Err(errors),
        }
    }

    pub fn new_client(&self) -> NewClient {
        NewClient {
            email: self.client_email.clone(),
            shop: self.client_shop.clone(),
            first_name: self.client_first_name.clone().unwrap_or_default(),
            last_name: self.client_last_name.clone().unwrap_or_default(),
        }
    }

    pub fn new_customer(&self, client_id: i64) -> NewCustomer {
        NewCustomer {
            email: self.user_email.clone(),
            client_id,
            name: self.user_name.clone(),
            last_name: self.user_last_name.clone(),
            location: self.user_location.clone(),
        }
    }

    pub fn new_order(&self, client_id: i64) -> NewOrder {
        NewOrder {
            order_id: self.order_id.clone(),
            client_id,
            product_ids: self.product_ids.clone(),
            customer_email: self.user_email.clone(),
            customer_name: self.user_name.clone(),
        }
    }
}
