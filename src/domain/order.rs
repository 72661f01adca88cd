// ==========================================
// 订单运营后台 - 订单领域模型
// ==========================================
// 对齐: orders 表
// 红线: (order_id, client_id) 唯一;重复导入为 no-op
// 红线: mail_sent 只允许 false → true,由发送流程写入
// ==========================================

use crate::domain::client::Client;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ==========================================
// Order - 订单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub uuid: Uuid,

    // ===== 外部订单信息 =====
    pub order_id: Option<String>,     // 外部订单号(仅在商户内唯一)
    pub product_ids: Vec<Value>,      // 商品编号列表(任意 JSON 标量,保持顺序)
    pub customer_email: Option<String>, // 顾客邮箱快照
    pub customer_name: Option<String>,  // 顾客姓名快照
    pub client_id: Option<i64>,

    // ===== 评价邀请状态 =====
    pub mail_sent: bool,
    pub mail_sent_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_id: String,
    pub client_id: i64,
    pub product_ids: Vec<Value>,
    pub customer_email: String,
    pub customer_name: Option<String>,
}

// ==========================================
// PendingReview - 待发送评价邀请的订单
// ==========================================
// 订单 + 所属商户快照(商户可能缺失,用于前置校验)
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReview {
    pub order: Order,
    pub client: Option<Client>,
}

impl PendingReview {
    /// 店铺名称(无商户或商户无店铺名时为空串)
    pub fn shop_name(&self) -> &str {
        self.client
            .as_ref()
            .and_then(|c| c.shop.as_deref())
            .unwrap_or("")
    }

    /// 用于日志/报告的订单标识
    pub fn display_ref(&self) -> String {
        match self.order.order_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => format!("#{}", self.order.id),
        }
    }
}

/// 商品编号的展示形式:字符串去掉引号,其他标量原样输出
pub fn display_product_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
