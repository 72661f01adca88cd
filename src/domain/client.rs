// ==========================================
// 订单运营后台 - 商户与顾客领域模型
// ==========================================
// 对齐: clients / customers 表
// 红线: 导入只做 get-or-create,已存在记录不被后续行覆盖
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Client - 商户(店铺)账号
// ==========================================
// 唯一键: email / shop(均可为空)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    // ===== 基础字段 =====
    pub id: i64,
    pub uuid: Uuid,

    // ===== 业务字段 =====
    pub email: Option<String>,
    pub shop: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建商户时使用的默认值
///
/// 仅在按 email 未命中时生效,命中则原样返回已有记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub email: String,
    pub shop: String,
    pub first_name: String,
    pub last_name: String,
}

// ==========================================
// Customer - 终端顾客
// ==========================================
// 业务键: (email, client_id)
// 级联: 商户删除时一并删除
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub uuid: Uuid,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub client_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub email: String,
    pub client_id: i64,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
}
