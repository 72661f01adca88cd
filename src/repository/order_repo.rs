// ==========================================
// 订单运营后台 - 订单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: (order_id, client_id) 唯一,重复导入返回已有记录,不做更新
// 红线: mark_notified 只做 false → true
// ==========================================

use crate::domain::{NewOrder, Order, PendingReview};
use crate::repository::client_repo::{map_client_at, uuid_column};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "o.id, o.uuid, o.order_id, o.product_ids, o.customer_email, \
     o.customer_name, o.client_id, o.mail_sent, o.mail_sent_at, o.created_at, o.updated_at";

/// orders 列数(联表时商户字段从此偏移开始)
const ORDER_COLUMN_COUNT: usize = 11;

const CLIENT_JOIN_COLUMNS: &str = "c.id, c.uuid, c.email, c.shop, c.first_name, c.last_name, \
     c.is_active, c.created_at, c.updated_at";

/// 解析 product_ids JSON 列(NULL 视为空列表)
fn product_ids_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<Value>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(Vec::new()),
        Some(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(Value::Null) => Ok(Vec::new()),
            Ok(other) => Ok(vec![other]),
            Err(e) => Err(rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                Box::new(e),
            )),
        },
    }
}

fn map_order(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        uuid: uuid_column(row, 1)?,
        order_id: row.get(2)?,
        product_ids: product_ids_column(row, 3)?,
        customer_email: row.get(4)?,
        customer_name: row.get(5)?,
        client_id: row.get(6)?,
        mail_sent: row.get::<_, i64>(7)? != 0,
        mail_sent_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn map_pending_review(row: &Row<'_>) -> rusqlite::Result<PendingReview> {
    let order = map_order(row)?;
    let client = match row.get::<_, Option<i64>>(ORDER_COLUMN_COUNT)? {
        Some(_) => Some(map_client_at(row, ORDER_COLUMN_COUNT)?),
        None => None,
    };
    Ok(PendingReview { order, client })
}

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository<'c> {
    conn: &'c Connection,
}

impl<'c> OrderRepository<'c> {
    pub fn from_connection(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders o WHERE o.id = ?1", ORDER_COLUMNS);
        let order = self.conn.query_row(&sql, params![id], map_order).optional()?;
        Ok(order)
    }

    /// 按业务键 (order_id, client_id) 查询
    pub fn find_by_key(&self, order_id: &str, client_id: i64) -> RepositoryResult<Option<Order>> {
        let sql = format!(
            "SELECT {} FROM orders o WHERE o.order_id = ?1 AND o.client_id = ?2",
            ORDER_COLUMNS
        );
        let order = self
            .conn
            .query_row(&sql, params![order_id, client_id], map_order)
            .optional()?;
        Ok(order)
    }

    pub fn insert(&self, draft: &NewOrder) -> RepositoryResult<Order> {
        let now = Utc::now();
        let product_json = serde_json::to_string(&draft.product_ids).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "product_ids".to_string(),
                message: e.to_string(),
            }
        })?;

        self.conn.execute(
            r#"
            INSERT INTO orders (
                uuid, order_id, product_ids, customer_email, customer_name,
                client_id, mail_sent, mail_sent_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, ?7, ?7)
            "#,
            params![
                Uuid::new_v4().to_string(),
                draft.order_id,
                product_json,
                draft.customer_email,
                draft.customer_name,
                draft.client_id,
                now,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_by_id(id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Order".to_string(),
            id: id.to_string(),
        })
    }

    pub fn get_or_create(&self, draft: &NewOrder) -> RepositoryResult<(Order, bool)> {
        if let Some(existing) = self.find_by_key(&draft.order_id, draft.client_id)? {
            debug!(order_id = %draft.order_id, client_id = draft.client_id, "订单已存在");
            return Ok((existing, false));
        }

        let order = self.insert(draft)?;
        debug!(order_id = %draft.order_id, client_id = draft.client_id, "订单已创建");
        Ok((order, true))
    }

    /// 查询未发送评价邀请的订单(附带商户),按默认排序(新 → 旧)
    ///
    /// # 参数
    /// - limit: 最多返回条数,None 表示不限
    pub fn list_unnotified(&self, limit: Option<usize>) -> RepositoryResult<Vec<PendingReview>> {
        let limit = sql_limit(limit);
        let sql = format!(
            r#"
            SELECT {}, {}
            FROM orders o
            LEFT JOIN clients c ON c.id = o.client_id
            WHERE o.mail_sent = 0
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT ?1
            "#,
            ORDER_COLUMNS, CLIENT_JOIN_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let reviews = stmt
            .query_map(params![limit], map_pending_review)?
            .collect::<rusqlite::Result<Vec<PendingReview>>>()?;
        Ok(reviews)
    }

    /// 标记已发送(仅对 mail_sent = 0 的订单生效)
    ///
    /// # 返回
    /// - Ok(()): 状态已由 false 变为 true
    /// - Err(NotFound): 订单不存在或已标记
    pub fn mark_notified(&self, id: i64, sent_at: DateTime<Utc>) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            r#"
            UPDATE orders
            SET mail_sent = 1, mail_sent_at = ?2, updated_at = ?2
            WHERE id = ?1 AND mail_sent = 0
            "#,
            params![id, sent_at],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Order(mail_sent = 0)".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?)
    }

    pub fn count_unnotified(&self) -> RepositoryResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE mail_sent = 0",
            [],
            |row| row.get(0),
        )?)
    }
}

/// 转为 SQLite LIMIT 参数
///
/// SQLite 中负数 LIMIT 表示不限;超出 i64 的上限按 i64::MAX 处理
fn sql_limit(limit: Option<usize>) -> i64 {
    limit
        .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}
