// ==========================================
// 订单运营后台 - EntityStore 接口
// ==========================================
// 职责: 流水线与持久层之间的边界
// 约束: get_or_create_* 返回 (记录, 是否新建);
//       唯一约束冲突以 UniqueConstraintViolation 暴露
// ==========================================

use crate::domain::{
    Client, Customer, NewClient, NewCustomer, NewOrder, Order, PendingReview,
};
use crate::repository::client_repo::{ClientRepository, CustomerRepository};
use crate::repository::error::RepositoryResult;
use crate::repository::order_repo::OrderRepository;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

// ==========================================
// EntityStore Trait
// ==========================================
// 实现者: SqliteEntityStore
pub trait EntityStore {
    /// 按 email 获取或创建商户(命中时不应用默认值)
    fn get_or_create_client(&self, draft: &NewClient) -> RepositoryResult<(Client, bool)>;

    /// 按 (email, client) 获取或创建顾客
    fn get_or_create_customer(&self, draft: &NewCustomer) -> RepositoryResult<(Customer, bool)>;

    /// 按 (order_id, client) 获取或创建订单
    fn get_or_create_order(&self, draft: &NewOrder) -> RepositoryResult<(Order, bool)>;

    /// 未发送评价邀请的订单快照
    fn list_unnotified_orders(&self, limit: Option<usize>) -> RepositoryResult<Vec<PendingReview>>;

    /// 写入已发送标记与时间
    fn mark_order_notified(&self, order_pk: i64, sent_at: DateTime<Utc>) -> RepositoryResult<()>;
}

// ==========================================
// SqliteEntityStore
// ==========================================
// 可挂在普通连接、事务或保存点之上(三者均 Deref 到 Connection)
pub struct SqliteEntityStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteEntityStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn clients(&self) -> ClientRepository<'c> {
        ClientRepository::from_connection(self.conn)
    }

    pub fn customers(&self) -> CustomerRepository<'c> {
        CustomerRepository::from_connection(self.conn)
    }

    pub fn orders(&self) -> OrderRepository<'c> {
        OrderRepository::from_connection(self.conn)
    }
}

impl EntityStore for SqliteEntityStore<'_> {
    fn get_or_create_client(&self, draft: &NewClient) -> RepositoryResult<(Client, bool)> {
        self.clients().get_or_create(draft)
    }

    fn get_or_create_customer(&self, draft: &NewCustomer) -> RepositoryResult<(Customer, bool)> {
        self.customers().get_or_create(draft)
    }

    fn get_or_create_order(&self, draft: &NewOrder) -> RepositoryResult<(Order, bool)> {
        self.orders().get_or_create(draft)
    }

    fn list_unnotified_orders(&self, limit: Option<usize>) -> RepositoryResult<Vec<PendingReview>> {
        self.orders().list_unnotified(limit)
    }

    fn mark_order_notified(&self, order_pk: i64, sent_at: DateTime<Utc>) -> RepositoryResult<()> {
        self.orders().mark_notified(order_pk, sent_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use serde_json::json;

    fn new_client(email: &str, shop: &str) -> NewClient {
        NewClient {
            email: email.to_string(),
            shop: shop.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[test]
    fn test_get_or_create_client_first_write_wins() {
        let conn = open_in_memory().unwrap();
        let store = SqliteEntityStore::new(&conn);

        let (first, created) = store.get_or_create_client(&new_client("a@x.com", "ShopA")).unwrap();
        assert!(created);

        let mut changed = new_client("a@x.com", "ShopB");
        changed.first_name = "Grace".to_string();
        let (second, created) = store.get_or_create_client(&changed).unwrap();

        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.shop.as_deref(), Some("ShopA"));
        assert_eq!(second.first_name, "Ada");
        assert!(second.is_active);
    }

    #[test]
    fn test_shop_reuse_is_unique_violation() {
        let conn = open_in_memory().unwrap();
        let store = SqliteEntityStore::new(&conn);

        store.get_or_create_client(&new_client("a@x.com", "ShopA")).unwrap();
        let err = store
            .get_or_create_client(&new_client("other@x.com", "ShopA"))
            .unwrap_err();

        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_same_order_id_for_two_clients_is_two_orders() {
        let conn = open_in_memory().unwrap();
        let store = SqliteEntityStore::new(&conn);

        let (a, _) = store.get_or_create_client(&new_client("a@x.com", "ShopA")).unwrap();
        let (b, _) = store.get_or_create_client(&new_client("b@x.com", "ShopB")).unwrap();

        for client_id in [a.id, b.id] {
            let (_, created) = store
                .get_or_create_order(&NewOrder {
                    order_id: "ORD1".to_string(),
                    client_id,
                    product_ids: vec![json!("P1")],
                    customer_email: "c@x.com".to_string(),
                    customer_name: None,
                })
                .unwrap();
            assert!(created);
        }

        assert_eq!(store.orders().count().unwrap(), 2);
    }

    #[test]
    fn test_mark_notified_only_once() {
        let conn = open_in_memory().unwrap();
        let store = SqliteEntityStore::new(&conn);

        let (client, _) = store.get_or_create_client(&new_client("a@x.com", "ShopA")).unwrap();
        let (order, _) = store
            .get_or_create_order(&NewOrder {
                order_id: "ORD1".to_string(),
                client_id: client.id,
                product_ids: vec![json!("P1"), json!(2)],
                customer_email: "c@x.com".to_string(),
                customer_name: Some("Claude".to_string()),
            })
            .unwrap();

        let pending = store.list_unnotified_orders(None).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].shop_name(), "ShopA");
        assert_eq!(pending[0].order.product_ids, vec![json!("P1"), json!(2)]);

        store.mark_order_notified(order.id, Utc::now()).unwrap();
        assert!(store.mark_order_notified(order.id, Utc::now()).is_err());
        assert!(store.list_unnotified_orders(None).unwrap().is_empty());

        let stored = store.orders().find_by_id(order.id).unwrap().unwrap();
        assert!(stored.mail_sent);
        assert!(stored.mail_sent_at.is_some());
    }
}
