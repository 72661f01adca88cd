// ==========================================
// Repository 集成测试
// ==========================================
// 测试目标: 验证 get-or-create 语义、约束分类与发送查询
// ==========================================


use chrono::Utc;
use order_review_ops::domain::{ErrorClass, NewClient, NewCustomer, NewOrder};
use order_review_ops::repository::{EntityStore, RepositoryError, SqliteEntityStore};
use serde_json::json;
use test_helpers::{create_test_db, insert_raw_order};

fn new_client(email: &str, shop: &str) -> NewClient {
    NewClient {
        email: email.to_string(),
        shop: shop.to_string(),
        first_name: String::new(),
        last_name: String::new(),
    }
}

fn new_customer(email: &str, client_id: i64, name: &str) -> NewCustomer {
    NewCustomer {
        email: email.to_string(),
        client_id,
        name: Some(name.to_string()),
        last_name: None,
        location: None,
    }
}

fn new_order(order_id: &str, client_id: i64) -> NewOrder {
    NewOrder {
        order_id: order_id.to_string(),
        client_id,
        product_ids: vec![json!("P1"), json!(2), json!(null)],
        customer_email: "b@x.com".to_string(),
        customer_name: None,
    }
}

#[test]
fn test_customer_keyed_by_email_and_client() {
    let (_tmp, conn) = create_test_db().unwrap();
    let store = SqliteEntityStore::new(&conn);

    let (a, _) = store.get_or_create_client(&new_client("a@x.com", "ShopA")).unwrap();
    let (z, _) = store.get_or_create_client(&new_client("z@x.com", "ShopZ")).unwrap();

    let (first, created) = store.get_or_create_customer(&new_customer("b@x.com", a.id, "Bob")).unwrap();
    assert!(created);

    // 同一商户: 先写者胜
    let (again, created) = store
        .get_or_create_customer(&new_customer("b@x.com", a.id, "Robert"))
        .unwrap();
    assert!(!created);
    assert_eq!(again.id, first.id);
    assert_eq!(again.name.as_deref(), Some("Bob"));

    // 不同商户: 独立顾客
    let (other, created) = store
        .get_or_create_customer(&new_customer("b@x.com", z.id, "Bob"))
        .unwrap();
    assert!(created);
    assert_ne!(other.id, first.id);
    assert_eq!(store.customers().count().unwrap(), 2);
}

#[test]
fn test_customer_unique_index_rejects_duplicates() {
    let (_tmp, conn) = create_test_db().unwrap();
    let store = SqliteEntityStore::new(&conn);
    let (a, _) = store.get_or_create_client(&new_client("a@x.com", "ShopA")).unwrap();

    store.customers().insert(&new_customer("b@x.com", a.id, "Bob")).unwrap();
    let err = store
        .customers()
        .insert(&new_customer("b@x.com", a.id, "Bob"))
        .unwrap_err();

    assert!(err.is_unique_violation());
    assert_eq!(err.error_class(), ErrorClass::StorageConflict);
}

#[test]
fn test_order_product_ids_round_trip_preserves_order() {
    let (_tmp, conn) = create_test_db().unwrap();
    let store = SqliteEntityStore::new(&conn);
    let (a, _) = store.get_or_create_client(&new_client("a@x.com", "ShopA")).unwrap();

    let (created, _) = store.get_or_create_order(&new_order("ORD1", a.id)).unwrap();
    let (existing, was_created) = store.get_or_create_order(&new_order("ORD1", a.id)).unwrap();

    assert!(!was_created);
    assert_eq!(existing.id, created.id);
    assert_eq!(existing.product_ids, vec![json!("P1"), json!(2), json!(null)]);
    assert_eq!(existing.client_id, Some(a.id));
}

#[test]
fn test_order_with_unknown_client_is_foreign_key_violation() {
    let (_tmp, conn) = create_test_db().unwrap();
    let store = SqliteEntityStore::new(&conn);

    let err = store.get_or_create_order(&new_order("ORD1", 999)).unwrap_err();

    assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    assert_eq!(err.error_class(), ErrorClass::Unexpected);
}

#[test]
fn test_list_unnotified_joins_client_and_orders_newest_first() {
    let (_tmp, conn) = create_test_db().unwrap();
    let store = SqliteEntityStore::new(&conn);
    let (a, _) = store.get_or_create_client(&new_client("a@x.com", "ShopA")).unwrap();

    let (first, _) = store.get_or_create_order(&new_order("ORD1", a.id)).unwrap();
    let (second, _) = store.get_or_create_order(&new_order("ORD2", a.id)).unwrap();
    let orphan = insert_raw_order(&conn, Some("ORD3"), Some("c@x.com"), None);

    let pending = store.list_unnotified_orders(None).unwrap();
    assert_eq!(pending.len(), 3);

    let ids: Vec<i64> = pending.iter().map(|p| p.order.id).collect();
    assert!(ids.iter().position(|id| *id == second.id) < ids.iter().position(|id| *id == first.id));

    let orphan_review = pending.iter().find(|p| p.order.id == orphan).unwrap();
    assert!(orphan_review.client.is_none());
    assert_eq!(orphan_review.shop_name(), "");

    let owned = pending.iter().find(|p| p.order.id == first.id).unwrap();
    assert_eq!(owned.shop_name(), "ShopA");
    assert_eq!(owned.display_ref(), "ORD1");

    assert_eq!(store.list_unnotified_orders(Some(1)).unwrap().len(), 1);
}

#[test]
fn test_list_unnotified_limit_bounds() {
    let (_tmp, conn) = create_test_db().unwrap();
    let store = SqliteEntityStore::new(&conn);
    let (a, _) = store.get_or_create_client(&new_client("a@x.com", "ShopA")).unwrap();
    store.get_or_create_order(&new_order("ORD1", a.id)).unwrap();
    store.get_or_create_order(&new_order("ORD2", a.id)).unwrap();

    // 超出 i64 的上限按最大值处理
    assert_eq!(store.list_unnotified_orders(Some(usize::MAX)).unwrap().len(), 2);
    assert_eq!(store.list_unnotified_orders(Some(0)).unwrap().len(), 0);
}

#[test]
fn test_mark_notified_transitions_once() {
    let (_tmp, conn) = create_test_db().unwrap();
    let store = SqliteEntityStore::new(&conn);
    let (a, _) = store.get_or_create_client(&new_client("a@x.com", "ShopA")).unwrap();
    let (order, _) = store.get_or_create_order(&new_order("ORD1", a.id)).unwrap();

    let sent_at = Utc::now();
    store.mark_order_notified(order.id, sent_at).unwrap();

    let stored = store.orders().find_by_id(order.id).unwrap().unwrap();
    assert!(stored.mail_sent);
    assert_eq!(stored.mail_sent_at, Some(sent_at));

    let err = store.mark_order_notified(order.id, Utc::now()).unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    // 第二次调用不会覆盖首次发送时间
    let stored = store.orders().find_by_id(order.id).unwrap().unwrap();
    assert_eq!(stored.mail_sent_at, Some(sent_at));

    assert!(store.mark_order_notified(12345, Utc::now()).is_err());
}
