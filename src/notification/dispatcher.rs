// ==========================================
// 订单运营后台 - 评价邀请发送流水线
// ==========================================
// 流程: 快照未发送订单 → 前置校验 → 发送 → 标记已发送(保存点) → 提交/回滚 → 报告
// 红线: 每个订单最多标记一次;标记只在发送成功后写入
// 红线: 模拟运行不调用发送器,不修改任何标记
// ==========================================

use crate::db::finish_transaction;
use crate::domain::{BatchOutcome, ErrorClass, OutcomeError, PendingReview, RowResult, RunMode};
use crate::notification::error::NotificationResult;
use crate::notification::sender::{check_delivery_preconditions, NotificationSender};
use crate::report::{BatchRun, ReportKind};
use crate::repository::{EntityStore, RepositoryError, SqliteEntityStore};
use chrono::Utc;
use rusqlite::{Connection, Transaction};
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    pub mode: RunMode,
    pub limit: Option<usize>, // None = 不限
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Live,
            limit: None,
        }
    }
}

// ==========================================
// ReviewDispatcher
// ==========================================
pub struct ReviewDispatcher<S> {
    sender: S,
    options: DispatchOptions,
}

impl<S: NotificationSender> ReviewDispatcher<S> {
    pub fn new(sender: S, options: DispatchOptions) -> Self {
        Self { sender, options }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// 对所有未发送评价邀请的订单执行一次发送
    ///
    /// # 返回
    /// - Ok(BatchRun): 批次已处理(含跳过/失败订单)
    /// - Err(NotificationError): 事务或查询级错误
    #[instrument(skip(self, conn), fields(mode = %self.options.mode, limit = ?self.options.limit))]
    pub fn run(&self, conn: &mut Connection) -> NotificationResult<BatchRun> {
        let mode = self.options.mode;
        let mut tx = conn.transaction()?;

        let pending = SqliteEntityStore::new(&tx).list_unnotified_orders(self.options.limit)?;
        info!(pending = pending.len(), "开始发送评价邀请");

        let outcome: BatchOutcome = pending
            .iter()
            .map(|review| self.process_order(&mut tx, review))
            .collect();

        let run = BatchRun::new(ReportKind::Dispatch, mode, outcome);
        finish_transaction(tx, run.decision)?;

        info!(
            success = run.report.success_count,
            skipped = run.report.skipped_count,
            failed = run.report.failed_count,
            decision = ?run.decision,
            "评价邀请发送完成"
        );
        Ok(run)
    }

    fn process_order(&self, tx: &mut Transaction<'_>, review: &PendingReview) -> RowResult {
        let order = review.display_ref();

        let to = match check_delivery_preconditions(review) {
            Ok(to) => to,
            Err(e) => {
                warn!(order = %order, error_class = %e.error_class(), "{}", e);
                return RowResult::Skipped {
                    errors: vec![OutcomeError::new(e.error_class(), e.to_string())],
                };
            }
        };

        if self.options.mode.is_dry_run() {
            return RowResult::Success {
                message: format!("订单 {}: [模拟] 将发送评价邀请至 {}", order, to),
            };
        }

        if !self.sender.send(review) {
            warn!(order = %order, to = %to, "评价邀请发送失败,留待下次运行");
            return RowResult::Failed {
                error: OutcomeError::new(
                    ErrorClass::TransportFailure,
                    format!("订单 {}: 发送评价邀请至 {} 失败", order, to),
                ),
            };
        }

        match mark_notified(tx, review) {
            Ok(()) => RowResult::Success {
                message: format!("订单 {}: 评价邀请已发送至 {}", order, to),
            },
            Err(e) => {
                // 邮件已发出但标记未写入: 下次运行会再次发送
                error!(order = %order, error = %e, "邮件已发送,但标记已发送失败");
                RowResult::Failed {
                    error: OutcomeError::new(
                        e.error_class(),
                        format!("订单 {}: 邮件已发送,但标记失败: {}", order, e),
                    ),
                }
            }
        }
    }
}

fn mark_notified(tx: &mut Transaction<'_>, review: &PendingReview) -> Result<(), RepositoryError> {
    let sp = tx.savepoint()?;
    SqliteEntityStore::new(&sp).mark_order_notified(review.order.id, Utc::now())?;
    sp.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::{CommitDecision, NewClient, NewOrder};
    use serde_json::json;
    use std::cell::RefCell;

    /// 记录调用并返回固定结果的发送器
    struct FakeSender {
        result: bool,
        calls: RefCell<Vec<i64>>,
    }

    impl FakeSender {
        fn new(result: bool) -> Self {
            Self {
                result,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl NotificationSender for FakeSender {
        fn send(&self, review: &PendingReview) -> bool {
            self.calls.borrow_mut().push(review.order.id);
            self.result
        }
    }

    fn seed(conn: &Connection, customer_email: &str) -> i64 {
        let store = SqliteEntityStore::new(conn);
        let (client, _) = store
            .get_or_create_client(&NewClient {
                email: "a@x.com".to_string(),
                shop: "ShopA".to_string(),
                first_name: String::new(),
                last_name: String::new(),
            })
            .unwrap();
        let (order, _) = store
            .get_or_create_order(&NewOrder {
                order_id: format!("ORD-{}", customer_email),
                client_id: client.id,
                product_ids: vec![json!("P1")],
                customer_email: customer_email.to_string(),
                customer_name: None,
            })
            .unwrap();
        order.id
    }

    fn unnotified(conn: &Connection) -> i64 {
        SqliteEntityStore::new(conn).orders().count_unnotified().unwrap()
    }

    #[test]
    fn test_successful_send_marks_order() {
        let mut conn = open_in_memory().unwrap();
        seed(&conn, "b@x.com");
        let sender = FakeSender::new(true);

        let run = ReviewDispatcher::new(&sender, DispatchOptions::default())
            .run(&mut conn)
            .unwrap();

        assert_eq!(run.report.success_count, 1);
        assert_eq!(sender.calls.borrow().len(), 1);
        assert_eq!(unnotified(&conn), 0);

        // 第二次运行不会再选中
        let run = ReviewDispatcher::new(&sender, DispatchOptions::default())
            .run(&mut conn)
            .unwrap();
        assert_eq!(run.report.total(), 0);
        assert_eq!(sender.calls.borrow().len(), 1);
    }

    #[test]
    fn test_empty_email_is_skipped_without_send() {
        let mut conn = open_in_memory().unwrap();
        seed(&conn, "");
        let sender = FakeSender::new(true);

        let run = ReviewDispatcher::new(&sender, DispatchOptions::default())
            .run(&mut conn)
            .unwrap();

        assert_eq!(run.report.skipped_count, 1);
        assert_eq!(run.outcome.errors()[0].class, ErrorClass::EmptyField);
        assert!(sender.calls.borrow().is_empty());
        assert_eq!(unnotified(&conn), 1);
    }

    #[test]
    fn test_transport_failure_leaves_order_pending() {
        let mut conn = open_in_memory().unwrap();
        seed(&conn, "b@x.com");
        let sender = FakeSender::new(false);

        let run = ReviewDispatcher::new(&sender, DispatchOptions::default())
            .run(&mut conn)
            .unwrap();

        assert_eq!(run.report.failed_count, 1);
        assert_eq!(run.outcome.errors()[0].class, ErrorClass::TransportFailure);
        assert_eq!(unnotified(&conn), 1);
    }

    #[test]
    fn test_dry_run_never_calls_sender() {
        let mut conn = open_in_memory().unwrap();
        seed(&conn, "b@x.com");
        seed(&conn, "c@x.com");
        let sender = FakeSender::new(true);

        let run = ReviewDispatcher::new(
            &sender,
            DispatchOptions {
                mode: RunMode::DryRun,
                limit: None,
            },
        )
        .run(&mut conn)
        .unwrap();

        assert_eq!(run.report.success_count, 2);
        assert_eq!(run.decision, CommitDecision::Rollback);
        assert!(sender.calls.borrow().is_empty());
        assert_eq!(unnotified(&conn), 2);
    }

    #[test]
    fn test_limit_caps_batch() {
        let mut conn = open_in_memory().unwrap();
        seed(&conn, "b@x.com");
        seed(&conn, "c@x.com");
        seed(&conn, "d@x.com");
        let sender = FakeSender::new(true);

        let run = ReviewDispatcher::new(
            &sender,
            DispatchOptions {
                mode: RunMode::Live,
                limit: Some(2),
            },
        )
        .run(&mut conn)
        .unwrap();

        assert_eq!(run.report.success_count, 2);
        assert_eq!(unnotified(&conn), 1);
    }
}
