// ==========================================
// 订单运营后台 - CSV 批量导入流水线
// ==========================================
// 流程: 解析 → 表头校验 → 逐行校验 → 逐行落库(保存点) → 提交/回滚 → 报告
// 红线: 单行失败不终止批次;失败行不留下部分数据
// 红线: 模拟运行无条件回滚,计数照常报告
// ==========================================

use crate::db::finish_transaction;
use crate::domain::{BatchOutcome, OutcomeError, RowResult, RunMode};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{CsvParser, CsvSource};
use crate::importer::import_row::{ImportRow, RawRow, REQUIRED_COLUMNS};
use crate::report::{BatchRun, ReportKind};
use crate::repository::{EntityStore, RepositoryResult, SqliteEntityStore};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub mode: RunMode,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Live,
        }
    }
}

// ==========================================
// CsvImporter
// ==========================================
pub struct CsvImporter {
    parser: CsvParser,
    options: ImportOptions,
}

impl CsvImporter {
    pub fn new(options: ImportOptions) -> Self {
        Self {
            parser: CsvParser,
            options,
        }
    }

    /// 从 CSV 文件导入
    ///
    /// # 返回
    /// - Ok(BatchRun): 批次已处理(含跳过/失败行)
    /// - Err(ImportError): 文件/表头/事务级错误,未处理任何行
    #[instrument(skip(self, conn), fields(mode = %self.options.mode))]
    pub fn import_file(&self, conn: &mut Connection, file_path: &Path) -> ImportResult<BatchRun> {
        info!(file = %file_path.display(), "开始导入 CSV");

        let source = self.parser.parse_file(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;

        self.import_source(conn, &source)
    }

    /// 导入已解析的数据源
    pub fn import_source(&self, conn: &mut Connection, source: &CsvSource) -> ImportResult<BatchRun> {
        let mode = self.options.mode;

        // 表头校验: 失败即终止
        source.check_required_columns(&REQUIRED_COLUMNS).map_err(|e| {
            error!(error = %e, "CSV 表头校验失败");
            e
        })?;

        if source.rows.is_empty() {
            warn!("CSV 只有表头,没有数据行");
            return Ok(BatchRun::new(ReportKind::Import, mode, BatchOutcome::new()));
        }

        info!(total_rows = source.rows.len(), "表头校验通过,开始逐行处理");

        let mut tx = conn.transaction()?;
        let outcome: BatchOutcome = source
            .rows
            .iter()
            .map(|raw| self.process_row(&mut tx, raw))
            .collect();

        let run = BatchRun::new(ReportKind::Import, mode, outcome);
        finish_transaction(tx, run.decision)?;

        info!(
            success = run.report.success_count,
            skipped = run.report.skipped_count,
            failed = run.report.failed_count,
            decision = ?run.decision,
            "CSV 导入完成"
        );
        Ok(run)
    }

    fn process_row(&self, tx: &mut Transaction<'_>, raw: &RawRow) -> RowResult {
        let row = match ImportRow::validate(raw) {
            Ok(row) => row,
            Err(field_errors) => {
                for e in &field_errors {
                    warn!(line = raw.line, error_class = %e.error_class(), "{}", e);
                }
                return RowResult::Skipped {
                    errors: field_errors
                        .iter()
                        .map(|e| OutcomeError::new(e.error_class(), e.to_string()))
                        .collect(),
                };
            }
        };

        // 每行一个保存点;未提交的保存点在 drop 时回滚
        let sp = match tx.savepoint() {
            Ok(sp) => sp,
            Err(e) => return storage_failure(row.line, e.into()),
        };

        let persisted = persist_row(&SqliteEntityStore::new(&sp), &row);
        match persisted {
            Ok(message) => match sp.commit() {
                Ok(()) => {
                    debug!(line = row.line, "{}", message);
                    RowResult::Success { message }
                }
                Err(e) => storage_failure(row.line, e.into()),
            },
            Err(e) => storage_failure(row.line, e),
        }
    }
}

/// 按 商户 → 顾客 → 订单 顺序落库,返回成功消息
fn persist_row<S: EntityStore>(store: &S, row: &ImportRow) -> RepositoryResult<String> {
    let (client, client_created) = store.get_or_create_client(&row.new_client())?;
    let (_, customer_created) = store.get_or_create_customer(&row.new_customer(client.id))?;
    let (_, order_created) = store.get_or_create_order(&row.new_order(client.id))?;

    Ok(format!(
        "第 {} 行: 商户 {} {}, 顾客 {} {}, 订单 {} {}",
        row.line,
        row.client_email,
        created_label(client_created),
        row.user_email,
        created_label(customer_created),
        row.order_id,
        created_label(order_created),
    ))
}

fn created_label(created: bool) -> &'static str {
    if created {
        "已创建"
    } else {
        "已存在"
    }
}

fn storage_failure(line: usize, err: crate::repository::RepositoryError) -> RowResult {
    error!(line = line, error_class = %err.error_class(), error = %err, "行落库失败");
    RowResult::Failed {
        error: OutcomeError::new(err.error_class(), format!("第 {} 行: {}", line, err)),
    }
}
