// ==========================================
// 订单运营后台 - 运行报告
// ==========================================
// 职责: 将批次结果归约为计数 + 错误列表,并渲染固定格式摘要
// 约束: 纯函数,不依赖存储;导入与发送共用同一格式
// ==========================================

use crate::domain::{BatchOutcome, CommitDecision, OutcomeKind, RunMode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 摘要中最多展示的错误条数
pub const MAX_DISPLAYED_ERRORS: usize = 20;

const SEPARATOR_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportKind {
    Import,   // CSV 导入
    Dispatch, // 评价邀请发送
}

impl ReportKind {
    fn title(self) -> &'static str {
        match self {
            ReportKind::Import => "CSV 导入结果",
            ReportKind::Dispatch => "评价邀请发送结果",
        }
    }
}

// ==========================================
// RunReport
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub kind: ReportKind,
    pub mode: RunMode,
    pub success_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>, // 按输入顺序
}

impl RunReport {
    /// 从有序的 (结果类型, 消息) 条目归约,每个条目计一次
    pub fn from_entries<I>(kind: ReportKind, mode: RunMode, entries: I) -> Self
    where
        I: IntoIterator<Item = (OutcomeKind, String)>,
    {
        let mut report = Self::empty(kind, mode);
        for (outcome, message) in entries {
            match outcome {
                OutcomeKind::Success => report.success_count += 1,
                OutcomeKind::Skipped => {
                    report.skipped_count += 1;
                    report.errors.push(message);
                }
                OutcomeKind::Failed => {
                    report.failed_count += 1;
                    report.errors.push(message);
                }
            }
        }
        report
    }

    /// 从批次结果归约: 计数按记录,错误按条展开
    pub fn from_outcome(kind: ReportKind, mode: RunMode, outcome: &BatchOutcome) -> Self {
        Self {
            kind,
            mode,
            success_count: outcome.success_count(),
            skipped_count: outcome.skipped_count(),
            failed_count: outcome.failed_count(),
            errors: outcome
                .errors()
                .into_iter()
                .map(|e| e.message.clone())
                .collect(),
        }
    }

    pub fn empty(kind: ReportKind, mode: RunMode) -> Self {
        Self {
            kind,
            mode,
            success_count: 0,
            skipped_count: 0,
            failed_count: 0,
            errors: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.success_count + self.skipped_count + self.failed_count
    }

    fn verdict(&self) -> &'static str {
        if self.mode.is_dry_run() {
            "模拟运行: 数据库未做任何修改"
        } else if self.total() == 0 {
            "没有需要处理的记录"
        } else if self.success_count == 0 {
            "没有任何记录处理成功"
        } else if self.errors.is_empty() {
            "全部记录处理成功"
        } else {
            "部分记录未处理,请查看上方错误"
        }
    }

    /// 渲染摘要
    ///
    /// 格式:
    /// 分隔线 / 标题 / 计数行 / 分隔线 / 至多 20 条错误 / 截断提示 / 结论行
    pub fn render(&self) -> String {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        let mut lines = Vec::new();

        lines.push(separator.clone());
        if self.mode.is_dry_run() {
            lines.push(format!("{} [模拟运行]", self.kind.title()));
        } else {
            lines.push(self.kind.title().to_string());
        }
        lines.push(format!(
            "成功: {}  跳过: {}  失败: {}  错误: {}",
            self.success_count,
            self.skipped_count,
            self.failed_count,
            self.errors.len()
        ));
        lines.push(separator);

        for message in self.errors.iter().take(MAX_DISPLAYED_ERRORS) {
            lines.push(format!("  - {}", message));
        }
        if self.errors.len() > MAX_DISPLAYED_ERRORS {
            lines.push(format!(
                "  ... 另有 {} 条错误未显示",
                self.errors.len() - MAX_DISPLAYED_ERRORS
            ));
        }

        lines.push(self.verdict().to_string());
        lines.join("\n")
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ==========================================
// BatchRun - 一次批处理运行的完整结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRun {
    pub outcome: BatchOutcome,
    pub decision: CommitDecision,
    pub report: RunReport,
}

impl BatchRun {
    pub fn new(kind: ReportKind, mode: RunMode, outcome: BatchOutcome) -> Self {
        let report = RunReport::from_outcome(kind, mode, &outcome);
        Self {
            outcome,
            decision: CommitDecision::for_mode(mode),
            report,
        }
    }
}
