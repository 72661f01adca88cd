// ==========================================
// 订单运营后台 - 批处理结果类型
// ==========================================
// 职责: 单条记录结果(RowResult)、批次聚合(BatchOutcome)、
//       事务决策(CommitDecision)
// 约束: 聚合为纯归约,不依赖存储
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 运行模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    Live,   // 正式执行
    DryRun, // 模拟执行(整体回滚)
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            RunMode::DryRun
        } else {
            RunMode::Live
        }
    }

    pub fn is_dry_run(self) -> bool {
        matches!(self, RunMode::DryRun)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Live => write!(f, "LIVE"),
            RunMode::DryRun => write!(f, "DRY_RUN"),
        }
    }
}

// ==========================================
// 事务决策
// ==========================================
// 由流水线返回,事务边界据此提交或回滚
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitDecision {
    Commit,
    Rollback,
}

impl CommitDecision {
    /// 正式模式无论成功/跳过/失败数量均提交;模拟模式无条件回滚
    pub fn for_mode(mode: RunMode) -> Self {
        match mode {
            RunMode::Live => CommitDecision::Commit,
            RunMode::DryRun => CommitDecision::Rollback,
        }
    }
}

// ==========================================
// 结果类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    Skipped, // 输入不合法
    Failed,  // 输入合法,但存储/发送失败
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "SUCCESS"),
            OutcomeKind::Skipped => write!(f, "SKIPPED"),
            OutcomeKind::Failed => write!(f, "FAILED"),
        }
    }
}

// ==========================================
// 错误分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorClass {
    Schema,           // 批次级,致命
    EmptyField,       // 行级校验
    InvalidFormat,    // 行级校验
    MalformedList,    // 行级校验
    NotAList,         // 行级校验
    StorageConflict,  // 唯一约束冲突
    TransportFailure, // 邮件投递失败
    Unexpected,       // 其他存储/运行错误
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorClass::Schema => "SCHEMA_ERROR",
            ErrorClass::EmptyField => "EMPTY_FIELD",
            ErrorClass::InvalidFormat => "INVALID_FORMAT",
            ErrorClass::MalformedList => "MALFORMED_LIST",
            ErrorClass::NotAList => "NOT_A_LIST",
            ErrorClass::StorageConflict => "STORAGE_CONFLICT",
            ErrorClass::TransportFailure => "TRANSPORT_FAILURE",
            ErrorClass::Unexpected => "UNEXPECTED_ERROR",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub class: ErrorClass,
    pub message: String,
}

impl OutcomeError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }
}

// ==========================================
// RowResult - 单条记录处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowResult {
    Success { message: String },
    Skipped { errors: Vec<OutcomeError> },
    Failed { error: OutcomeError },
}

impl RowResult {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            RowResult::Success { .. } => OutcomeKind::Success,
            RowResult::Skipped { .. } => OutcomeKind::Skipped,
            RowResult::Failed { .. } => OutcomeKind::Failed,
        }
    }

    /// 本条记录产生的错误(成功时为空)
    pub fn errors(&self) -> Vec<&OutcomeError> {
        match self {
            RowResult::Success { .. } => Vec::new(),
            RowResult::Skipped { errors } => errors.iter().collect(),
            RowResult::Failed { error } => vec![error],
        }
    }

    /// 报告条目: (结果类型, 消息);跳过行按错误逐条展开
    pub fn entries(&self) -> Vec<(OutcomeKind, String)> {
        match self {
            RowResult::Success { message } => vec![(OutcomeKind::Success, message.clone())],
            RowResult::Skipped { errors } => errors
                .iter()
                .map(|e| (OutcomeKind::Skipped, e.message.clone()))
                .collect(),
            RowResult::Failed { error } => vec![(OutcomeKind::Failed, error.message.clone())],
        }
    }
}

// ==========================================
// BatchOutcome - 批次聚合结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    results: Vec<RowResult>,
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// 归约一条结果
    pub fn record(mut self, result: RowResult) -> Self {
        self.results.push(result);
        self
    }

    pub fn results(&self) -> &[RowResult] {
        &self.results
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.results.iter().filter(|r| r.kind() == kind).count()
    }

    pub fn success_count(&self) -> usize {
        self.count(OutcomeKind::Success)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(OutcomeKind::Skipped)
    }

    pub fn failed_count(&self) -> usize {
        self.count(OutcomeKind::Failed)
    }

    /// 全部错误(按输入顺序)
    pub fn errors(&self) -> Vec<&OutcomeError> {
        self.results.iter().flat_map(|r| r.errors()).collect()
    }

    /// 报告条目序列(按输入顺序)
    pub fn entries(&self) -> Vec<(OutcomeKind, String)> {
        self.results.iter().flat_map(|r| r.entries()).collect()
    }
}

impl FromIterator<RowResult> for BatchOutcome {
    fn from_iter<I: IntoIterator<Item = RowResult>>(iter: I) -> Self {
        iter.into_iter().fold(BatchOutcome::new(), BatchOutcome::record)
    }
}
