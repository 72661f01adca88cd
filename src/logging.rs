// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别(RUST_LOG 优先)
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 命令行 verbosity 对应的默认过滤级别
///
/// 0 只输出摘要,逐行日志全部关闭;致命错误由入口直接打印
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "off",
        1 => "info",
        _ => "debug",
    }
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器(设置时覆盖 verbosity)
///   例如: RUST_LOG=debug 或 RUST_LOG=order_review_ops=trace
///
/// # 示例
/// ```no_run
/// use order_review_ops::logging;
/// logging::init(1);
/// ```
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    // 日志写 stderr,stdout 只留给报告
    fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_thread_ids(false)
        .with_line_number(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别,便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
