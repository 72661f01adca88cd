// ==========================================
// 订单运营后台 - 命令行入口
// ==========================================
// 命令:
//   import-csv [CSV_FILE] [--dry-run]
//   send-review-emails [--dry-run] [--limit N]
// 约束: 致命错误输出 "错误: ..." 到 stderr 并以 1 退出
// ==========================================

use anyhow::Context;
use clap::{Parser, Subcommand};
use order_review_ops::config::{get_default_db_path, ConfigManager};
use order_review_ops::db::open_sqlite_connection;
use order_review_ops::domain::{OutcomeKind, RunMode};
use order_review_ops::importer::{CsvImporter, ImportOptions};
use order_review_ops::logging;
use order_review_ops::notification::{DispatchOptions, ReviewDispatcher, ReviewMailer};
use order_review_ops::report::BatchRun;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "order-review-ops")]
#[command(author, version, about = "订单运营后台: CSV 批量导入与评价邀请邮件发送")]
struct Cli {
    /// SQLite 数据库路径(默认: ORDER_REVIEW_DB_PATH 或用户数据目录)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// 输出详细程度: 0 仅摘要, 1 加逐行警告/错误, 2 加逐行成功信息
    #[arg(short, long, global = true, default_value_t = 1,
          value_parser = clap::value_parser!(u8).range(0..=2))]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 从 CSV 导入商户、顾客与订单
    ImportCsv {
        /// CSV 文件路径
        #[arg(default_value = "sample_data.csv")]
        csv_file: PathBuf,

        /// 模拟运行: 完整校验与报告,但不写入数据库
        #[arg(long)]
        dry_run: bool,
    },
    /// 向尚未通知的订单发送评价邀请邮件
    SendReviewEmails {
        /// 模拟运行: 不发送邮件,不修改任何订单
        #[arg(long)]
        dry_run: bool,

        /// 本次最多处理的订单数
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbosity);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.verbosity >= 2 {
                eprintln!("错误: {:?}", e);
            } else {
                eprintln!("错误: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    tracing::info!(db = %db_path.display(), version = order_review_ops::VERSION, "使用数据库");

    let mut conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库 {}", db_path.display()))?;

    let run = match &cli.command {
        Commands::ImportCsv { csv_file, dry_run } => {
            let importer = CsvImporter::new(ImportOptions {
                mode: RunMode::from_dry_run(*dry_run),
            });
            importer
                .import_file(&mut conn, csv_file)
                .with_context(|| format!("导入 {} 失败", csv_file.display()))?
        }
        Commands::SendReviewEmails { dry_run, limit } => {
            let settings = ConfigManager::new(&conn)
                .mail_settings()
                .context("读取邮件配置失败")?;
            let mailer = ReviewMailer::from_settings(&settings).context("初始化邮件发送器失败")?;
            let dispatcher = ReviewDispatcher::new(
                mailer,
                DispatchOptions {
                    mode: RunMode::from_dry_run(*dry_run),
                    limit: *limit,
                },
            );
            dispatcher.run(&mut conn).context("发送评价邀请失败")?
        }
    };

    print_run(&run, cli.verbosity);
    Ok(())
}

fn print_run(run: &BatchRun, verbosity: u8) {
    if verbosity >= 1 {
        for (kind, message) in run.outcome.entries() {
            match kind {
                OutcomeKind::Success if verbosity >= 2 => println!("[成功] {}", message),
                OutcomeKind::Success => {}
                OutcomeKind::Skipped => println!("[跳过] {}", message),
                OutcomeKind::Failed => println!("[失败] {}", message),
            }
        }
    }
    println!("{}", run.report);
}
