use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use apiflow::runner::{TestReporter, TestSummary};
use apiflow::{
    ApiflowConfig, AssertionRegistry, ConfigLoader, RunOptions, Scheduler, ValueStore, parser,
};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 输出调试日志，并显示通过的断言
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 执行套件文件
    Run(RunArgs),
    /// 检查套件文件，不发送请求
    Validate { file: PathBuf },
    /// 列出可用的断言类型
    Assertions,
    /// 生成示例套件文件
    Generate {
        /// 输出路径
        #[arg(short, long, default_value = "sample.yaml")]
        output: PathBuf,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// YAML 套件文件
    pub file: PathBuf,

    /// worker 数量（默认为 CPU 并行度）
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// 单次请求超时（毫秒）
    #[arg(short = 't', long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// 配置文件路径（默认自动查找 apiflow.toml）
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// 依赖环上的请求不输出 depends_on 记录
    #[arg(long)]
    pub silent_cycles: bool,

    /// 预置变量，可重复
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,
}

/// 配置文件 → 命令行参数，后者优先
fn resolve_options(args: &RunArgs, config: &ApiflowConfig) -> Result<RunOptions> {
    let mut options = config.run_options();
    if let Some(concurrency) = args.concurrency {
        options.concurrency = Some(concurrency);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        if timeout_ms == 0 {
            return Err(anyhow!("--timeout must be positive"));
        }
        options.timeout = Duration::from_millis(timeout_ms);
    }
    if args.silent_cycles {
        options.report_unschedulable = false;
    }
    Ok(options)
}

fn seed_store(args: &RunArgs, config: &ApiflowConfig) -> Result<ValueStore> {
    let store = ValueStore::new();
    for (key, value) in &config.variables {
        store.set(key, value);
    }
    for var in &args.vars {
        let (key, value) = ConfigLoader::parse_cli_var(var)
            .ok_or_else(|| anyhow!("invalid --var '{}', expected KEY=VALUE", var))?;
        store.set(key, value);
    }
    Ok(store)
}

/// 执行套件；全部断言通过时返回 true
pub async fn run(args: RunArgs, verbose: bool) -> Result<bool> {
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::find_and_load()?.unwrap_or_default(),
    };
    let options = resolve_options(&args, &config)?;
    let store = seed_store(&args, &config)?;

    let suites = parser::parse_file(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    let request_count = suites.iter().map(|s| s.requests.len()).sum();

    let reporter = TestReporter::new(verbose);
    reporter.print_header(&args.file.display().to_string(), suites.len(), request_count);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling run");
                cancel.cancel();
            }
        })
    };

    let scheduler = Scheduler::new(options)?;
    let start = Instant::now();
    let mut stream = scheduler.execute_with_store(suites, Arc::new(store), cancel.clone());
    tracing::debug!(run_id = %stream.run_id(), "Streaming outcomes");

    let mut outcomes = Vec::new();
    while let Some(outcome) = stream.next().await {
        reporter.print_outcome(&outcome);
        outcomes.push(outcome);
    }
    interrupt.abort();

    let summary = TestSummary::from_outcomes(&outcomes);
    reporter.print_summary(&summary, start.elapsed());

    if cancel.is_cancelled() {
        println!("{} Run cancelled before completion.", "!".yellow());
        return Ok(false);
    }
    Ok(summary.all_passed())
}

/// 静态检查；没有问题时返回 true
pub fn validate(file: PathBuf) -> Result<bool> {
    let suites = parser::parse_file(&file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let issues = parser::validate(&suites, &AssertionRegistry::with_builtins());
    TestReporter::default().print_issues(&issues);
    Ok(issues.is_empty())
}

const SAMPLE_SUITE: &str = r#"suites:
  - name: users
    requests:
      - name: login
        method: POST
        url: https://dummyjson.com/auth/login
        headers:
          Content-Type: application/json
        body:
          username: emilys
          password: emilyspass
        expect:
          - type: status-equals
            code: 200
          - type: store-token-from-body
            json_path: accessToken

      - name: profile
        method: GET
        url: https://dummyjson.com/auth/me
        depends_on: [login]
        headers:
          Authorization: Bearer ${token}
        expect:
          - type: status-equals
            code: 200
          - type: content-type-equals
            value: application/json
            ignore_params: true
          - type: body-contains
            value: emilys

      - name: list-users
        method: GET
        url: https://dummyjson.com/users?limit=5
        timeout_ms: 5000
        expect:
          - type: status-in-set
            codes: [200, 304]
          - type: numeric-field-between
            field: limit
            min: 1
            max: 5
"#;

/// 写出示例套件文件
pub fn generate(output: PathBuf) -> Result<bool> {
    std::fs::write(&output, SAMPLE_SUITE)
        .with_context(|| format!("Failed to create sample file {}", output.display()))?;
    println!("{} Sample suite written to {}", "✓".green(), output.display());
    Ok(true)
}

/// 列出已注册的断言类型
pub fn list_assertions() {
    let registry = AssertionRegistry::with_builtins();
    for name in registry.names() {
        println!("  {}", name);
    }
}
