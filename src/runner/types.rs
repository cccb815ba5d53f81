use crate::parser::TestRequest;
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::time::Duration;

/// 依赖声明错误（引用不存在的请求、依赖环）使用的断言名
pub const DEPENDS_ON: &str = "depends_on";
/// 请求无法构造或发送且没有声明任何断言时使用的断言名
pub const REQUEST_ERROR: &str = "request_error";
/// 套件内重名请求使用的断言名
pub const DUPLICATE_NAME: &str = "duplicate_name";
/// 断言类型未注册时的错误文本
pub const UNKNOWN_EXPECTATION: &str = "unknown expectation type";

/// 单条断言结果
///
/// 创建后不再修改；每个 (请求, 断言) 恰好一条。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Outcome {
    pub suite: String,
    pub request: String,
    /// 断言类型名，或保留名 `depends_on` / `request_error` / `duplicate_name`
    pub assertion: String,
    pub passed: bool,
    pub error: Option<String>,
}

impl Outcome {
    pub fn pass(
        suite: impl Into<String>,
        request: impl Into<String>,
        assertion: impl Into<String>,
    ) -> Self {
        Self {
            suite: suite.into(),
            request: request.into(),
            assertion: assertion.into(),
            passed: true,
            error: None,
        }
    }

    pub fn fail(
        suite: impl Into<String>,
        request: impl Into<String>,
        assertion: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            suite: suite.into(),
            request: request.into(),
            assertion: assertion.into(),
            passed: false,
            error: Some(error.into()),
        }
    }

    /// 请求整体失败（构造、发送、取消）：每个声明的断言一条失败，
    /// 没有声明断言时一条 `request_error`
    pub fn request_failures(suite: &str, request: &TestRequest, error: &str) -> Vec<Self> {
        if request.expect.is_empty() {
            return vec![Self::fail(suite, &request.name, REQUEST_ERROR, error)];
        }
        request
            .expect
            .iter()
            .map(|expectation| Self::fail(suite, &request.name, &expectation.kind, error))
            .collect()
    }

    pub fn dangling_dependency(suite: &str, request: &str, missing: &str) -> Self {
        Self::fail(
            suite,
            request,
            DEPENDS_ON,
            format!("dependency '{}' not found in suite '{}'", missing, suite),
        )
    }

    pub fn unschedulable(suite: &str, request: &str) -> Self {
        Self::fail(
            suite,
            request,
            DEPENDS_ON,
            "request is part of, or depends on, a dependency cycle and was never run",
        )
    }

    pub fn duplicate_name(suite: &str, request: &str) -> Self {
        Self::fail(
            suite,
            request,
            DUPLICATE_NAME,
            format!(
                "request name '{}' is already defined in suite '{}'; this definition was not run",
                request, suite
            ),
        )
    }
}

/// 一次运行的配置
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// worker 数量；None 或 0 时取主机可用并行度
    pub concurrency: Option<usize>,
    /// 单次 HTTP 调用超时（请求可用 `timeout_ms` 单独覆盖）
    pub timeout: Duration,
    /// 为永远无法调度的请求（依赖环）输出 `depends_on` 失败记录
    pub report_unschedulable: bool,
    /// 结果流缓冲区大小
    pub outcome_buffer: usize,
}

impl RunOptions {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DEFAULT_OUTCOME_BUFFER: usize = 64;

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_report_unschedulable(mut self, report: bool) -> Self {
        self.report_unschedulable = report;
        self
    }

    /// 实际的 worker 数量
    pub fn worker_count(&self) -> usize {
        match self.concurrency {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: None,
            timeout: Self::DEFAULT_TIMEOUT,
            report_unschedulable: true,
            outcome_buffer: Self::DEFAULT_OUTCOME_BUFFER,
        }
    }
}

/// 单个套件的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteSummary {
    pub name: String,
    pub requests: usize,
    pub passed: usize,
    pub failed: usize,
}

/// 测试摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// 产生过结果的请求数
    pub requests: usize,
    /// 至少有一条失败结果的请求数
    pub failed_requests: usize,
    /// 按套件首次出现的顺序
    pub suites: Vec<SuiteSummary>,
}

impl TestSummary {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed).count();

        let requests: BTreeSet<(&str, &str)> = outcomes
            .iter()
            .map(|o| (o.suite.as_str(), o.request.as_str()))
            .collect();
        let failed_requests: BTreeSet<(&str, &str)> = outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| (o.suite.as_str(), o.request.as_str()))
            .collect();

        let mut suites: Vec<SuiteSummary> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for outcome in outcomes {
            let index = *positions.entry(outcome.suite.as_str()).or_insert_with(|| {
                suites.push(SuiteSummary {
                    name: outcome.suite.clone(),
                    requests: requests
                        .iter()
                        .filter(|(suite, _)| *suite == outcome.suite)
                        .count(),
                    passed: 0,
                    failed: 0,
                });
                suites.len() - 1
            });
            if outcome.passed {
                suites[index].passed += 1;
            } else {
                suites[index].failed += 1;
            }
        }

        Self {
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
            requests: requests.len(),
            failed_requests: failed_requests.len(),
            suites,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
