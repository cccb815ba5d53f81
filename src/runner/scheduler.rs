use crate::Result;
use crate::assertion::AssertionRegistry;
use crate::http::Client;
use crate::parser::{Suite, TestRequest};
use crate::runner::executor::RequestExecutor;
use crate::runner::graph::DependencyGraph;
use crate::runner::types::{Outcome, RunOptions};
use crate::variable::ValueStore;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// 依赖感知的并发调度器
///
/// 每个套件一张依赖图；入度为零的请求进入就绪队列，由固定大小的 worker 池执行。
/// 图的状态只由调度任务修改，worker 只回传完成信号。
#[derive(Debug, Clone)]
pub struct Scheduler {
    executor: Arc<RequestExecutor>,
    options: RunOptions,
}

/// 实时结果流，按到达顺序产出
pub struct OutcomeStream {
    run_id: Uuid,
    rx: mpsc::Receiver<Outcome>,
}

impl OutcomeStream {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// 下一条结果；运行结束后返回 None
    pub async fn next(&mut self) -> Option<Outcome> {
        self.rx.recv().await
    }

    /// 收集全部剩余结果
    pub async fn collect(mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

struct Job {
    graph: usize,
    node: usize,
    suite: Arc<str>,
    request: Arc<TestRequest>,
}

struct Completion {
    graph: usize,
    node: usize,
}

impl Scheduler {
    /// 使用内置断言创建调度器
    pub fn new(options: RunOptions) -> Result<Self> {
        Self::with_registry(options, AssertionRegistry::with_builtins())
    }

    pub fn with_registry(options: RunOptions, registry: AssertionRegistry) -> Result<Self> {
        let client = Client::new(options.timeout)?;
        Ok(Self {
            executor: Arc::new(RequestExecutor::new(client, Arc::new(registry))),
            options,
        })
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// 执行全部套件，每次运行使用新的值存储
    ///
    /// 必须在 tokio 运行时内调用。
    pub fn execute(&self, suites: Vec<Suite>, cancel: CancellationToken) -> OutcomeStream {
        self.execute_with_store(suites, Arc::new(ValueStore::new()), cancel)
    }

    /// 使用调用方提供的值存储执行（例如预先写入了初始变量）
    ///
    /// 运行持有 `cancel` 的子令牌：取消 `cancel` 会停止运行，丢弃结果流只停止本次运行。
    pub fn execute_with_store(
        &self,
        suites: Vec<Suite>,
        store: Arc<ValueStore>,
        cancel: CancellationToken,
    ) -> OutcomeStream {
        let run_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.options.outcome_buffer.max(1));
        let graphs = suites.iter().map(DependencyGraph::build).collect();

        let run = Run {
            graphs,
            executor: Arc::clone(&self.executor),
            store,
            options: self.options.clone(),
            outcomes: tx,
            cancel: cancel.child_token(),
        };
        let span = tracing::info_span!("run", run_id = %run_id);
        tokio::spawn(run.drive().instrument(span));

        OutcomeStream { run_id, rx }
    }
}

/// 一次运行的调度状态，由调度任务独占
struct Run {
    graphs: Vec<DependencyGraph>,
    executor: Arc<RequestExecutor>,
    store: Arc<ValueStore>,
    options: RunOptions,
    outcomes: mpsc::Sender<Outcome>,
    cancel: CancellationToken,
}

impl Run {
    async fn drive(mut self) {
        let workers = self.options.worker_count();
        let total: usize = self.graphs.iter().map(DependencyGraph::len).sum();
        tracing::info!(suites = self.graphs.len(), requests = total, workers, "Run started");

        let (job_tx, job_rx) = mpsc::channel::<Job>(workers);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(workers);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let worker = Worker {
                id,
                jobs: Arc::clone(&job_rx),
                done: done_tx.clone(),
                outcomes: self.outcomes.clone(),
                executor: Arc::clone(&self.executor),
                store: Arc::clone(&self.store),
                cancel: self.cancel.clone(),
            };
            handles.push(tokio::spawn(worker.run().in_current_span()));
        }
        drop(done_tx);

        let mut ready: VecDeque<(usize, usize)> = VecDeque::new();
        if self.report_structural().await {
            for (g, graph) in self.graphs.iter().enumerate() {
                ready.extend(graph.roots().into_iter().map(|node| (g, node)));
            }
        }

        let mut in_flight = 0usize;
        while !ready.is_empty() || in_flight > 0 {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::warn!(in_flight, pending = ready.len(), "Run cancelled");
                    break;
                }
                _ = self.outcomes.closed() => {
                    tracing::warn!("Outcome stream dropped, stopping run");
                    self.cancel.cancel();
                    break;
                }
                done = done_rx.recv(), if in_flight > 0 => {
                    let Some(done) = done else { break };
                    in_flight -= 1;
                    let graph = &mut self.graphs[done.graph];
                    let released = graph.complete(done.node);
                    ready.extend(released.into_iter().map(|node| (done.graph, node)));
                }
                permit = job_tx.reserve(), if !ready.is_empty() => {
                    let Ok(permit) = permit else { break };
                    let Some((g, node)) = ready.pop_front() else { continue };
                    let graph = &mut self.graphs[g];
                    graph.mark_dispatched();
                    permit.send(Job {
                        graph: g,
                        node,
                        suite: Arc::clone(graph.suite_name()),
                        request: Arc::clone(graph.request(node)),
                    });
                    in_flight += 1;
                }
            }
        }

        // 关闭任务队列与完成通道，worker 随之退出
        drop(job_tx);
        drop(done_rx);
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task failed");
            }
        }

        for graph in &self.graphs {
            tracing::debug!(
                suite = %graph.suite_name(),
                dispatched = graph.dispatched(),
                completed = graph.completed(),
                total = graph.len(),
                "Suite finished"
            );
        }
        tracing::info!("Run finished");
    }

    /// 在调度前输出结构性错误：重名、悬空依赖、依赖环
    ///
    /// 结果流已关闭或运行被取消时返回 false。
    async fn report_structural(&self) -> bool {
        let mut records = Vec::new();
        for graph in &self.graphs {
            let suite = graph.suite_name();

            for duplicate in graph.duplicates() {
                tracing::warn!(suite = %suite, request = %duplicate.name, "Duplicate request name");
                records.push(Outcome::duplicate_name(suite, &duplicate.name));
            }

            for (idx, missing) in graph.dangling() {
                let request = &graph.request(*idx).name;
                tracing::warn!(suite = %suite, request = %request, missing = %missing, "Dangling dependency");
                records.push(Outcome::dangling_dependency(suite, request, missing));
            }

            let blocked = graph.unschedulable();
            if !blocked.is_empty() {
                tracing::warn!(suite = %suite, count = blocked.len(), "Requests blocked by a dependency cycle");
                if self.options.report_unschedulable {
                    records.extend(
                        blocked
                            .iter()
                            .map(|&idx| Outcome::unschedulable(suite, &graph.request(idx).name)),
                    );
                }
            }
        }

        for record in records {
            if !emit(&self.outcomes, record, &self.cancel).await {
                return false;
            }
        }
        true
    }
}

struct Worker {
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    done: mpsc::Sender<Completion>,
    outcomes: mpsc::Sender<Outcome>,
    executor: Arc<RequestExecutor>,
    store: Arc<ValueStore>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        loop {
            let job = {
                let mut jobs = self.jobs.lock().await;
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => None,
                    job = jobs.recv() => job,
                }
            };
            let Some(job) = job else { break };

            let span = tracing::info_span!(
                "request",
                suite = %job.suite,
                request = %job.request.name,
                worker = self.id
            );
            let outcomes = self
                .executor
                .execute(&job.suite, &job.request, &self.store, &self.cancel)
                .instrument(span)
                .await;

            for outcome in outcomes {
                if !emit(&self.outcomes, outcome, &self.cancel).await {
                    return;
                }
            }

            let completion = Completion {
                graph: job.graph,
                node: job.node,
            };
            if self.done.send(completion).await.is_err() {
                break;
            }
        }
    }
}

/// 发送一条结果；取消或接收端关闭时返回 false
async fn emit(tx: &mpsc::Sender<Outcome>, outcome: Outcome, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = tx.send(outcome) => sent.is_ok(),
    }
}
