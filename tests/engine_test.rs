use apiflow::runner::{DEPENDS_ON, DUPLICATE_NAME, UNKNOWN_EXPECTATION};
use apiflow::{Expectation, Outcome, RunOptions, Scheduler, Suite, TestRequest, ValueStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn run(suites: Vec<Suite>, options: RunOptions) -> Vec<Outcome> {
    let scheduler = Scheduler::new(options).unwrap();
    scheduler
        .execute(suites, CancellationToken::new())
        .collect()
        .await
}

fn status(code: i64) -> Expectation {
    Expectation::new("status-equals").with_param("code", code)
}

fn for_request<'a>(outcomes: &'a [Outcome], request: &str) -> Vec<&'a Outcome> {
    outcomes.iter().filter(|o| o.request == request).collect()
}

/// login 返回 token，profile 通过 ${token} 带上 Authorization 头
#[tokio::test]
async fn test_token_flows_to_dependent_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "abc"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let suite = Suite::new("auth")
        .with_request(
            TestRequest::new("login", "POST", format!("{}/login", mock_server.uri()))
                .with_body(r#"{"user":"alice"}"#)
                .expect(Expectation::new("store-token-from-body").with_param("json_path", "token")),
        )
        .with_request(
            TestRequest::new("profile", "GET", format!("{}/profile", mock_server.uri()))
                .with_header("Authorization", "Bearer ${token}")
                .depends_on("login")
                .expect(status(200)),
        );

    let outcomes = run(vec![suite], RunOptions::default()).await;

    assert_eq!(outcomes.len(), 2, "{:?}", outcomes);
    assert!(outcomes.iter().all(|o| o.passed), "{:?}", outcomes);

    let requests = mock_server.received_requests().await.unwrap();
    let profile = requests
        .iter()
        .find(|r| r.url.path() == "/profile")
        .expect("profile request was sent");
    assert_eq!(profile.headers.get("authorization").unwrap(), "Bearer abc");
}

/// 无法连接时每个声明的断言各一条失败
#[tokio::test]
async fn test_unreachable_host_fails_every_expectation() {
    let suite = Suite::new("down").with_request(
        TestRequest::new("ping", "GET", "http://127.0.0.1:1/")
            .expect(status(200))
            .expect(Expectation::new("body-contains").with_param("value", "ok"))
            .expect(Expectation::new("header-absent").with_param("header", "X-Debug")),
    );

    let outcomes = run(vec![suite], RunOptions::default().with_timeout(Duration::from_secs(2))).await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| !o.passed));
    let mut names: Vec<&str> = outcomes.iter().map(|o| o.assertion.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["body-contains", "header-absent", "status-equals"]);
    assert!(outcomes
        .iter()
        .all(|o| o.error.as_deref().unwrap().starts_with("Request failed")));
}

/// 引用不存在的请求：多一条 depends_on 记录，但请求照常执行
#[tokio::test]
async fn test_dangling_dependency_reports_and_runs() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let suite = Suite::new("catalog").with_request(
        TestRequest::new("items", "GET", format!("{}/items", mock_server.uri()))
            .depends_on("ghost")
            .expect(status(200)),
    );

    let outcomes = run(vec![suite], RunOptions::default()).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].assertion, DEPENDS_ON);
    assert!(!outcomes[0].passed);
    assert!(outcomes[0].error.as_deref().unwrap().contains("ghost"));
    assert_eq!(outcomes[1].assertion, "status-equals");
    assert!(outcomes[1].passed);
}

fn cyclic_suite(uri: &str) -> Suite {
    Suite::new("cycle")
        .with_request(
            TestRequest::new("a", "GET", format!("{}/a", uri))
                .depends_on("b")
                .expect(status(200)),
        )
        .with_request(
            TestRequest::new("b", "GET", format!("{}/b", uri))
                .depends_on("a")
                .expect(status(200)),
        )
        .with_request(TestRequest::new("c", "GET", format!("{}/c", uri)).expect(status(200)))
}

#[tokio::test]
async fn test_two_cycle_silent_mode() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let options = RunOptions::default().with_report_unschedulable(false);
    let outcomes = tokio::time::timeout(
        Duration::from_secs(10),
        run(vec![cyclic_suite(&mock_server.uri())], options),
    )
    .await
    .expect("run terminates");

    assert!(for_request(&outcomes, "a").is_empty());
    assert!(for_request(&outcomes, "b").is_empty());
    assert_eq!(for_request(&outcomes, "c").len(), 1);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_two_cycle_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let outcomes = run(vec![cyclic_suite(&mock_server.uri())], RunOptions::default()).await;

    for name in ["a", "b"] {
        let records = for_request(&outcomes, name);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].assertion, DEPENDS_ON);
        assert!(!records[0].passed);
    }
    assert!(for_request(&outcomes, "c")[0].passed);
}

#[tokio::test]
async fn test_duplicate_name_runs_first_definition_only() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let suite = Suite::new("dup")
        .with_request(
            TestRequest::new("same", "GET", format!("{}/first", mock_server.uri())).expect(status(204)),
        )
        .with_request(
            TestRequest::new("same", "GET", format!("{}/second", mock_server.uri())).expect(status(204)),
        );

    let outcomes = run(vec![suite], RunOptions::default()).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().any(|o| o.assertion == DUPLICATE_NAME && !o.passed));
    assert!(outcomes.iter().any(|o| o.assertion == "status-equals" && o.passed));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/first");
}

/// 前置请求的结果总是先于依赖它的请求出现
#[tokio::test]
async fn test_prerequisite_outcomes_come_first() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "t"})))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let chain = Suite::new("chain")
        .with_request(
            TestRequest::new("c", "GET", format!("{}/c", uri))
                .depends_on("b")
                .expect(status(200)),
        )
        .with_request(
            TestRequest::new("b", "GET", format!("{}/b", uri))
                .depends_on("a")
                .expect(status(200))
                .expect(Expectation::new("body-contains").with_param("value", "token")),
        )
        .with_request(TestRequest::new("a", "GET", format!("{}/a", uri)).expect(status(200)));
    let noise = (0..6).fold(Suite::new("noise"), |suite, i| {
        suite.with_request(TestRequest::new(format!("n{}", i), "GET", format!("{}/n{}", uri, i)).expect(status(200)))
    });

    let outcomes = run(vec![chain, noise], RunOptions::default().with_concurrency(4)).await;
    assert_eq!(outcomes.len(), 10);
    assert!(outcomes.iter().all(|o| o.passed), "{:?}", outcomes);

    let position = |name: &str| -> (usize, usize) {
        let indices: Vec<usize> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.suite == "chain" && o.request == name)
            .map(|(i, _)| i)
            .collect();
        (indices[0], *indices.last().unwrap())
    };
    let (a_first, a_last) = position("a");
    let (b_first, b_last) = position("b");
    let (c_first, _) = position("c");
    assert!(a_first <= a_last && a_last < b_first);
    assert!(b_last < c_first);
}

/// 同一服务、新的值存储：两次运行结果相同
#[tokio::test]
async fn test_runs_are_idempotent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "abc"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let suites = || {
        vec![
            Suite::new("auth")
                .with_request(
                    TestRequest::new("login", "POST", format!("{}/login", uri))
                        .expect(status(200))
                        .expect(Expectation::new("store-token-from-body").with_param("json_path", "token")),
                )
                .with_request(
                    TestRequest::new("me", "GET", format!("{}/me", uri))
                        .with_header("Authorization", "Bearer ${token}")
                        .depends_on("login")
                        .expect(status(200)),
                ),
            Suite::new("missing").with_request(
                TestRequest::new("nothing", "GET", format!("{}/nothing", uri)).expect(status(200)),
            ),
        ]
    };

    let mut first = run(suites(), RunOptions::default()).await;
    let mut second = run(suites(), RunOptions::default()).await;
    first.sort();
    second.sort();

    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    assert_eq!(first.iter().filter(|o| !o.passed).count(), 1);
}

#[tokio::test]
async fn test_unknown_expectation_type_is_isolated() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&mock_server)
        .await;

    let suite = Suite::new("s").with_request(
        TestRequest::new("r", "GET", mock_server.uri())
            .expect(Expectation::new("does-not-exist"))
            .expect(Expectation::new("body-equals").with_param("value", "hello")),
    );

    let outcomes = run(vec![suite], RunOptions::default()).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].assertion, "does-not-exist");
    assert_eq!(outcomes[0].error.as_deref(), Some(UNKNOWN_EXPECTATION));
    assert!(outcomes[1].passed);
}

#[tokio::test]
async fn test_header_equals_ignore_case() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&mock_server)
        .await;

    let suite = Suite::new("s").with_request(
        TestRequest::new("r", "GET", mock_server.uri()).expect(
            Expectation::new("header-equals")
                .with_param("header", "Content-Type")
                .with_param("value", "APPLICATION/JSON")
                .with_param("ignore_case", true),
        ),
    );

    let outcomes = run(vec![suite], RunOptions::default()).await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].passed, "{:?}", outcomes[0]);
}

/// 请求级超时覆盖运行级超时，超时后依赖方仍被释放
#[tokio::test]
async fn test_request_timeout_releases_dependents() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let suite = Suite::new("timeouts")
        .with_request(
            TestRequest::new("slow", "GET", format!("{}/slow", mock_server.uri()))
                .with_timeout_ms(200)
                .expect(status(200)),
        )
        .with_request(
            TestRequest::new("fast", "GET", format!("{}/fast", mock_server.uri()))
                .depends_on("slow")
                .expect(status(200)),
        );

    let start = Instant::now();
    let outcomes = run(vec![suite], RunOptions::default()).await;
    assert!(start.elapsed() < Duration::from_secs(3));

    let slow = for_request(&outcomes, "slow");
    assert_eq!(slow.len(), 1);
    assert!(!slow[0].passed);
    assert!(slow[0].error.as_deref().unwrap().starts_with("Request failed"));

    let fast = for_request(&outcomes, "fast");
    assert_eq!(fast.len(), 1);
    assert!(fast[0].passed);
}

/// 取消后停止调度，未开始的请求没有结果
#[tokio::test]
async fn test_cancellation_stops_run() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let suite = Suite::new("slow")
        .with_request(TestRequest::new("first", "GET", format!("{}/first", mock_server.uri())).expect(status(200)))
        .with_request(
            TestRequest::new("second", "GET", format!("{}/second", mock_server.uri()))
                .depends_on("first")
                .expect(status(200)),
        );

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(RunOptions::default()).unwrap();
    let stream = scheduler.execute(vec![suite], cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let outcomes = tokio::time::timeout(Duration::from_secs(5), stream.collect())
        .await
        .expect("cancelled run terminates promptly");

    assert!(for_request(&outcomes, "second").is_empty());
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

/// 单 worker、最小缓冲区下长依赖链也能跑完
#[tokio::test]
async fn test_single_worker_long_chain() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let suite = (0..8).fold(Suite::new("chain"), |suite, i| {
        let mut request = TestRequest::new(format!("step{}", i), "GET", format!("{}/step{}", uri, i))
            .expect(status(200))
            .expect(Expectation::new("status-between").with_param("min", 200_i64).with_param("max", 299_i64));
        if i > 0 {
            request = request.depends_on(format!("step{}", i - 1));
        }
        suite.with_request(request)
    });

    let options = RunOptions {
        outcome_buffer: 1,
        ..RunOptions::default().with_concurrency(1)
    };
    let outcomes = tokio::time::timeout(Duration::from_secs(10), run(vec![suite], options))
        .await
        .expect("run terminates");

    assert_eq!(outcomes.len(), 16);
    assert!(outcomes.iter().all(|o| o.passed));
    let order: Vec<&str> = outcomes.iter().step_by(2).map(|o| o.request.as_str()).collect();
    let expected: Vec<String> = (0..8).map(|i| format!("step{}", i)).collect();
    assert_eq!(order, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

/// 预置的值存储：值出现在 URL 与请求体中
#[tokio::test]
async fn test_seeded_store_substitutes_url_and_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/42/notes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"note": {"id": "n-1"}})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/n-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let suite = Suite::new("notes")
        .with_request(
            TestRequest::new("create", "POST", format!("{}/users/${{user_id}}/notes", uri))
                .with_body(r#"{"owner": "${user_id}"}"#)
                .expect(status(201))
                .expect(
                    Expectation::new("store-token-from-body")
                        .with_param("json_path", "note.id")
                        .with_param("store_as", "note_id"),
                ),
        )
        .with_request(
            TestRequest::new("fetch", "GET", format!("{}/notes/${{note_id}}", uri))
                .depends_on("create")
                .expect(status(200)),
        );

    let store = Arc::new(ValueStore::new());
    store.set("user_id", "42");

    let scheduler = Scheduler::new(RunOptions::default()).unwrap();
    let outcomes = scheduler
        .execute_with_store(vec![suite], Arc::clone(&store), CancellationToken::new())
        .collect()
        .await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.passed), "{:?}", outcomes);
    assert_eq!(store.get("note_id").as_deref(), Some("n-1"));

    let requests = mock_server.received_requests().await.unwrap();
    let create = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    assert_eq!(create.body, br#"{"owner": "42"}"#.to_vec());
}

async fn timed_independent_run(uri: &str, concurrency: usize) -> (Duration, Vec<Outcome>) {
    let suite = (0..4).fold(Suite::new("parallel"), |suite, i| {
        suite.with_request(
            TestRequest::new(format!("r{}", i), "GET", format!("{}/delay/{}", uri, i)).expect(status(200)),
        )
    });
    let start = Instant::now();
    let outcomes = run(vec![suite], RunOptions::default().with_concurrency(concurrency)).await;
    (start.elapsed(), outcomes)
}

/// 独立请求并行执行，并发数受 worker 数量约束
#[tokio::test]
async fn test_worker_pool_bounds_parallelism() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(400)))
        .mount(&mock_server)
        .await;

    let (parallel, outcomes) = timed_independent_run(&mock_server.uri(), 4).await;
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|o| o.passed), "{:?}", outcomes);
    assert!(parallel < Duration::from_millis(1200), "concurrency=4 took {:?}", parallel);

    let (serial, outcomes) = timed_independent_run(&mock_server.uri(), 1).await;
    assert_eq!(outcomes.len(), 4);
    assert!(serial >= Duration::from_millis(1600), "concurrency=1 took {:?}", serial);
}
