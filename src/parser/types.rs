use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::assertion::ParamValue;

/// 测试套件：一组可以相互依赖的请求
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suite {
    pub name: String,

    /// 请求列表，保持文件中的顺序
    #[serde(default, alias = "tests")]
    pub requests: Vec<TestRequest>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requests: Vec::new(),
        }
    }

    pub fn with_request(mut self, request: TestRequest) -> Self {
        self.requests.push(request);
        self
    }
}

/// 套件中的单个请求
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestRequest {
    /// 套件内唯一的名称
    pub name: String,

    /// HTTP 方法，缺省为 GET；非法方法在执行时报告
    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    pub url: String,

    /// 头的值可以包含 `${key}` 占位符
    #[serde(default, deserialize_with = "deserialize_headers")]
    pub headers: BTreeMap<String, String>,

    /// 原样发送的请求体；YAML 中写成映射或列表时序列化为 JSON 文本
    #[serde(default, deserialize_with = "deserialize_body")]
    pub body: Option<String>,

    #[serde(default)]
    pub depends_on: Vec<String>,

    /// 覆盖运行级别的超时
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default)]
    pub expect: Vec<Expectation>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl TestRequest {
    pub fn new(name: impl Into<String>, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            depends_on: Vec::new(),
            timeout_ms: None,
            expect: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expect.push(expectation);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// 断言声明：类型名 + 参数
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawExpectation")]
pub struct Expectation {
    pub kind: String,
    pub params: BTreeMap<String, ParamValue>,
}

impl Expectation {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// 文件中的写法：`params`（或 `kwargs`）之外的键也当作参数
#[derive(Deserialize)]
struct RawExpectation {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, alias = "kwargs")]
    params: Option<BTreeMap<String, ParamValue>>,
    #[serde(flatten)]
    extra: BTreeMap<String, ParamValue>,
}

impl From<RawExpectation> for Expectation {
    fn from(raw: RawExpectation) -> Self {
        let mut params = raw.extra;
        // 显式 params 优先
        params.extend(raw.params.unwrap_or_default());
        Self {
            kind: raw.kind.trim().to_string(),
            params,
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn deserialize_headers<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|(name, value)| {
            scalar_to_string(value)
                .map(|value| (name.clone(), value))
                .ok_or_else(|| de::Error::custom(format!("header '{}' must be a scalar value", name)))
        })
        .collect()
}

fn deserialize_body<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// 解析错误类型
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML 语法或字段类型错误
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// 顶层结构不是套件或套件列表
    #[error("Invalid suite file: {0}")]
    InvalidStructure(String),

    /// 空文件或没有找到套件
    #[error("No suites found in file")]
    NoSuites,
}

/// 解析结果类型别名
pub type ParseResult<T> = Result<T, ParseError>;
