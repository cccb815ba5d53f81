use crate::assertion::types::AssertError;
use reqwest::header::HeaderMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::collections::BTreeMap;
use std::fmt;

/// 断言参数值
///
/// 来自套件文件的参数是弱类型的（YAML 中 `200`、`"200"` 都可能出现），
/// 统一收敛为该枚举，由 [`ParamBag`] 的强制转换方法读取。
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
    /// 运行器注入的响应头，不会从套件文件中反序列化出来
    Headers(HeaderMap),
}

impl ParamValue {
    /// 类型名（用于错误消息）
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::Bool(_) => "bool",
            ParamValue::Integer(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::String(_) => "string",
            ParamValue::List(_) => "list",
            ParamValue::Map(_) => "map",
            ParamValue::Headers(_) => "headers",
        }
    }

    /// 宽松转换为字符串：字符串原样返回，数字与布尔值格式化
    pub fn as_string(&self) -> Option<String> {
        match self {
            ParamValue::String(s) => Some(s.clone()),
            ParamValue::Integer(i) => Some(i.to_string()),
            ParamValue::Float(f) => Some(f.to_string()),
            ParamValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// 宽松转换为整数：支持整数、无小数部分的浮点数、数字字符串
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            ParamValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            ParamValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.fract() == 0.0 && f.is_finite())
                        .map(|f| f as i64)
                })
            }
            _ => None,
        }
    }

    /// 宽松转换为浮点数
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Integer(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            ParamValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// 宽松转换为布尔值
    ///
    /// 支持: true/false, yes/no, on/off, 1/0（大小写不敏感）
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Integer(1) => Some(true),
            ParamValue::Integer(0) => Some(false),
            ParamValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            ParamValue::String(s) => format!("{:?}", s),
            other => other.kind().to_string(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ParamValue::Null,
            serde_json::Value::Bool(b) => ParamValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Integer(i),
                None => ParamValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => ParamValue::String(s),
            serde_json::Value::Array(items) => {
                ParamValue::List(items.into_iter().map(ParamValue::from).collect())
            }
            serde_json::Value::Object(map) => ParamValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, ParamValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ParamValueVisitor)
    }
}

struct ParamValueVisitor;

impl<'de> Visitor<'de> for ParamValueVisitor {
    type Value = ParamValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, boolean, list or map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<ParamValue, E> {
        Ok(ParamValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ParamValue, E> {
        Ok(ParamValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ParamValue, E> {
        Ok(i64::try_from(v)
            .map(ParamValue::Integer)
            .unwrap_or(ParamValue::Float(v as f64)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ParamValue, E> {
        Ok(ParamValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ParamValue, E> {
        Ok(ParamValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ParamValue, E> {
        Ok(ParamValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<ParamValue, E> {
        Ok(ParamValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<ParamValue, E> {
        Ok(ParamValue::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<ParamValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        ParamValue::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<ParamValue, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<ParamValue>()? {
            items.push(item);
        }
        Ok(ParamValue::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<ParamValue, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut values = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, ParamValue>()? {
            values.insert(key, value);
        }
        Ok(ParamValue::Map(values))
    }
}

/// 断言参数包
///
/// 用户声明的参数，加上运行器注入的 `status_code` 与 `headers`。
/// 校验器只能通过这里的强制转换方法读取参数，不直接匹配 [`ParamValue`]。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBag {
    values: BTreeMap<String, ParamValue>,
}

impl ParamBag {
    /// 注入的响应状态码
    pub const STATUS_CODE: &'static str = "status_code";
    /// 注入的完整响应头
    pub const HEADERS: &'static str = "headers";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: BTreeMap<String, ParamValue>) -> Self {
        Self { values }
    }

    /// 用户参数 + 注入的响应信息（注入值无条件覆盖同名用户参数）
    pub fn with_response(
        params: &BTreeMap<String, ParamValue>,
        status: u16,
        headers: &HeaderMap,
    ) -> Self {
        let mut bag = Self::from_map(params.clone());
        bag.insert(Self::STATUS_CODE, ParamValue::Integer(i64::from(status)));
        bag.insert(Self::HEADERS, ParamValue::Headers(headers.clone()));
        bag
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// 链式插入，便于测试中构造参数
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// 原始值；显式的 null 视为未提供
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key).filter(|v| **v != ParamValue::Null)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // === 强制转换 ===

    pub fn opt_string(&self, key: &str) -> Result<Option<String>, AssertError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.as_string().map(Some).ok_or_else(|| {
                AssertError::invalid(key, format!("expected a string, got {}", value.describe()))
            }),
        }
    }

    pub fn string(&self, key: &str) -> Result<String, AssertError> {
        self.opt_string(key)?
            .ok_or_else(|| AssertError::MissingParam(key.to_string()))
    }

    /// 去除首尾空白后不能为空
    pub fn non_empty_string(&self, key: &str) -> Result<String, AssertError> {
        let value = self.string(key)?;
        if value.trim().is_empty() {
            return Err(AssertError::invalid(key, "must not be empty"));
        }
        Ok(value)
    }

    /// 按顺序尝试多个别名，返回第一个非空字符串
    pub fn first_non_empty(&self, keys: &[&str]) -> Result<String, AssertError> {
        for key in keys {
            if let Some(value) = self.opt_string(key)?
                && !value.trim().is_empty()
            {
                return Ok(value);
            }
        }
        Err(AssertError::MissingParam(keys.first().copied().unwrap_or_default().to_string()))
    }

    pub fn opt_int(&self, key: &str) -> Result<Option<i64>, AssertError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.as_i64().map(Some).ok_or_else(|| {
                AssertError::invalid(
                    key,
                    format!("expected an integer, got {}", value.describe()),
                )
            }),
        }
    }

    pub fn int(&self, key: &str) -> Result<i64, AssertError> {
        self.opt_int(key)?
            .ok_or_else(|| AssertError::MissingParam(key.to_string()))
    }

    pub fn opt_float(&self, key: &str) -> Result<Option<f64>, AssertError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                AssertError::invalid(key, format!("expected a number, got {}", value.describe()))
            }),
        }
    }

    pub fn float(&self, key: &str) -> Result<f64, AssertError> {
        self.opt_float(key)?
            .ok_or_else(|| AssertError::MissingParam(key.to_string()))
    }

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>, AssertError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.as_bool().map(Some).ok_or_else(|| {
                AssertError::invalid(
                    key,
                    format!(
                        "expected a boolean (true/false, yes/no, on/off, 1/0), got {}",
                        value.describe()
                    ),
                )
            }),
        }
    }

    /// 可选布尔参数，缺省时返回 `default`
    pub fn flag(&self, key: &str, default: bool) -> Result<bool, AssertError> {
        Ok(self.opt_bool(key)?.unwrap_or(default))
    }

    /// 整数列表：接受列表或逗号分隔的字符串
    pub fn int_list(&self, key: &str) -> Result<Vec<i64>, AssertError> {
        let value = self
            .get(key)
            .ok_or_else(|| AssertError::MissingParam(key.to_string()))?;

        let items: Vec<ParamValue> = match value {
            ParamValue::List(items) => items.clone(),
            ParamValue::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(ParamValue::from)
                .collect(),
            single @ (ParamValue::Integer(_) | ParamValue::Float(_)) => vec![single.clone()],
            other => {
                return Err(AssertError::invalid(
                    key,
                    format!("expected a list of integers, got {}", other.describe()),
                ));
            }
        };

        items
            .iter()
            .map(|item| {
                item.as_i64().ok_or_else(|| {
                    AssertError::invalid(
                        key,
                        format!("expected a list of integers, found {}", item.describe()),
                    )
                })
            })
            .collect()
    }

    // === 注入的响应信息 ===

    pub fn status_code(&self) -> Result<u16, AssertError> {
        self.get(Self::STATUS_CODE)
            .and_then(ParamValue::as_i64)
            .and_then(|code| u16::try_from(code).ok())
            .ok_or_else(|| AssertError::MissingResponseFact(Self::STATUS_CODE.to_string()))
    }

    pub fn headers(&self) -> Result<&HeaderMap, AssertError> {
        match self.get(Self::HEADERS) {
            Some(ParamValue::Headers(headers)) => Ok(headers),
            _ => Err(AssertError::MissingResponseFact(Self::HEADERS.to_string())),
        }
    }
}
