use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::http::types::Method;
use crate::{ApiflowError, Result};

/// 待发送的 HTTP 请求
///
/// 构造过程中的所有错误（方法、URL、头）都以 `Err` 返回，不会 panic。
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: url::Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
    /// 覆盖客户端的默认超时
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: &str, url: &str) -> Result<Self> {
        let method: Method = method.parse()?;
        let url = url::Url::parse(url.trim())
            .map_err(|e| ApiflowError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiflowError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                url,
                url.scheme()
            )));
        }

        Ok(Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        })
    }

    fn insert_header(&mut self, key: &str, value: &str) -> Result<()> {
        let name: HeaderName = key
            .trim()
            .parse()
            .map_err(|_| ApiflowError::InvalidHeader(format!("invalid name '{}'", key)))?;
        let value = HeaderValue::from_str(value.trim()).map_err(|_| {
            ApiflowError::InvalidHeader(format!("invalid value for '{}'", key))
        })?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self> {
        self.insert_header(key, value)?;
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// 序列化为 JSON 请求体；未显式设置时补上 Content-Type
    pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
        let json = serde_json::to_string(data)?;
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.insert_header(CONTENT_TYPE.as_str(), "application/json")?;
        }
        self.body = Some(json);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
