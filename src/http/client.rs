use std::time::{Duration, Instant};

use crate::http::request::Request;
use crate::http::response::Response;
use crate::{ApiflowError, Result};

/// 共享的 HTTP 客户端
///
/// 内部连接池可在多个 worker 间克隆复用。
#[derive(Debug, Clone)]
pub struct Client {
    inner: reqwest::Client,
    timeout: Duration,
}

impl Client {
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { inner, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 发送请求并读取完整响应体
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let timeout = request.timeout.unwrap_or(self.timeout);
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), request.url)
            .headers(request.headers)
            .timeout(timeout);

        if let Some(body) = request.body {
            req = req.body(body);
        }

        let start = Instant::now();
        let response = req.send().await.map_err(|e| map_error(e, timeout))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_error(e, timeout))?
            .to_vec();
        let duration = start.elapsed();

        tracing::debug!(status, elapsed_ms = duration.as_millis() as u64, "Response received");
        Response::new(status, headers, body, duration)
    }
}

fn map_error(err: reqwest::Error, timeout: Duration) -> ApiflowError {
    if err.is_timeout() {
        ApiflowError::Timeout(timeout.as_millis())
    } else {
        ApiflowError::HttpError(err)
    }
}
