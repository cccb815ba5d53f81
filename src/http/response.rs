use crate::Result;
use crate::http::types::Status;
use reqwest::header::HeaderMap as Headers;
use std::borrow::Cow;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub headers: Headers,
    /// 完整响应体（原始字节，断言自行决定如何解码）
    pub body: Vec<u8>,
    pub duration: Duration,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: Vec<u8>, duration: Duration) -> Result<Self> {
        Ok(Self {
            status: Status::new(status)?,
            headers,
            body,
            duration,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
