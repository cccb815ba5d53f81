use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiflowError {
    #[error("解析错误: {0}")]
    ParseError(String),

    #[error("无效的 HTTP 方法: {0}")]
    InvalidMethod(String),

    #[error("无效的 URL: {0}")]
    InvalidUrl(String),

    #[error("无效的 Header: {0}")]
    InvalidHeader(String),

    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("请求超时 ({0}ms)")]
    Timeout(u128),

    #[error("请求已取消")]
    Cancelled,

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML 解析错误: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("URL 解析错误: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for ApiflowError {
    fn from(err: anyhow::Error) -> Self {
        ApiflowError::Other(err.to_string())
    }
}

impl From<toml::de::Error> for ApiflowError {
    fn from(err: toml::de::Error) -> Self {
        ApiflowError::ConfigError(err.to_string())
    }
}

impl From<crate::parser::ParseError> for ApiflowError {
    fn from(err: crate::parser::ParseError) -> Self {
        ApiflowError::ParseError(err.to_string())
    }
}

/// Result type for apiflow crate
pub type Result<T> = std::result::Result<T, ApiflowError>;
