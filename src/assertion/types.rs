/// 断言错误类型
///
/// 校验器返回 `Err` 即表示该断言失败，错误文本进入结果记录。
#[derive(Debug, thiserror::Error)]
pub enum AssertError {
    #[error("missing parameter '{0}'")]
    MissingParam(String),

    #[error("invalid parameter '{key}': {message}")]
    InvalidParam { key: String, message: String },

    #[error("response {0} not available (not injected by the runner)")]
    MissingResponseFact(String),

    #[error("{0}")]
    Mismatch(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Type mismatch at '{path}': expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("invalid JSON body: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AssertError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        AssertError::InvalidParam {
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        AssertError::Mismatch(message.into())
    }
}
