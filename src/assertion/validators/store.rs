use crate::assertion::extractor::{extract_string, parse_json_body};
use crate::assertion::registry::ValidationContext;
use crate::assertion::types::AssertError;

/// 未指定 `store_as` 时写入的键
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// store-token-from-body: `json_path`、可选 `store_as`
///
/// 从 JSON 响应体取出字符串字段写入值存储，供依赖它的请求通过 `${token}` 引用。
/// 未挂载值存储时只做校验。
pub fn store_token_from_body(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let path = ctx.params.non_empty_string("json_path")?;
    let key = ctx
        .params
        .opt_string("store_as")?
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string());

    let json = parse_json_body(ctx.body)?;
    let token = extract_string(&json, path.trim())?;

    if let Some(store) = ctx.store {
        tracing::debug!(key = %key, "Storing value extracted from response body");
        store.set(key, token);
    }
    Ok(())
}
