//! 内置断言
//!
//! 每个校验器都是 `fn(&ValidationContext) -> Result<(), AssertError>`，
//! 由 [`register_builtins`] 统一注册到 [`AssertionRegistry`]。

mod body;
mod cookie;
mod header;
mod number;
mod status;
mod store;

use crate::assertion::registry::AssertionRegistry;

pub use body::{body_contains, body_equals, normalize_whitespace};
pub use cookie::{cookie_exists, cookie_has_attributes, cookie_not_exists, cookie_value_equals};
pub use header::{content_type_equals, header_absent, header_contains, header_equals};
pub use number::numeric_field_between;
pub use status::{status_between, status_equals, status_in_set};
pub use store::{DEFAULT_TOKEN_KEY, store_token_from_body};

pub const STATUS_EQUALS: &str = "status-equals";
pub const STATUS_IN_SET: &str = "status-in-set";
pub const STATUS_BETWEEN: &str = "status-between";
pub const BODY_EQUALS: &str = "body-equals";
pub const BODY_CONTAINS: &str = "body-contains";
pub const HEADER_EQUALS: &str = "header-equals";
pub const HEADER_CONTAINS: &str = "header-contains";
pub const HEADER_ABSENT: &str = "header-absent";
pub const CONTENT_TYPE_EQUALS: &str = "content-type-equals";
pub const COOKIE_EXISTS: &str = "cookie-exists";
pub const COOKIE_NOT_EXISTS: &str = "cookie-not-exists";
pub const COOKIE_VALUE_EQUALS: &str = "cookie-value-equals";
pub const COOKIE_HAS_ATTRIBUTES: &str = "cookie-has-attributes";
pub const NUMERIC_FIELD_BETWEEN: &str = "numeric-field-between";
pub const STORE_TOKEN_FROM_BODY: &str = "store-token-from-body";

/// 注册全部内置断言
pub fn register_builtins(registry: &mut AssertionRegistry) {
    registry.register(STATUS_EQUALS, status_equals);
    registry.register(STATUS_IN_SET, status_in_set);
    registry.register(STATUS_BETWEEN, status_between);
    registry.register(BODY_EQUALS, body_equals);
    registry.register(BODY_CONTAINS, body_contains);
    registry.register(HEADER_EQUALS, header_equals);
    registry.register(HEADER_CONTAINS, header_contains);
    registry.register(HEADER_ABSENT, header_absent);
    registry.register(CONTENT_TYPE_EQUALS, content_type_equals);
    registry.register(COOKIE_EXISTS, cookie_exists);
    registry.register(COOKIE_NOT_EXISTS, cookie_not_exists);
    registry.register(COOKIE_VALUE_EQUALS, cookie_value_equals);
    registry.register(COOKIE_HAS_ATTRIBUTES, cookie_has_attributes);
    registry.register(NUMERIC_FIELD_BETWEEN, numeric_field_between);
    registry.register(STORE_TOKEN_FROM_BODY, store_token_from_body);
}

/// 错误消息中展示的文本片段，过长时截断
pub(crate) fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 200;
    if text.chars().count() <= MAX_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(MAX_CHARS).collect();
    format!("{}…", truncated)
}
