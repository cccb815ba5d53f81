use crate::assertion::registry::ValidationContext;
use crate::assertion::types::AssertError;
use crate::assertion::validators::preview;
use regex::Regex;
use std::sync::OnceLock;

/// 去掉全部空白，比较时不要求格式完全一致
pub fn normalize_whitespace(text: &str) -> String {
    static SPACE_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = SPACE_REGEX.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex is valid"));
    re.replace_all(text, "").into_owned()
}

/// body-equals: `value`
pub fn body_equals(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let want = ctx.params.string("value")?;
    let got = String::from_utf8_lossy(ctx.body);

    if normalize_whitespace(&got) != normalize_whitespace(&want) {
        return Err(AssertError::mismatch(format!(
            "body mismatch: want={:?}, got={:?}",
            preview(&want),
            preview(&got)
        )));
    }
    Ok(())
}

/// body-contains: `value`
pub fn body_contains(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let needle = ctx.params.string("value")?;
    let got = String::from_utf8_lossy(ctx.body);

    if !normalize_whitespace(&got).contains(&normalize_whitespace(&needle)) {
        return Err(AssertError::mismatch(format!(
            "body does not contain {:?}",
            needle
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::validators::test_support::response_bag;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("{ \"a\" :\n\t1 }"), "{\"a\":1}");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_body_equals_ignores_formatting() {
        let bag = response_bag(200, &[]).with("value", r#"{"id": 1, "name": "Leanne"}"#);
        let body = b"{\n  \"id\":1,\n  \"name\":\"Leanne\"\n}";
        assert!(body_equals(&ValidationContext::new(body, &bag)).is_ok());

        let other = br#"{"id":2,"name":"Other"}"#;
        let err = body_equals(&ValidationContext::new(other, &bag)).unwrap_err();
        assert!(err.to_string().starts_with("body mismatch"));
    }

    #[test]
    fn test_body_equals_requires_value() {
        let bag = response_bag(200, &[]);
        assert!(matches!(
            body_equals(&ValidationContext::new(b"x", &bag)),
            Err(AssertError::MissingParam(_))
        ));
    }

    #[test]
    fn test_body_contains() {
        let bag = response_bag(200, &[]).with("value", "\"status\": \"ok\"");
        let body = br#"{"data": [], "status":"ok"}"#;
        assert!(body_contains(&ValidationContext::new(body, &bag)).is_ok());

        let bag = response_bag(200, &[]).with("value", "error");
        assert!(body_contains(&ValidationContext::new(body, &bag)).is_err());
    }

    #[test]
    fn test_body_contains_number_param() {
        let bag = response_bag(200, &[]).with("value", 42_i64);
        assert!(body_contains(&ValidationContext::new(br#"{"id": 42}"#, &bag)).is_ok());
    }
}
