use crate::assertion::registry::ValidationContext;
use crate::assertion::types::AssertError;
use reqwest::header::{CONTENT_TYPE, HeaderMap};

fn header_values(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .collect()
}

fn text_equals(got: &str, want: &str, ignore_case: bool) -> bool {
    if ignore_case {
        got.eq_ignore_ascii_case(want)
    } else {
        got == want
    }
}

/// header-equals: `header`, `value`, `ignore_case`
///
/// 头名称查找总是大小写不敏感，`ignore_case` 只作用于值。
pub fn header_equals(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let headers = ctx.params.headers()?;
    let name = ctx.params.non_empty_string("header")?;
    let want = ctx.params.string("value")?;
    let ignore_case = ctx.params.flag("ignore_case", false)?;

    let values = header_values(headers, name.trim());
    let Some(got) = values.first() else {
        return Err(AssertError::mismatch(format!("header {} not found", name)));
    };

    if !text_equals(got, &want, ignore_case) {
        return Err(AssertError::mismatch(format!(
            "header {} mismatch: got={:?}, want={:?}",
            name, got, want
        )));
    }
    Ok(())
}

/// header-contains: `header`, `value`, `ignore_case`
///
/// 多值头任意一个包含子串即通过。
pub fn header_contains(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let headers = ctx.params.headers()?;
    let name = ctx.params.non_empty_string("header")?;
    let needle = ctx.params.non_empty_string("value")?;
    let ignore_case = ctx.params.flag("ignore_case", false)?;

    let values = header_values(headers, name.trim());
    if values.is_empty() {
        return Err(AssertError::mismatch(format!("header {} not found", name)));
    }

    let found = values.iter().any(|value| {
        if ignore_case {
            value.to_lowercase().contains(&needle.to_lowercase())
        } else {
            value.contains(&needle)
        }
    });
    if !found {
        return Err(AssertError::mismatch(format!(
            "header {} does not contain {:?} (got {:?})",
            name, needle, values
        )));
    }
    Ok(())
}

/// header-absent: `header`
pub fn header_absent(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let headers = ctx.params.headers()?;
    let name = ctx.params.non_empty_string("header")?;

    let values = header_values(headers, name.trim());
    if !values.is_empty() {
        return Err(AssertError::mismatch(format!(
            "header {} should be absent, got {:?}",
            name, values
        )));
    }
    Ok(())
}

/// content-type-equals: `value`, `ignore_params`, `ignore_case`
pub fn content_type_equals(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let headers = ctx.params.headers()?;
    let want = ctx.params.non_empty_string("value")?;
    let ignore_params = ctx.params.flag("ignore_params", false)?;
    let ignore_case = ctx.params.flag("ignore_case", false)?;

    let Some(got) = header_values(headers, CONTENT_TYPE.as_str()).into_iter().next() else {
        return Err(AssertError::mismatch("Content-Type header not found"));
    };

    let strip = |s: &str| -> String {
        let s = if ignore_params {
            s.split(';').next().unwrap_or_default()
        } else {
            s
        };
        s.trim().to_string()
    };
    let (got_cmp, want_cmp) = (strip(&got), strip(&want));

    if !text_equals(&got_cmp, &want_cmp, ignore_case) {
        return Err(AssertError::mismatch(format!(
            "Content-Type mismatch: got={:?}, want={:?}",
            got, want
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::params::ParamBag;
    use crate::assertion::validators::test_support::response_bag;

    fn check(
        validator: fn(&ValidationContext<'_>) -> Result<(), AssertError>,
        bag: &ParamBag,
    ) -> Result<(), AssertError> {
        validator(&ValidationContext::new(b"", bag))
    }

    #[test]
    fn test_header_equals_case_insensitive_name() {
        let bag = response_bag(200, &[("X-Request-Id", "abc")])
            .with("header", "x-request-id")
            .with("value", "abc");
        assert!(check(header_equals, &bag).is_ok());
    }

    #[test]
    fn test_header_equals_ignore_case_value() {
        let headers = [("Content-Type", "application/json; charset=utf-8")];
        let bag = response_bag(200, &headers)
            .with("header", "Content-Type")
            .with("value", "APPLICATION/JSON; CHARSET=UTF-8");
        assert!(check(header_equals, &bag).is_err());

        let bag = bag.with("ignore_case", true);
        assert!(check(header_equals, &bag).is_ok());
    }

    #[test]
    fn test_header_equals_compares_raw_value() {
        let bag = response_bag(200, &[("X-Request-Id", "abc")])
            .with("header", "X-Request-Id")
            .with("value", " abc ");
        assert!(check(header_equals, &bag).is_err());
    }

    #[test]
    fn test_header_equals_missing_header() {
        let bag = response_bag(200, &[])
            .with("header", "X-Missing")
            .with("value", "v");
        let err = check(header_equals, &bag).unwrap_err();
        assert_eq!(err.to_string(), "header X-Missing not found");
    }

    #[test]
    fn test_header_equals_without_injected_headers() {
        let bag = ParamBag::new().with("header", "X").with("value", "v");
        assert!(matches!(
            check(header_equals, &bag),
            Err(AssertError::MissingResponseFact(_))
        ));
    }

    #[test]
    fn test_header_contains_multi_value() {
        let headers = [("Vary", "Accept"), ("Vary", "Origin, Accept-Encoding")];
        let bag = response_bag(200, &headers)
            .with("header", "vary")
            .with("value", "Origin");
        assert!(check(header_contains, &bag).is_ok());

        let bag = response_bag(200, &headers)
            .with("header", "vary")
            .with("value", "origin");
        assert!(check(header_contains, &bag).is_err());
        assert!(check(header_contains, &bag.with("ignore_case", "yes")).is_ok());
    }

    #[test]
    fn test_header_contains_rejects_empty_needle() {
        let bag = response_bag(200, &[("Vary", "Accept")])
            .with("header", "Vary")
            .with("value", "  ");
        assert!(matches!(
            check(header_contains, &bag),
            Err(AssertError::InvalidParam { .. })
        ));
    }

    #[test]
    fn test_header_absent() {
        let bag = response_bag(200, &[("Server", "nginx")]).with("header", "X-Powered-By");
        assert!(check(header_absent, &bag).is_ok());

        let bag = response_bag(200, &[("Server", "nginx")]).with("header", "server");
        assert!(check(header_absent, &bag).is_err());
    }

    #[test]
    fn test_content_type_equals() {
        let headers = [("Content-Type", "application/json; charset=utf-8")];

        let bag = response_bag(200, &headers).with("value", "application/json");
        assert!(check(content_type_equals, &bag).is_err());

        let bag = bag.with("ignore_params", true);
        assert!(check(content_type_equals, &bag).is_ok());

        let bag = response_bag(200, &headers)
            .with("value", "Application/JSON")
            .with("ignore_params", true);
        assert!(check(content_type_equals, &bag).is_err());
        assert!(check(content_type_equals, &bag.with("ignore_case", true)).is_ok());
    }

    #[test]
    fn test_content_type_missing() {
        let bag = response_bag(204, &[]).with("value", "text/plain");
        assert!(check(content_type_equals, &bag).is_err());
    }
}
