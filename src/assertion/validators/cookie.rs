use crate::assertion::cookie::{SameSite, SetCookie};
use crate::assertion::params::ParamBag;
use crate::assertion::registry::ValidationContext;
use crate::assertion::types::AssertError;
use chrono::Utc;

const COOKIE_NAME_KEYS: [&str; 2] = ["cookie_name", "cookieName"];

fn cookie_name(params: &ParamBag) -> Result<String, AssertError> {
    params
        .first_non_empty(&COOKIE_NAME_KEYS)
        .map(|name| name.trim().to_string())
}

fn find_cookie(
    params: &ParamBag,
    name: &str,
    ignore_case: bool,
) -> Result<Option<SetCookie>, AssertError> {
    let headers = params.headers()?;
    Ok(SetCookie::from_headers(headers)
        .into_iter()
        .find(|cookie| cookie.name_matches(name, ignore_case)))
}

/// cookie-exists: `cookie_name`, `ignore_case`（默认 false）
pub fn cookie_exists(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let name = cookie_name(ctx.params)?;
    let ignore_case = ctx.params.flag("ignore_case", false)?;

    match find_cookie(ctx.params, &name, ignore_case)? {
        Some(_) => Ok(()),
        None => Err(AssertError::mismatch(format!("cookie {:?} not found", name))),
    }
}

/// cookie-not-exists: `cookie_name`, `ignore_case`（默认 true）
pub fn cookie_not_exists(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let name = cookie_name(ctx.params)?;
    let ignore_case = ctx.params.flag("ignore_case", true)?;

    match find_cookie(ctx.params, &name, ignore_case)? {
        Some(_) => Err(AssertError::mismatch(format!(
            "cookie {:?} should not exist, but was found",
            name
        ))),
        None => Ok(()),
    }
}

/// cookie-value-equals: `cookie_name`, `value`, `ignore_case`
pub fn cookie_value_equals(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let name = cookie_name(ctx.params)?;
    let want = ctx.params.non_empty_string("value")?;
    let ignore_case = ctx.params.flag("ignore_case", false)?;

    let Some(cookie) = find_cookie(ctx.params, &name, ignore_case)? else {
        return Err(AssertError::mismatch(format!("cookie {:?} not found", name)));
    };
    if cookie.value != want {
        return Err(AssertError::mismatch(format!(
            "cookie {:?} value mismatch: got {:?} want {:?}",
            name, cookie.value, want
        )));
    }
    Ok(())
}

/// cookie-has-attributes
///
/// 只检查给出的属性：`path`、`domain`、`http_only`、`secure`、`samesite`、
/// `min_max_age`（秒）、`not_expired`。
pub fn cookie_has_attributes(ctx: &ValidationContext<'_>) -> Result<(), AssertError> {
    let params = ctx.params;
    let name = cookie_name(params)?;
    let ignore_case = params.flag("ignore_case", false)?;

    let want_path = params.opt_string("path")?.filter(|s| !s.is_empty());
    let want_domain = params
        .opt_string("domain")?
        .map(|s| s.trim_start_matches('.').to_string())
        .filter(|s| !s.is_empty());
    let want_http_only = params.opt_bool("http_only")?;
    let want_secure = params.opt_bool("secure")?;
    let want_same_site = match params.opt_string("samesite")? {
        Some(raw) => Some(SameSite::parse(&raw).ok_or_else(|| {
            AssertError::invalid(
                "samesite",
                format!("invalid value {:?} (use one of: default|lax|strict|none)", raw),
            )
        })?),
        None => None,
    };
    let min_max_age = params.opt_int("min_max_age")?;
    let want_not_expired = params.opt_bool("not_expired")?;

    let Some(cookie) = find_cookie(params, &name, ignore_case)? else {
        return Err(AssertError::mismatch(format!("cookie {:?} not found", name)));
    };

    if let Some(want) = &want_path
        && cookie.path.as_deref() != Some(want.as_str())
    {
        return Err(AssertError::mismatch(format!(
            "cookie {:?} path mismatch: got {:?} want {:?}",
            name,
            cookie.path.as_deref().unwrap_or_default(),
            want
        )));
    }

    if let Some(want) = &want_domain {
        let got = cookie.domain.as_deref().unwrap_or_default();
        if !got.eq_ignore_ascii_case(want) {
            return Err(AssertError::mismatch(format!(
                "cookie {:?} domain mismatch: got {:?} want {:?}",
                name, got, want
            )));
        }
    }

    if let Some(want) = want_http_only
        && cookie.http_only != want
    {
        return Err(AssertError::mismatch(format!(
            "cookie {:?} httponly mismatch: got {} want {}",
            name, cookie.http_only, want
        )));
    }

    if let Some(want) = want_secure
        && cookie.secure != want
    {
        return Err(AssertError::mismatch(format!(
            "cookie {:?} secure mismatch: got {} want {}",
            name, cookie.secure, want
        )));
    }

    if let Some(want) = want_same_site {
        // 未声明 SameSite 的 cookie 视为 Default
        let got = cookie.same_site.unwrap_or(SameSite::Default);
        if got != want {
            return Err(AssertError::mismatch(format!(
                "cookie {:?} samesite mismatch: got {} want {}",
                name, got, want
            )));
        }
    }

    let now = Utc::now();

    if let Some(min) = min_max_age {
        match (cookie.max_age, cookie.expires) {
            (Some(max_age), _) if max_age > 0 => {
                if max_age < min {
                    return Err(AssertError::mismatch(format!(
                        "cookie {:?} max-age too small: got {} want >= {}",
                        name, max_age, min
                    )));
                }
            }
            (_, Some(expires)) => {
                let remaining = (expires - now).num_seconds();
                if remaining < min {
                    return Err(AssertError::mismatch(format!(
                        "cookie {:?} expires too soon: remaining {}s want >= {}s",
                        name, remaining, min
                    )));
                }
            }
            _ => {
                return Err(AssertError::mismatch(format!(
                    "cookie {:?} has neither Max-Age nor Expires to validate min_max_age",
                    name
                )));
            }
        }
    }

    if let Some(want_not_expired) = want_not_expired {
        let expired = cookie.is_expired(now);
        if want_not_expired && expired {
            return Err(AssertError::mismatch(format!(
                "cookie {:?} already expired",
                name
            )));
        }
        if !want_not_expired && !expired {
            return Err(AssertError::mismatch(format!("cookie {:?} is not expired", name)));
        }
    }

    Ok(())
}
