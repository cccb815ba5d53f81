use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::{HeaderMap, SET_COOKIE};
use std::fmt;

/// SameSite 属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// 出现了 SameSite 属性但值为空或无法识别
    Default,
    Lax,
    Strict,
    None,
}

impl SameSite {
    /// 解析期望值（断言参数），接受 `lax` / `LaxMode` 等写法
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "defaultmode" => Some(SameSite::Default),
            "lax" | "laxmode" => Some(SameSite::Lax),
            "strict" | "strictmode" => Some(SameSite::Strict),
            "none" | "nonemode" => Some(SameSite::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Default => "Default",
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 从 `Set-Cookie` 响应头解析出的 cookie
#[derive(Debug, Clone, PartialEq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// 原始 Max-Age 秒数；<= 0 表示立即过期
    pub max_age: Option<i64>,
    pub expires: Option<DateTime<Utc>>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl SetCookie {
    /// 解析单个 `Set-Cookie` 头的值；名称为空时返回 None
    pub fn parse(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);

        let mut cookie = SetCookie {
            name: name.to_string(),
            value: value.to_string(),
            path: None,
            domain: None,
            max_age: None,
            expires: None,
            http_only: false,
            secure: false,
            same_site: None,
        };

        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (attr.trim(), ""),
            };

            match key.to_ascii_lowercase().as_str() {
                "path" if !val.is_empty() => cookie.path = Some(val.to_string()),
                "domain" if !val.is_empty() => {
                    cookie.domain = Some(val.trim_start_matches('.').to_ascii_lowercase())
                }
                "max-age" => {
                    // 非法值忽略
                    if let Ok(secs) = val.parse::<i64>() {
                        cookie.max_age = Some(secs);
                    }
                }
                "expires" => cookie.expires = parse_http_date(val),
                "httponly" => cookie.http_only = true,
                "secure" => cookie.secure = true,
                "samesite" => {
                    cookie.same_site = Some(match val.to_ascii_lowercase().as_str() {
                        "lax" => SameSite::Lax,
                        "strict" => SameSite::Strict,
                        "none" => SameSite::None,
                        _ => SameSite::Default,
                    })
                }
                _ => {}
            }
        }

        Some(cookie)
    }

    /// 解析响应头中的全部 `Set-Cookie`，跳过无法解析的项
    pub fn from_headers(headers: &HeaderMap) -> Vec<Self> {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(SetCookie::parse)
            .collect()
    }

    pub fn name_matches(&self, name: &str, ignore_case: bool) -> bool {
        if ignore_case {
            self.name.eq_ignore_ascii_case(name)
        } else {
            self.name == name
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if matches!(self.max_age, Some(secs) if secs <= 0) {
            return true;
        }
        matches!(self.expires, Some(expires) if expires <= now)
    }
}

/// 解析 HTTP 日期（RFC 1123 以及 cookie 常见的 `dd-Mon-yyyy` 旧格式）
fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const LEGACY_FORMATS: [&str; 3] = [
        "%a, %d-%b-%Y %H:%M:%S GMT",
        "%a, %d-%b-%y %H:%M:%S GMT",
        "%A, %d-%b-%y %H:%M:%S GMT",
    ];
    LEGACY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
