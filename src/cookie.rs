//! `Set-Cookie` 头的构建与 `Cookie` 头的解析。
//!
//! 输出格式固定为
//! `name=value; Expires=<date>; Max-Age=N; Path=P; Domain=D; HttpOnly; Secure`，
//! 不适用的段会被省略。名字、值、路径和域名中的换行与分号会被清理，防止头部注入。

use chrono::{DateTime, Duration, Utc};

use crate::util::format_http_date;

/// Cookie 的可选参数。每个字段为 `None` 表示调用方没有提供该参数。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookieOptions {
    /// 秒数。大于 0 时输出 `Expires` 与 `Max-Age`，否则输出 `Max-Age=0`（立即过期）
    pub max_age: Option<i64>,
    /// 缺省或为空时为 `/`
    pub path: Option<String>,
    /// 为空时不输出
    pub domain: Option<String>,
    /// 会话 Cookie 请务必设置为 true，禁止浏览器脚本读取
    pub http_only: Option<bool>,
    pub secure: Option<bool>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }
}

fn clean_name(name: &str) -> String {
    name.replace(['\n', '\r'], "-")
}

fn clean_value(value: &str) -> String {
    value.replace(['\n', '\r', ';'], " ")
}

/// 以当前时间为基准生成 `Set-Cookie` 头的值
pub fn encode_cookie(name: &str, value: &str, options: &CookieOptions) -> String {
    encode_cookie_at(name, value, options, Utc::now())
}

/// 以给定时间为基准生成 `Set-Cookie` 头的值
pub fn encode_cookie_at(
    name: &str,
    value: &str,
    options: &CookieOptions,
    now: DateTime<Utc>,
) -> String {
    let mut cookie = format!("{}={}", clean_name(name), clean_value(value));

    if let Some(max_age) = options.max_age {
        if max_age > 0 {
            let expires = Duration::try_seconds(max_age).and_then(|d| now.checked_add_signed(d));
            if let Some(expires) = expires {
                cookie.push_str(&format!("; Expires={}", format_http_date(&expires)));
            }
            cookie.push_str(&format!("; Max-Age={}", max_age));
        } else {
            cookie.push_str("; Max-Age=0");
        }
    }

    match options.path.as_deref() {
        Some(path) if !path.is_empty() => {
            cookie.push_str(&format!("; Path={}", clean_value(path)));
        }
        _ => cookie.push_str("; Path=/"),
    }

    if let Some(domain) = options.domain.as_deref() {
        if !domain.is_empty() {
            cookie.push_str(&format!("; Domain={}", clean_value(domain)));
        }
    }

    if options.http_only == Some(true) {
        cookie.push_str("; HttpOnly");
    }

    if options.secure == Some(true) {
        cookie.push_str("; Secure");
    }

    cookie
}

/// 解析请求中的 `Cookie` 头，返回按出现顺序排列的 `(名称, 值)` 列表
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"');
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_minimal_cookie() {
        let c = encode_cookie_at("sid", "abc", &CookieOptions::new(), fixed_now());
        assert_eq!(c, "sid=abc; Path=/");
    }

    #[test]
    fn test_full_cookie() {
        let opts = CookieOptions::new()
            .max_age(3600)
            .path("")
            .domain("")
            .http_only(true)
            .secure(true);
        let c = encode_cookie_at("sid", "a;b\nc", &opts, fixed_now());
        assert_eq!(
            c,
            "sid=a b c; Expires=Mon, 15 Jan 2024 09:30:00 GMT; Max-Age=3600; Path=/; HttpOnly; Secure"
        );
    }

    #[test]
    fn test_non_positive_max_age_deletes() {
        let c = encode_cookie_at("sid", "", &CookieOptions::new().max_age(0), fixed_now());
        assert_eq!(c, "sid=; Max-Age=0; Path=/");
        let c = encode_cookie_at("sid", "", &CookieOptions::new().max_age(-5), fixed_now());
        assert!(c.contains("Max-Age=0"));
        assert!(!c.contains("Expires"));
    }

    #[test]
    fn test_path_and_domain() {
        let opts = CookieOptions::new()
            .max_age(10)
            .path("/admin;x")
            .domain("example.com");
        let c = encode_cookie_at("k", "v", &opts, fixed_now());
        assert!(c.ends_with("; Path=/admin x; Domain=example.com"));
    }

    #[test]
    fn test_flags_false() {
        let opts = CookieOptions::new().http_only(false).secure(false);
        let c = encode_cookie_at("k", "v", &opts, fixed_now());
        assert!(!c.contains("HttpOnly"));
        assert!(!c.contains("Secure"));
    }

    #[test]
    fn test_name_sanitized() {
        let c = encode_cookie_at("a\r\nb", "v", &CookieOptions::new(), fixed_now());
        assert!(c.starts_with("a--b=v"));
    }

    #[test]
    fn test_huge_max_age_skips_expires() {
        let c = encode_cookie_at("k", "v", &CookieOptions::new().max_age(i64::MAX), fixed_now());
        assert!(c.contains(&format!("Max-Age={}", i64::MAX)));
        assert!(!c.contains("Expires"));
    }

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("sid=abc; theme=\"dark\"; broken; =x; lang=zh");
        assert_eq!(
            cookies,
            vec![
                ("sid".to_string(), "abc".to_string()),
                ("theme".to_string(), "dark".to_string()),
                ("lang".to_string(), "zh".to_string()),
            ]
        );
    }
}
