//! services/api/src/web/cookies.rs
//!
//! Reading and writing the `access_token` / `refresh_token` session cookies.

use axum::http::{header, HeaderMap};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Returns the value of cookie `name` from the `Cookie` header, if any.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (key, value) = c.trim().split_once('=')?;
            (key == name).then_some(value)
        })
        .filter(|value| !value.is_empty())
}

/// An HTTP-only, `SameSite=Lax` cookie. `Secure` is only set in production.
pub fn session_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        name,
        value,
        max_age_secs,
        if secure { "; Secure" } else { "" }
    )
}

pub fn expired_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def; refresh_token=xyz"),
        );
        assert_eq!(get_cookie(&headers, ACCESS_COOKIE), Some("abc.def"));
        assert_eq!(get_cookie(&headers, REFRESH_COOKIE), Some("xyz"));
        assert_eq!(get_cookie(&headers, "missing"), None);
    }

    #[test]
    fn cleared_cookie_counts_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token="));
        assert_eq!(get_cookie(&headers, ACCESS_COOKIE), None);
    }

    #[test]
    fn secure_flag_only_in_production() {
        assert!(!session_cookie(ACCESS_COOKIE, "t", 300, false).contains("Secure"));
        let prod = session_cookie(ACCESS_COOKIE, "t", 300, true);
        assert!(prod.contains("Secure"));
        assert!(prod.contains("HttpOnly"));
        assert!(prod.contains("SameSite=Lax"));
        assert!(prod.contains("Max-Age=300"));
    }
}
