//! Session cookie encoding and parsing.
//!
//! The session token travels in a single cookie:
//! `session_id=<token>; Path=/; HttpOnly; SameSite=Lax; Max-Age=2592000`.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use murmur_types::config::AppConfig;

/// `Set-Cookie` value issuing `token`.
pub fn session_cookie(config: &AppConfig, token: &str) -> String {
    build(config, token, config.session_max_age_secs())
}

/// `Set-Cookie` value telling the client to drop the session cookie.
pub fn clear_session_cookie(config: &AppConfig) -> String {
    build(config, "", 0)
}

fn build(config: &AppConfig, value: &str, max_age: i64) -> String {
    let mut cookie = format!(
        "{}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        config.cookie_name
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// The value of cookie `name` from the request's `Cookie` headers.
///
/// Empty values count as absent.
pub fn token_from_headers(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
