//! Application configuration types for Murmur.
//!
//! `AppConfig` mirrors `config.toml` in the data directory. It is loaded once
//! at startup and shared read-only with every component afterwards.

use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_SESSION_TTL_DAYS;

/// Top-level configuration.
///
/// All fields have defaults, so an empty (or missing) file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Session lifetime in days, counted from creation. Not sliding.
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,

    /// Upper bound for a single document store round-trip.
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,

    /// Name of the cookie carrying the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Whether the session cookie is marked `Secure`.
    #[serde(default)]
    pub cookie_secure: bool,

    /// Minimum password length accepted at signup and password change.
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,

    /// Display name length bounds (inclusive, in characters).
    #[serde(default = "default_name_min_len")]
    pub name_min_len: usize,
    #[serde(default = "default_name_max_len")]
    pub name_max_len: usize,

    /// SQLite URL for the document store. Derived from the data directory
    /// when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub server: ServerConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_session_ttl_days() -> i64 {
    DEFAULT_SESSION_TTL_DAYS
}

fn default_store_timeout_secs() -> u64 {
    30
}

fn default_cookie_name() -> String {
    "session_id".to_string()
}

fn default_min_password_len() -> usize {
    8
}

fn default_name_min_len() -> usize {
    2
}

fn default_name_max_len() -> usize {
    20
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: default_session_ttl_days(),
            store_timeout_secs: default_store_timeout_secs(),
            cookie_name: default_cookie_name(),
            cookie_secure: false,
            min_password_len: default_min_password_len(),
            name_min_len: default_name_min_len(),
            name_max_len: default_name_max_len(),
            database_url: None,
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Session lifetime in seconds (used for the cookie `Max-Age`).
    pub fn session_max_age_secs(&self) -> i64 {
        self.session_ttl_days * 24 * 60 * 60
    }
}
