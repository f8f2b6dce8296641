use std::env;

use tracing::info;

use crate::types::Credentials;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Social account (session provider only; the core pipeline never
    // touches these directly)
    pub account_username: String,
    pub account_secret: String,

    // Session artifact storage
    pub session_dir: String,

    // Browser backend
    pub webdriver_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Pipeline tuning
    pub freshness_hours: i64,
    pub top_k: usize,
    pub enrich_concurrency: usize,
    pub nav_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            account_username: required_env("PULSE_ACCOUNT_USER"),
            account_secret: required_env("PULSE_ACCOUNT_PASS"),
            session_dir: env::var("SESSION_DIR").unwrap_or_else(|_| ".sessions".to_string()),
            webdriver_url: env::var("WEBDRIVER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:4444".to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            freshness_hours: parsed_env("FRESHNESS_HOURS", 48),
            top_k: parsed_env("TOP_K", 5),
            enrich_concurrency: parsed_env("ENRICH_CONCURRENCY", 8),
            nav_timeout_secs: parsed_env("NAV_TIMEOUT_SECS", 15),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.account_username.clone(),
            secret: self.account_secret.clone(),
        }
    }

    /// Log the active configuration without the account secret.
    pub fn log_redacted(&self) {
        info!(
            account = self.account_username.as_str(),
            session_dir = self.session_dir.as_str(),
            webdriver_url = self.webdriver_url.as_str(),
            freshness_hours = self.freshness_hours,
            top_k = self.top_k,
            enrich_concurrency = self.enrich_concurrency,
            "Config loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
