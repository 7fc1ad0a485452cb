//! Configuration module for the gamebk client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

use crate::coordinator::DuplicatePolicy;
use crate::messages::Locale;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit API base URL; when unset requests go to `origin`
    pub base_url: Option<String>,
    /// Origin the client was served from
    pub origin: String,
    /// Language for user-visible strings
    pub locale: Locale,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// How long success and error notifications stay visible
    pub notify_dismiss_after: Duration,
    /// Whether an action may be submitted again while an identical one is in flight
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            origin: "http://127.0.0.1:8080".to_string(),
            locale: Locale::En,
            log_level: "info".to_string(),
            notify_dismiss_after: Duration::from_millis(3000),
            duplicate_policy: DuplicatePolicy::Allow,
        }
    }
}

impl Config {
    /// Read only the log level, so logging can be set up before
    /// [`Config::from_env`] reports bad values.
    pub fn log_level_from_env() -> String {
        dotenvy::dotenv().ok();
        env::var("GAMEBK_LOG_LEVEL").unwrap_or_else(|_| Self::default().log_level)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let log_level = Self::log_level_from_env();
        let defaults = Self::default();

        let base_url = env::var("GAMEBK_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let origin = env::var("GAMEBK_ORIGIN").unwrap_or(defaults.origin);

        let locale = match env::var("GAMEBK_LANG") {
            Ok(v) => v.parse().unwrap_or_else(|_| {
                tracing::warn!("Unknown GAMEBK_LANG {:?}, using en", v);
                Locale::En
            }),
            Err(_) => defaults.locale,
        };

        let notify_dismiss_after = match env::var("GAMEBK_NOTIFY_DISMISS_MS") {
            Ok(v) => match v.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(
                        "Invalid GAMEBK_NOTIFY_DISMISS_MS {:?}, using {}ms",
                        v,
                        defaults.notify_dismiss_after.as_millis()
                    );
                    defaults.notify_dismiss_after
                }
            },
            Err(_) => defaults.notify_dismiss_after,
        };

        let duplicate_policy = match env::var("GAMEBK_DUPLICATE_POLICY") {
            Ok(v) => v.parse().unwrap_or_else(|_| {
                tracing::warn!("Unknown GAMEBK_DUPLICATE_POLICY {:?}, using allow", v);
                DuplicatePolicy::Allow
            }),
            Err(_) => defaults.duplicate_policy,
        };

        Self {
            base_url,
            origin,
            locale,
            log_level,
            notify_dismiss_after,
            duplicate_policy,
        }
    }
}
