use std::path::PathBuf;

use chrono::Duration;
use portcullis_core::{
    LockoutConfig, SessionConfig,
    config::{DEFAULT_MAX_FAILED_ATTEMPTS, DEFAULT_SESSION_IDLE_SECONDS},
};

pub const DEFAULT_USERS_FILE: &str = "users.json";
pub const DEFAULT_LEDGER_FILE: &str = "login-failures.json";

/// Deployment configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortcullisConfig {
    /// User mapping file (default: users.json).
    pub users_file: PathBuf,
    /// Failure ledger file (default: login-failures.json).
    pub ledger_file: PathBuf,
    /// Whether lockout is enforced.
    pub lockout_enabled: bool,
    /// Failures before the first lock.
    pub max_failed_attempts: u32,
    /// Length of the first lock, in seconds.
    pub base_backoff_seconds: i64,
    /// Session idle lifetime, in seconds.
    pub session_idle_seconds: i64,
}

impl Default for PortcullisConfig {
    fn default() -> Self {
        Self {
            users_file: PathBuf::from(DEFAULT_USERS_FILE),
            ledger_file: PathBuf::from(DEFAULT_LEDGER_FILE),
            lockout_enabled: true,
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            base_backoff_seconds: 60,
            session_idle_seconds: DEFAULT_SESSION_IDLE_SECONDS,
        }
    }
}

impl PortcullisConfig {
    /// Load configuration from `PORTCULLIS_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            users_file: lookup("PORTCULLIS_USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.users_file),
            ledger_file: lookup("PORTCULLIS_LEDGER_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.ledger_file),
            lockout_enabled: lookup("PORTCULLIS_LOCKOUT_ENABLED")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(defaults.lockout_enabled),
            max_failed_attempts: parsed(
                &lookup,
                "PORTCULLIS_MAX_FAILED_ATTEMPTS",
                defaults.max_failed_attempts,
            ),
            base_backoff_seconds: parsed(
                &lookup,
                "PORTCULLIS_BASE_BACKOFF_SECS",
                defaults.base_backoff_seconds,
            ),
            session_idle_seconds: parsed(
                &lookup,
                "PORTCULLIS_SESSION_IDLE_SECS",
                defaults.session_idle_seconds,
            ),
        }
    }

    /// Seconds outside the range `chrono::Duration` can hold fall back to the default.
    pub fn lockout_config(&self) -> LockoutConfig {
        let defaults = LockoutConfig::default();

        LockoutConfig {
            enabled: self.lockout_enabled,
            max_failed_attempts: self.max_failed_attempts,
            base_backoff: Duration::try_seconds(self.base_backoff_seconds)
                .unwrap_or(defaults.base_backoff),
        }
    }

    /// Seconds outside the range `chrono::Duration` can hold fall back to the default.
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();

        match Duration::try_seconds(self.session_idle_seconds) {
            Some(idle_lifetime) => defaults.idle_lifetime(idle_lifetime),
            None => defaults,
        }
    }
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
