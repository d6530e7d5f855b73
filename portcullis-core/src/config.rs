use chrono::Duration;

/// Failures tolerated before an identifier is locked.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 3;

/// Idle lifetime of a session, in seconds.
pub const DEFAULT_SESSION_IDLE_SECONDS: i64 = 900;

/// Configuration for per-identifier lockout.
///
/// Once an identifier has accumulated `max_failed_attempts` failures it is
/// locked for `base_backoff * 2^(count - max_failed_attempts)`, so with the
/// defaults the 3rd, 4th and 5th failures lock for 1, 2 and 4 minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutConfig {
    /// Whether lockout is enforced at all.
    pub enabled: bool,

    /// Failure count at which the first lock is applied.
    pub max_failed_attempts: u32,

    /// Lock duration applied when the threshold is first reached.
    pub base_backoff: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            base_backoff: Duration::minutes(1),
        }
    }
}

impl LockoutConfig {
    /// A configuration that never locks and never records failures.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_max_failed_attempts(mut self, max_failed_attempts: u32) -> Self {
        self.max_failed_attempts = max_failed_attempts;
        self
    }

    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Lock duration after the `count`-th consecutive failure.
    ///
    /// Returns `None` when the delay overflows; callers treat that as the
    /// longest lock they can express.
    pub fn backoff_for(&self, count: u32) -> Option<Duration> {
        let exponent = count.saturating_sub(self.max_failed_attempts);
        let factor = 2i32.checked_pow(exponent)?;
        self.base_backoff.checked_mul(factor)
    }
}

/// Session lifetime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// A session unused for longer than this is expired.
    pub idle_lifetime: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_lifetime: Duration::seconds(DEFAULT_SESSION_IDLE_SECONDS),
        }
    }
}

impl SessionConfig {
    pub fn idle_lifetime(mut self, idle_lifetime: Duration) -> Self {
        self.idle_lifetime = idle_lifetime;
        self
    }
}
