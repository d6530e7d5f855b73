//! Session management
//!
//! A session is the server-side record of a successful login. The client only
//! holds an opaque [`SessionToken`]; the session itself carries:
//!
//! | Field            | Type           | Description                                 |
//! | ---------------- | -------------- | ------------------------------------------- |
//! | `token`          | `SessionToken` | Opaque lookup key handed to the client.     |
//! | `user`           | `String`       | Username the session was issued for.        |
//! | `role`           | `String`       | Role of that user at login time.            |
//! | `created_at`     | `DateTime`     | When the session was issued.                |
//! | `last_active_at` | `DateTime`     | Last time the session was presented.        |
use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::{TryRngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};

use crate::{Error, error::SessionError};

/// Opaque session token with 256 bits of entropy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token received from a client.
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    /// Generate a fresh random token from the OS RNG.
    pub fn generate() -> Result<Self, Error> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SessionError::TokenGeneration(e.to_string()))?;
        Ok(Self(BASE64_URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub token: SessionToken,
    pub user: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: SessionToken, user: &str, role: &str, now: DateTime<Utc>) -> Self {
        Self {
            token,
            user: user.to_string(),
            role: role.to_string(),
            created_at: now,
            last_active_at: now,
        }
    }

    /// Whether the session has been idle for longer than `idle_lifetime`.
    pub fn is_expired_at(&self, idle_lifetime: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_active_at > idle_lifetime
    }

    /// When the session will expire if it is not presented again.
    pub fn expires_at(&self, idle_lifetime: Duration) -> DateTime<Utc> {
        self.last_active_at + idle_lifetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = SessionToken::generate().unwrap();
        let b = SessionToken::generate().unwrap();

        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 43);
        assert!(
            a.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_idle_expiry() {
        let now = Utc::now();
        let session = Session::new(SessionToken::new("t"), "admin", "admin", now);
        let idle = Duration::seconds(900);

        assert!(!session.is_expired_at(idle, now + Duration::seconds(900)));
        assert!(session.is_expired_at(idle, now + Duration::seconds(901)));
        assert_eq!(session.expires_at(idle), now + idle);
    }

    #[test]
    fn test_token_is_not_serialized() {
        let session = Session::new(SessionToken::new("secret"), "admin", "admin", Utc::now());
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains(r#""role":"admin""#));
    }
}
