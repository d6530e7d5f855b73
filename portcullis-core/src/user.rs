//! User records
//!
//! Users live in a durable mapping keyed by username. Two value shapes are
//! accepted on read:
//!
//! | Shape                                  | Resolves to                        |
//! | -------------------------------------- | ---------------------------------- |
//! | `"<hash>"`                             | `{password_hash: <hash>, role: "viewer"}` |
//! | `{"password_hash": "<hash>", "role": "<role>"}` | as stored                 |
//!
//! The object form also accepts `password` in place of `password_hash`, and a
//! missing `role` resolves to [`DEFAULT_ROLE`].
use serde::{Deserialize, Serialize};

/// Role assigned to legacy records and to records that do not name one.
pub const DEFAULT_ROLE: &str = "viewer";

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// A user entry exactly as it appears in durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredUser {
    /// Bare password hash.
    Legacy(String),
    Record {
        #[serde(alias = "password")]
        password_hash: String,
        #[serde(default = "default_role")]
        role: String,
    },
}

impl StoredUser {
    /// Normalise the stored shape into a [`UserRecord`].
    ///
    /// Returns `None` when the entry carries an empty hash; such an entry can
    /// never authenticate and is treated as a missing user.
    pub fn into_record(self, username: &str) -> Option<UserRecord> {
        let (password_hash, role) = match self {
            StoredUser::Legacy(hash) => (hash, default_role()),
            StoredUser::Record {
                password_hash,
                role,
            } => (password_hash, role),
        };

        if password_hash.is_empty() {
            return None;
        }

        Some(UserRecord {
            username: username.to_string(),
            password_hash,
            role,
        })
    }
}

/// A user resolved to a `(hash, role)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}
