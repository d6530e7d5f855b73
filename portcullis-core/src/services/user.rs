use std::collections::HashMap;
use std::sync::Arc;

use crate::{repositories::UserRepository, user::UserRecord};

/// Read-only lookup of user records.
///
/// Every call reads the mapping afresh so that edits made by an operator are
/// picked up without a restart.
pub struct UserStore<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserStore<R> {
    /// Create a new UserStore with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Load every user, normalised to [`UserRecord`].
    ///
    /// Storage that cannot be read yields an empty mapping.
    pub async fn load_all(&self) -> HashMap<String, UserRecord> {
        let stored = match self.repository.load_all().await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "User mapping unreadable, treating as empty");
                return HashMap::new();
            }
        };

        stored
            .into_iter()
            .filter_map(|(username, entry)| {
                let record = entry.into_record(&username)?;
                Some((username, record))
            })
            .collect()
    }

    /// Look up a single user by exact username.
    pub async fn get(&self, username: &str) -> Option<UserRecord> {
        self.load_all().await.remove(username)
    }
}
