use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use portcullis_core::{Error, StoredUser, repositories::UserRepository};

use crate::file::read_object;

/// User mapping read from a JSON file on every call.
pub struct JsonUserRepository {
    path: PathBuf,
}

impl JsonUserRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UserRepository for JsonUserRepository {
    async fn load_all(&self) -> Result<HashMap<String, StoredUser>, Error> {
        let Some(entries) = read_object(&self.path).await? else {
            return Ok(HashMap::new());
        };

        let mut users = HashMap::with_capacity(entries.len());
        for (username, value) in entries {
            match serde_json::from_value::<StoredUser>(value) {
                Ok(user) => {
                    users.insert(username, user);
                }
                Err(e) => {
                    tracing::warn!(
                        username = %username,
                        path = %self.path.display(),
                        error = %e,
                        "Skipping malformed user entry"
                    );
                }
            }
        }

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_core::error::StorageError;

    async fn repo_with(contents: &str) -> (tempfile::TempDir, JsonUserRepository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        tokio::fs::write(&path, contents).await.unwrap();
        (dir, JsonUserRepository::new(path))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonUserRepository::new(dir.path().join("users.json"));
        assert!(repo.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_both_shapes() {
        let (_dir, repo) = repo_with(
            r#"{
                "admin": {"password": "h1", "role": "admin"},
                "olduser": "h2"
            }"#,
        )
        .await;

        let users = repo.load_all().await.unwrap();
        assert_eq!(
            users["admin"],
            StoredUser::Record {
                password_hash: "h1".to_string(),
                role: "admin".to_string(),
            }
        );
        assert_eq!(users["olduser"], StoredUser::Legacy("h2".to_string()));
    }

    #[tokio::test]
    async fn test_bad_entry_is_skipped_not_fatal() {
        let (_dir, repo) = repo_with(r#"{"good": "h", "bad": 17, "worse": {"role": "x"}}"#).await;

        let users = repo.load_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users.contains_key("good"));
    }

    #[tokio::test]
    async fn test_unparsable_file_is_malformed() {
        let (_dir, repo) = repo_with("{ not json").await;

        let err = repo.load_all().await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Malformed(_))));
    }
}
