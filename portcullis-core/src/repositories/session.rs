use crate::{Error, Session, session::SessionToken};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for session data access
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Store a new session
    async fn create(&self, session: Session) -> Result<Session, Error>;

    /// Find a session by token
    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error>;

    /// Record that the session was presented at `at`
    async fn touch(&self, token: &SessionToken, at: DateTime<Utc>) -> Result<(), Error>;

    /// Delete a session by token
    async fn delete(&self, token: &SessionToken) -> Result<(), Error>;

    /// Delete sessions last active before `idle_before`, returning how many were removed
    async fn cleanup_expired(&self, idle_before: DateTime<Utc>) -> Result<u64, Error>;
}
