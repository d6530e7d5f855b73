use crate::{
    Error, Session, SessionConfig, repositories::SessionRepository, session::SessionToken,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Service for session management operations
pub struct SessionService<R: SessionRepository> {
    repository: Arc<R>,
    config: SessionConfig,
}

impl<R: SessionRepository> SessionService<R> {
    /// Create a new SessionService with the given repository
    pub fn new(repository: Arc<R>, config: SessionConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Issue a new session for an authenticated user
    pub async fn create_session(&self, user: &str, role: &str) -> Result<Session, Error> {
        self.create_session_at(user, role, Utc::now()).await
    }

    pub async fn create_session_at(
        &self,
        user: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, Error> {
        let session = Session::new(SessionToken::generate()?, user, role, now);
        tracing::debug!(user = %user, role = %role, "Session created");
        self.repository.create(session).await
    }

    /// Get a live session by token, refreshing its idle timer
    pub async fn get_session(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        self.get_session_at(token, Utc::now()).await
    }

    pub async fn get_session_at(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, Error> {
        let Some(mut session) = self.repository.find_by_token(token).await? else {
            return Ok(None);
        };

        if session.is_expired_at(self.config.idle_lifetime, now) {
            tracing::debug!(user = %session.user, "Session expired");
            self.repository.delete(token).await?;
            return Ok(None);
        }

        self.repository.touch(token, now).await?;
        session.last_active_at = now;
        Ok(Some(session))
    }

    /// Delete a session
    pub async fn delete_session(&self, token: &SessionToken) -> Result<(), Error> {
        self.repository.delete(token).await
    }

    /// Clean up sessions idle past their lifetime
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, Error> {
        let idle_before = Utc::now() - self.config.idle_lifetime;
        let removed = self.repository.cleanup_expired(idle_before).await?;
        if removed > 0 {
            tracing::info!(count = removed, "Cleaned up expired sessions");
        }
        Ok(removed)
    }
}
