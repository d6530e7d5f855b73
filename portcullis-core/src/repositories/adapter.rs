use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error, Session,
    ledger::FailureLedger,
    repositories::{
        FailureLedgerRepository, RepositoryProvider, SessionRepository, UserRepository,
    },
    session::SessionToken,
    user::StoredUser,
};

/// Adapter that wraps a RepositoryProvider and implements individual repository traits
pub struct UserRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> UserRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn load_all(&self) -> Result<HashMap<String, StoredUser>, Error> {
        self.provider.user().load_all().await
    }
}

pub struct FailureLedgerRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> FailureLedgerRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> FailureLedgerRepository for FailureLedgerRepositoryAdapter<R> {
    async fn load(&self) -> Result<FailureLedger, Error> {
        self.provider.failure_ledger().load().await
    }

    async fn save(&self, ledger: &FailureLedger) -> Result<(), Error> {
        self.provider.failure_ledger().save(ledger).await
    }
}

pub struct SessionRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SessionRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SessionRepository for SessionRepositoryAdapter<R> {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        self.provider.session().create(session).await
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        self.provider.session().find_by_token(token).await
    }

    async fn touch(&self, token: &SessionToken, at: DateTime<Utc>) -> Result<(), Error> {
        self.provider.session().touch(token, at).await
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.provider.session().delete(token).await
    }

    async fn cleanup_expired(&self, idle_before: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.session().cleanup_expired(idle_before).await
    }
}
