//! In-memory repositories.
//!
//! These keep the same whole-mapping semantics as file storage: the user
//! mapping and the ledger are handed out as copies and replaced wholesale.
//! Sessions are held in a concurrent map and live for the lifetime of the
//! process.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::{
    Error, Session,
    ledger::FailureLedger,
    repositories::{
        FailureLedgerRepository, FailureLedgerRepositoryProvider, RepositoryProvider,
        SessionRepository, SessionRepositoryProvider, UserRepository, UserRepositoryProvider,
    },
    session::SessionToken,
    user::StoredUser,
};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<String, StoredUser>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I, K>(users: I) -> Self
    where
        I: IntoIterator<Item = (K, StoredUser)>,
        K: Into<String>,
    {
        Self {
            users: RwLock::new(users.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Add or replace an entry, as an operator editing storage would.
    pub async fn insert(&self, username: &str, user: StoredUser) {
        self.users.write().await.insert(username.to_string(), user);
    }

    pub async fn remove(&self, username: &str) {
        self.users.write().await.remove(username);
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn load_all(&self) -> Result<HashMap<String, StoredUser>, Error> {
        Ok(self.users.read().await.clone())
    }
}

#[derive(Default)]
pub struct MemoryFailureLedgerRepository {
    ledger: RwLock<FailureLedger>,
}

impl MemoryFailureLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FailureLedgerRepository for MemoryFailureLedgerRepository {
    async fn load(&self) -> Result<FailureLedger, Error> {
        Ok(self.ledger.read().await.clone())
    }

    async fn save(&self, ledger: &FailureLedger) -> Result<(), Error> {
        *self.ledger.write().await = ledger.clone();
        Ok(())
    }
}

/// Process-local session store keyed by token.
#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: DashMap<String, Session>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        self.sessions
            .insert(session.token.as_str().to_string(), session.clone());
        Ok(session)
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        Ok(self
            .sessions
            .get(token.as_str())
            .map(|entry| entry.value().clone()))
    }

    async fn touch(&self, token: &SessionToken, at: DateTime<Utc>) -> Result<(), Error> {
        if let Some(mut entry) = self.sessions.get_mut(token.as_str()) {
            entry.last_active_at = at;
        }
        Ok(())
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.sessions.remove(token.as_str());
        Ok(())
    }

    async fn cleanup_expired(&self, idle_before: DateTime<Utc>) -> Result<u64, Error> {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.last_active_at >= idle_before);
        Ok((before - self.sessions.len()) as u64)
    }
}

/// Repository provider holding everything in memory.
#[derive(Default)]
pub struct MemoryRepositoryProvider {
    user: MemoryUserRepository,
    failure_ledger: MemoryFailureLedgerRepository,
    session: MemorySessionRepository,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I, K>(users: I) -> Self
    where
        I: IntoIterator<Item = (K, StoredUser)>,
        K: Into<String>,
    {
        Self {
            user: MemoryUserRepository::with_users(users),
            ..Self::default()
        }
    }
}

impl UserRepositoryProvider for MemoryRepositoryProvider {
    type UserRepo = MemoryUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.user
    }
}

impl FailureLedgerRepositoryProvider for MemoryRepositoryProvider {
    type FailureLedgerRepo = MemoryFailureLedgerRepository;

    fn failure_ledger(&self) -> &Self::FailureLedgerRepo {
        &self.failure_ledger
    }
}

impl SessionRepositoryProvider for MemoryRepositoryProvider {
    type SessionRepo = MemorySessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

#[async_trait]
impl RepositoryProvider for MemoryRepositoryProvider {
    async fn initialize(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}
