use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::Response,
};
use portcullis::{AccessPolicy, Portcullis, RepositoryProvider};

use crate::{
    error::AuthError,
    extractors::session_token,
    types::{CookieConfig, DEFAULT_LOGIN_PATH},
};

pub struct AuthState<R: RepositoryProvider> {
    pub portcullis: Arc<Portcullis<R>>,
    pub cookie_config: CookieConfig,
    /// Where browsers without a session are sent.
    pub login_path: String,
}

impl<R: RepositoryProvider> AuthState<R> {
    pub fn new(portcullis: Arc<Portcullis<R>>) -> Self {
        Self {
            portcullis,
            cookie_config: CookieConfig::default(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    pub fn with_cookie_config(mut self, cookie_config: CookieConfig) -> Self {
        self.cookie_config = cookie_config;
        self
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }
}

impl<R: RepositoryProvider> Clone for AuthState<R> {
    fn clone(&self) -> Self {
        Self {
            portcullis: self.portcullis.clone(),
            cookie_config: self.cookie_config.clone(),
            login_path: self.login_path.clone(),
        }
    }
}

/// State for [`require_role`]: the auth state plus the role demanded.
pub struct RoleState<R: RepositoryProvider> {
    pub auth: AuthState<R>,
    pub role: String,
}

impl<R: RepositoryProvider> RoleState<R> {
    pub fn new(auth: AuthState<R>, role: impl Into<String>) -> Self {
        Self {
            auth,
            role: role.into(),
        }
    }
}

impl<R: RepositoryProvider> Clone for RoleState<R> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            role: self.role.clone(),
        }
    }
}

/// Admit only requests carrying a live session.
///
/// API paths (`/api...`) are refused with a 401 JSON body, everything else is
/// redirected to the login path. The admitted [`portcullis::Session`] is
/// placed in the request extensions for [`CurrentSession`](crate::CurrentSession).
pub async fn require_session<R>(
    State(state): State<AuthState<R>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: RepositoryProvider,
{
    guard(&state, &AccessPolicy::Authenticated, request, next).await
}

/// Admit only sessions whose role equals [`RoleState::role`]; others get 403.
pub async fn require_role<R>(
    State(state): State<RoleState<R>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: RepositoryProvider,
{
    guard(&state.auth, &AccessPolicy::role(state.role.as_str()), request, next).await
}

async fn guard<R>(
    state: &AuthState<R>,
    policy: &AccessPolicy,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: RepositoryProvider,
{
    let token = session_token(request.headers(), &state.cookie_config.name);
    // Nested routers see a stripped path; classify on the one the client sent.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path(), |uri| uri.path())
        .to_string();

    let session = state
        .portcullis
        .authorize(token.as_ref(), &path, policy)
        .await
        .map_err(|e| AuthError::from_portcullis(e, &state.login_path))?;

    tracing::debug!(user = %session.user, path = %path, "Request admitted");
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
