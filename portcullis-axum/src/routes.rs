use axum::{
    Extension, Form, Json, Router,
    extract::State,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use portcullis::{LoginOutcome, RepositoryProvider};

use crate::{
    error::{AuthError, Result},
    extractors::SessionTokenFromRequest,
    middleware::AuthState,
    types::*,
};

pub fn create_router<R>(state: AuthState<R>) -> Router
where
    R: RepositoryProvider + 'static,
{
    let cookie_config = state.cookie_config.clone();

    Router::new()
        .route("/health", get(health_handler::<R>))
        .route("/session", get(get_session_handler::<R>))
        .route("/login", get(login_page_handler).post(login_handler::<R>))
        .route("/logout", get(logout_handler::<R>).post(logout_handler::<R>))
        .with_state(state)
        .layer(Extension(cookie_config))
}

async fn health_handler<R>(State(state): State<AuthState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.portcullis.health_check().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn get_session_handler<R>(
    State(state): State<AuthState<R>>,
    SessionTokenFromRequest(session_token): SessionTokenFromRequest,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let session_token = session_token.ok_or(AuthError::Unauthorized)?;

    let session = state
        .portcullis
        .session(&session_token)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    Ok(Json(SessionResponse { session }))
}

/// Landing point for redirected browsers; page rendering is left to the application.
async fn login_page_handler() -> impl IntoResponse {
    Json(LoginPageResponse {
        login: "POST username, password".to_string(),
    })
}

async fn login_handler<R>(
    State(state): State<AuthState<R>>,
    ClientIdentifier(identifier): ClientIdentifier,
    SessionTokenFromRequest(previous): SessionTokenFromRequest,
    jar: CookieJar,
    Form(payload): Form<LoginRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let sign_in = state
        .portcullis
        .sign_in(
            &identifier,
            &payload.username,
            &payload.password,
            previous.as_ref(),
        )
        .await?;
    let retry_after = sign_in.outcome.retry_after_seconds_at(Utc::now());

    match (sign_in.outcome, sign_in.session) {
        (LoginOutcome::Authenticated { username, role }, Some(session)) => {
            let jar = jar.add(state.cookie_config.session_cookie(&session.token));
            Ok((
                jar,
                Json(LoginResponse {
                    username,
                    role,
                    session,
                }),
            ))
        }
        (LoginOutcome::Locked { .. }, _) => Err(AuthError::LockedOut {
            retry_after: retry_after.unwrap_or_default(),
        }),
        _ => Err(AuthError::InvalidCredentials),
    }
}

async fn logout_handler<R>(
    State(state): State<AuthState<R>>,
    jar: CookieJar,
    SessionTokenFromRequest(session_token): SessionTokenFromRequest,
) -> impl IntoResponse
where
    R: RepositoryProvider,
{
    if let Some(session_token) = session_token {
        if let Err(e) = state.portcullis.logout(&session_token).await {
            tracing::warn!(error = %e, "Failed to delete session on logout");
        }
    }

    let jar = jar.remove(state.cookie_config.removal_cookie());

    (jar, Redirect::to(&state.login_path))
}
