use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use portcullis::{AccessDenied, PortcullisError, Surface};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Too many failed attempts")]
    LockedOut { retry_after: i64 },

    #[error("unauthorized")]
    Unauthorized,

    /// A browser request without a session; answered with a redirect.
    #[error("login required")]
    LoginRequired(String),

    #[error("forbidden")]
    Forbidden,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Map a guard denial onto the response for its surface.
    pub fn from_denied(denied: AccessDenied, login_path: &str) -> Self {
        match denied {
            AccessDenied::Unauthorized(Surface::Api) => AuthError::Unauthorized,
            AccessDenied::Unauthorized(Surface::Browser) => {
                AuthError::LoginRequired(login_path.to_string())
            }
            AccessDenied::Forbidden => AuthError::Forbidden,
        }
    }

    pub fn from_portcullis(err: PortcullisError, login_path: &str) -> Self {
        match err {
            PortcullisError::AccessDenied(denied) => Self::from_denied(denied, login_path),
            other => AuthError::InternalError(other.to_string()),
        }
    }
}

impl From<PortcullisError> for AuthError {
    fn from(err: PortcullisError) -> Self {
        match err {
            PortcullisError::AccessDenied(AccessDenied::Forbidden) => AuthError::Forbidden,
            PortcullisError::AccessDenied(AccessDenied::Unauthorized(_)) => AuthError::Unauthorized,
            PortcullisError::StorageError(msg) | PortcullisError::SessionError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                AuthError::InternalError(msg)
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::LoginRequired(login_path) => {
                return Redirect::to(&login_path).into_response();
            }
            AuthError::LockedOut { retry_after } => {
                let body = Json(json!({
                    "error": "Too many failed attempts",
                    "code": StatusCode::TOO_MANY_REQUESTS.as_u16(),
                    "retry_after": retry_after,
                }));
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_after.to_string())],
                    body,
                )
                    .into_response();
            }
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            // Storage details stay in the logs.
            AuthError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
