use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quadra_core::RosterError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 409 Conflict errors
// ---------------------------------------------------------------------------

/// Private sentinel error type used to carry an explicit HTTP 409 through
/// the `anyhow::Error` chain without touching the `RosterError` enum.
#[derive(Debug)]
struct ConflictError {
    code: &'static str,
    message: String,
}

impl std::fmt::Display for ConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConflictError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 409 Conflict error with a reason code.
    pub fn conflict(code: &'static str, msg: impl Into<String>) -> Self {
        Self(
            ConflictError {
                code,
                message: msg.into(),
            }
            .into(),
        )
    }
}

fn status_for(e: &RosterError) -> StatusCode {
    match e {
        RosterError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
        RosterError::InvitationNotFound(_) => StatusCode::NOT_FOUND,
        RosterError::InvitationExists(_)
        | RosterError::InvitationNotPending { .. }
        | RosterError::AlreadyMember { .. } => StatusCode::CONFLICT,
        RosterError::IdentityMismatch { .. } => StatusCode::FORBIDDEN,
        RosterError::InvalidEmail(_)
        | RosterError::InvalidId(_)
        | RosterError::InvalidStatus(_)
        | RosterError::InvalidDecision(_)
        | RosterError::EmptyField { .. } => StatusCode::BAD_REQUEST,
        RosterError::Store(_)
        | RosterError::NoRuntime
        | RosterError::Io(_)
        | RosterError::Yaml(_)
        | RosterError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(c) = self.0.downcast_ref::<ConflictError>() {
            let body = serde_json::json!({ "error": c.message.clone(), "code": c.code });
            return (StatusCode::CONFLICT, axum::Json(body)).into_response();
        }

        let (status, code) = match self.0.downcast_ref::<RosterError>() {
            Some(e) => (status_for(e), e.code()),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string(), "code": code });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
