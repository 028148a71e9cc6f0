use thiserror::Error;

use crate::types::InvitationStatus;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("not initialized: run 'quadra init'")]
    NotInitialized,

    #[error("invitation not found: {0}")]
    InvitationNotFound(String),

    #[error("invitation already exists: {0}")]
    InvitationExists(String),

    #[error("invitation {id} is {status}, only pending invitations can be decided")]
    InvitationNotPending { id: String, status: InvitationStatus },

    #[error("{email} is already a member of team {team_id}")]
    AlreadyMember { team_id: String, email: String },

    #[error("invitation was sent to {invited}, not {actual}")]
    IdentityMismatch { invited: String, actual: String },

    #[error("invalid email '{0}'")]
    InvalidEmail(String),

    #[error("invalid id '{0}': must be 1-128 characters of letters, digits, '-' or '_'")]
    InvalidId(String),

    #[error("invalid invitation status: {0}")]
    InvalidStatus(String),

    #[error("invalid decision '{0}': expected 'accept' or 'decline'")]
    InvalidDecision(String),

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("store error: {0}")]
    Store(String),

    #[error("no async runtime: live queries must be started inside a Tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RosterError {
    /// Stable machine-readable reason code, suitable for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            RosterError::NotInitialized => "not_initialized",
            RosterError::InvitationNotFound(_) => "invitation_not_found",
            RosterError::InvitationExists(_) => "invitation_exists",
            RosterError::InvitationNotPending { .. } => "invitation_not_pending",
            RosterError::AlreadyMember { .. } => "already_member",
            RosterError::IdentityMismatch { .. } => "identity_mismatch",
            RosterError::InvalidEmail(_)
            | RosterError::InvalidId(_)
            | RosterError::InvalidStatus(_)
            | RosterError::InvalidDecision(_)
            | RosterError::EmptyField { .. } => "invalid_input",
            RosterError::Store(_) => "store_error",
            RosterError::NoRuntime => "no_runtime",
            RosterError::Io(_) | RosterError::Yaml(_) | RosterError::Json(_) => "internal",
        }
    }
}

/// Flatten a backend error into `RosterError::Store`.
pub(crate) fn store_err(e: impl std::fmt::Display) -> RosterError {
    RosterError::Store(e.to_string())
}

pub type Result<T> = std::result::Result<T, RosterError>;
