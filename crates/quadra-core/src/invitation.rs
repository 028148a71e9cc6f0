use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::batch::{WriteBatch, WriteOp};
use crate::error::{Result, RosterError};
use crate::paths;
use crate::store::RosterStore;
use crate::types::InvitationStatus;

// ---------------------------------------------------------------------------
// Invitation
// ---------------------------------------------------------------------------

/// An offer for an identity to join a team with a given role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub team_id: String,
    /// Denormalized display name of the team at the time of the invite.
    pub team_name: String,
    /// Lowercased; the lookup key for the invitee's pending list.
    pub invited_user_email: String,
    pub role: String,
    pub status: InvitationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    /// Whether `email` is the address this invitation was sent to.
    pub fn is_addressed_to(&self, email: &str) -> bool {
        self.invited_user_email == paths::normalize_email(email)
    }
}

// ---------------------------------------------------------------------------
// NewInvitation
// ---------------------------------------------------------------------------

/// Parameters for issuing an invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvitation {
    pub team_id: String,
    pub team_name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub invited_by: Option<String>,
    /// Caller-chosen id; a UUID is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
}

impl NewInvitation {
    pub fn new(
        team_id: impl Into<String>,
        team_name: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            team_name: team_name.into(),
            email: email.into(),
            role: role.into(),
            invited_by: None,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn invited_by(mut self, uid: impl Into<String>) -> Self {
        self.invited_by = Some(uid.into());
        self
    }

    /// Validate the parameters and build the pending record.
    pub fn into_invitation(self, now: DateTime<Utc>) -> Result<Invitation> {
        let id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        paths::validate_id(&id)?;
        paths::validate_id(&self.team_id)?;
        let email = paths::validated_email(&self.email)?;
        let role = self.role.trim().to_string();
        if role.is_empty() {
            return Err(RosterError::EmptyField { field: "role" });
        }
        let team_name = self.team_name.trim().to_string();
        if team_name.is_empty() {
            return Err(RosterError::EmptyField { field: "team_name" });
        }

        Ok(Invitation {
            id,
            team_id: self.team_id,
            team_name,
            invited_user_email: email,
            role,
            status: InvitationStatus::Pending,
            invited_by: self.invited_by,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Issue a pending invitation.
///
/// The store rejects, inside the same transaction, a duplicate id, a second
/// pending invitation for the same team and email, and an email that is
/// already on the team's roster.
pub fn issue_invitation(store: &dyn RosterStore, params: NewInvitation) -> Result<Invitation> {
    let invitation = params.into_invitation(Utc::now())?;

    let mut batch = WriteBatch::new();
    batch.push(WriteOp::InsertInvitation(invitation.clone()));
    store.commit(batch)?;

    tracing::info!(
        invitation = %invitation.id,
        team = %invitation.team_id,
        email = %invitation.invited_user_email,
        role = %invitation.role,
        "invitation issued"
    );
    Ok(invitation)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
