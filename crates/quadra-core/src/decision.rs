//! Invitation transition service.
//!
//! Turns a decision on a pending invitation into one atomic batch: the
//! status update (guarded by `expected = Pending` inside the transaction)
//! plus, on acceptance, the new membership.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::batch::{WriteBatch, WriteOp};
use crate::error::{Result, RosterError};
use crate::identity::Identity;
use crate::invitation::Invitation;
use crate::membership::Membership;
use crate::store::RosterStore;
use crate::types::{Decision, InvitationStatus};

/// Result of a committed decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub invitation_id: String,
    pub team_id: String,
    pub team_name: String,
    pub decision: Decision,
    pub status: InvitationStatus,
    /// Present exactly when the decision was `accept`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership: Option<Membership>,
}

impl DecisionOutcome {
    /// One-line confirmation for the invitee.
    pub fn summary(&self) -> String {
        match &self.membership {
            Some(m) => format!("You joined {} as {}", self.team_name, m.role),
            None => format!("You declined the invitation to {}", self.team_name),
        }
    }
}

/// Build the batch for `decision` without committing it.
pub fn build_batch(invitation: &Invitation, decision: Decision, actor: &Identity) -> WriteBatch {
    let mut batch = WriteBatch::new();
    batch.push(WriteOp::SetInvitationStatus {
        id: invitation.id.clone(),
        expected: InvitationStatus::Pending,
        status: decision.target_status(),
    });
    if decision == Decision::Accept {
        batch.push(WriteOp::InsertMembership(Membership::from_acceptance(
            invitation,
            actor,
            Utc::now(),
        )));
    }
    batch
}

/// Decide on an invitation the caller has already read.
///
/// The in-hand status is only a fast path; the store re-checks that the
/// invitation is still pending inside the write transaction, so a stale read
/// or a concurrent decision fails with `InvitationNotPending` and writes
/// nothing.
pub fn decide(
    store: &dyn RosterStore,
    invitation: &Invitation,
    decision: Decision,
    actor: &Identity,
) -> Result<DecisionOutcome> {
    let actor = actor.validated()?;

    if !invitation.is_pending() {
        return Err(RosterError::InvitationNotPending {
            id: invitation.id.clone(),
            status: invitation.status,
        });
    }
    if !invitation.is_addressed_to(&actor.email) {
        return Err(RosterError::IdentityMismatch {
            invited: invitation.invited_user_email.clone(),
            actual: actor.email,
        });
    }

    let batch = build_batch(invitation, decision, &actor);
    let membership = batch.ops().iter().find_map(|op| match op {
        WriteOp::InsertMembership(m) => Some(m.clone()),
        _ => None,
    });

    if let Err(e) = store.commit(batch) {
        tracing::warn!(
            invitation = %invitation.id,
            decision = %decision,
            uid = %actor.uid,
            code = e.code(),
            error = %e,
            "invitation decision rejected"
        );
        return Err(e);
    }

    tracing::info!(
        invitation = %invitation.id,
        team = %invitation.team_id,
        decision = %decision,
        uid = %actor.uid,
        "invitation decided"
    );

    Ok(DecisionOutcome {
        invitation_id: invitation.id.clone(),
        team_id: invitation.team_id.clone(),
        team_name: invitation.team_name.clone(),
        decision,
        status: decision.target_status(),
        membership,
    })
}

/// Fetch the invitation by id, then `decide`.
pub fn decide_by_id(
    store: &dyn RosterStore,
    invitation_id: &str,
    decision: Decision,
    actor: &Identity,
) -> Result<DecisionOutcome> {
    let invitation = store
        .get_invitation(invitation_id)?
        .ok_or_else(|| RosterError::InvitationNotFound(invitation_id.to_string()))?;
    decide(store, &invitation, decision, actor)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
