//! Atomic write batches and the change notifications they produce.
//!
//! A `WriteBatch` is the only way to mutate a `RosterStore`. The backend
//! applies every operation inside one transaction; if any operation's
//! precondition fails the whole batch is discarded.

use serde::{Deserialize, Serialize};

use crate::invitation::Invitation;
use crate::membership::Membership;
use crate::types::InvitationStatus;

// ---------------------------------------------------------------------------
// WriteOp
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert a new pending invitation. Fails if the id exists, the email
    /// already has a pending invitation for the team, or is already a member.
    InsertInvitation(Invitation),
    /// Move an invitation from `expected` to `status`. The current status is
    /// read inside the transaction; a mismatch aborts the batch.
    SetInvitationStatus {
        id: String,
        expected: InvitationStatus,
        status: InvitationStatus,
    },
    /// Insert a membership. Fails if the id already exists.
    InsertMembership(Membership),
}

// ---------------------------------------------------------------------------
// WriteBatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RosterChange
// ---------------------------------------------------------------------------

/// Emitted once per applied operation after a batch commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RosterChange {
    InvitationCreated {
        id: String,
        team_id: String,
        email: String,
    },
    InvitationStatusChanged {
        id: String,
        team_id: String,
        email: String,
        status: InvitationStatus,
    },
    MembershipCreated {
        id: String,
        team_id: String,
        email: String,
    },
}

impl RosterChange {
    /// Whether this change can alter the pending set of `email`.
    pub fn concerns_invitee(&self, email: &str) -> bool {
        match self {
            RosterChange::InvitationCreated { email: e, .. }
            | RosterChange::InvitationStatusChanged { email: e, .. } => e == email,
            RosterChange::MembershipCreated { .. } => false,
        }
    }

    pub fn team_id(&self) -> &str {
        match self {
            RosterChange::InvitationCreated { team_id, .. }
            | RosterChange::InvitationStatusChanged { team_id, .. }
            | RosterChange::MembershipCreated { team_id, .. } => team_id,
        }
    }
}
