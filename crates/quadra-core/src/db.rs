//! Persistent roster storage using redb.
//!
//! # Table design
//!
//! ```text
//! invitations            id          -> JSON Invitation
//! memberships            id          -> JSON Membership
//! invitations_by_email   email       => invitation id   (multimap)
//! memberships_by_team    team_id     => membership id   (multimap)
//! ```
//!
//! The two multimap tables are secondary indexes maintained in the same
//! write transaction as the records they point at, so a pending-list lookup
//! is an index hit plus a status filter. Every `WriteBatch` runs in a single
//! write transaction: preconditions are checked against the state inside
//! that transaction, and the transaction is aborted if any operation fails.

use std::path::Path;

use chrono::Utc;
use redb::{
    Database, MultimapTableDefinition, ReadableMultimapTable, ReadableTable, TableDefinition,
    WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::batch::{RosterChange, WriteBatch, WriteOp};
use crate::config::Config;
use crate::error::{store_err, Result, RosterError};
use crate::invitation::Invitation;
use crate::membership::Membership;
use crate::paths::normalize_email;
use crate::store::RosterStore;

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const INVITATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("invitations");
const MEMBERSHIPS: TableDefinition<&str, &[u8]> = TableDefinition::new("memberships");
const INVITATIONS_BY_EMAIL: MultimapTableDefinition<&str, &str> =
    MultimapTableDefinition::new("invitations_by_email");
const MEMBERSHIPS_BY_TEAM: MultimapTableDefinition<&str, &str> =
    MultimapTableDefinition::new("memberships_by_team");

// ---------------------------------------------------------------------------
// Record helpers
// ---------------------------------------------------------------------------

fn read_json<T: DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    key: &str,
) -> Result<Option<T>> {
    match table.get(key).map_err(store_err)? {
        Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
        None => Ok(None),
    }
}

fn write_json<T: Serialize>(
    table: &mut redb::Table<&'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    table.insert(key, bytes.as_slice()).map_err(store_err)?;
    Ok(())
}

fn index_ids(
    index: &impl ReadableMultimapTable<&'static str, &'static str>,
    key: &str,
) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for entry in index.get(key).map_err(store_err)? {
        let guard = entry.map_err(store_err)?;
        ids.push(guard.value().to_string());
    }
    Ok(ids)
}

fn load_all<T: DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    ids: &[String],
) -> Result<Vec<T>> {
    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = read_json(table, id)? {
            records.push(record);
        }
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Batch application
// ---------------------------------------------------------------------------

/// Apply every operation of `batch` to `wt`. Tables are dropped on return so
/// the caller can commit or abort.
fn apply(wt: &WriteTransaction, batch: &WriteBatch) -> Result<Vec<RosterChange>> {
    let mut invitations = wt.open_table(INVITATIONS).map_err(store_err)?;
    let mut memberships = wt.open_table(MEMBERSHIPS).map_err(store_err)?;
    let mut by_email = wt
        .open_multimap_table(INVITATIONS_BY_EMAIL)
        .map_err(store_err)?;
    let mut by_team = wt
        .open_multimap_table(MEMBERSHIPS_BY_TEAM)
        .map_err(store_err)?;

    let mut changes = Vec::with_capacity(batch.len());

    for op in batch.ops() {
        match op {
            WriteOp::InsertInvitation(invitation) => {
                if read_json::<Invitation>(&invitations, &invitation.id)?.is_some() {
                    return Err(RosterError::InvitationExists(invitation.id.clone()));
                }
                let email = normalize_email(&invitation.invited_user_email);

                let same_invitee: Vec<Invitation> =
                    load_all(&invitations, &index_ids(&by_email, &email)?)?;
                if let Some(open) = same_invitee
                    .iter()
                    .find(|other| other.team_id == invitation.team_id && other.is_pending())
                {
                    return Err(RosterError::InvitationExists(open.id.clone()));
                }

                let roster: Vec<Membership> =
                    load_all(&memberships, &index_ids(&by_team, &invitation.team_id)?)?;
                if roster.iter().any(|m| m.email == email) {
                    return Err(RosterError::AlreadyMember {
                        team_id: invitation.team_id.clone(),
                        email,
                    });
                }

                let mut record = invitation.clone();
                record.invited_user_email = email.clone();
                write_json(&mut invitations, &record.id, &record)?;
                by_email
                    .insert(email.as_str(), record.id.as_str())
                    .map_err(store_err)?;

                changes.push(RosterChange::InvitationCreated {
                    id: record.id,
                    team_id: record.team_id,
                    email,
                });
            }

            WriteOp::SetInvitationStatus {
                id,
                expected,
                status,
            } => {
                let mut current: Invitation = read_json(&invitations, id)?
                    .ok_or_else(|| RosterError::InvitationNotFound(id.clone()))?;
                if current.status != *expected || !current.status.can_transition_to(*status) {
                    return Err(RosterError::InvitationNotPending {
                        id: id.clone(),
                        status: current.status,
                    });
                }

                current.status = *status;
                current.updated_at = Utc::now();
                write_json(&mut invitations, &current.id, &current)?;

                changes.push(RosterChange::InvitationStatusChanged {
                    id: current.id,
                    team_id: current.team_id,
                    email: current.invited_user_email,
                    status: *status,
                });
            }

            WriteOp::InsertMembership(membership) => {
                if read_json::<Membership>(&memberships, &membership.id)?.is_some() {
                    return Err(RosterError::Store(format!(
                        "membership id collision: {}",
                        membership.id
                    )));
                }
                write_json(&mut memberships, &membership.id, membership)?;
                by_team
                    .insert(membership.team_id.as_str(), membership.id.as_str())
                    .map_err(store_err)?;

                changes.push(RosterChange::MembershipCreated {
                    id: membership.id.clone(),
                    team_id: membership.team_id.clone(),
                    email: membership.email.clone(),
                });
            }
        }
    }

    Ok(changes)
}

// ---------------------------------------------------------------------------
// RosterDb
// ---------------------------------------------------------------------------

/// redb-backed `RosterStore`.
pub struct RosterDb {
    db: Database,
    changes: broadcast::Sender<RosterChange>,
}

impl RosterDb {
    /// Open or create the database at `path`, creating all tables.
    pub fn open(path: &Path, channel_capacity: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(store_err)?;
        let wt = db.begin_write().map_err(store_err)?;
        {
            wt.open_table(INVITATIONS).map_err(store_err)?;
            wt.open_table(MEMBERSHIPS).map_err(store_err)?;
            wt.open_multimap_table(INVITATIONS_BY_EMAIL)
                .map_err(store_err)?;
            wt.open_multimap_table(MEMBERSHIPS_BY_TEAM)
                .map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;

        let (changes, _) = broadcast::channel(channel_capacity.max(1));
        Ok(Self { db, changes })
    }

    /// Open the database configured for the club at `root`.
    pub fn open_for(root: &Path, config: &Config) -> Result<Self> {
        Self::open(&config.db_path(root), config.channel_capacity())
    }
}

impl RosterStore for RosterDb {
    fn get_invitation(&self, id: &str) -> Result<Option<Invitation>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let invitations = rt.open_table(INVITATIONS).map_err(store_err)?;
        read_json(&invitations, id)
    }

    fn pending_invitations_for(&self, email: &str) -> Result<Vec<Invitation>> {
        let email = normalize_email(email);
        let rt = self.db.begin_read().map_err(store_err)?;
        let invitations = rt.open_table(INVITATIONS).map_err(store_err)?;
        let by_email = rt
            .open_multimap_table(INVITATIONS_BY_EMAIL)
            .map_err(store_err)?;

        let mut pending: Vec<Invitation> = load_all(&invitations, &index_ids(&by_email, &email)?)?;
        pending.retain(Invitation::is_pending);
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(pending)
    }

    fn team_invitations(&self, team_id: &str) -> Result<Vec<Invitation>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let invitations = rt.open_table(INVITATIONS).map_err(store_err)?;

        let mut result = Vec::new();
        for entry in invitations.iter().map_err(store_err)? {
            let (_, v) = entry.map_err(store_err)?;
            let invitation: Invitation = serde_json::from_slice(v.value())?;
            if invitation.team_id == team_id {
                result.push(invitation);
            }
        }
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(result)
    }

    fn team_members(&self, team_id: &str) -> Result<Vec<Membership>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let memberships = rt.open_table(MEMBERSHIPS).map_err(store_err)?;
        let by_team = rt
            .open_multimap_table(MEMBERSHIPS_BY_TEAM)
            .map_err(store_err)?;

        let mut members: Vec<Membership> = load_all(&memberships, &index_ids(&by_team, team_id)?)?;
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        Ok(members)
    }

    fn commit(&self, batch: WriteBatch) -> Result<Vec<RosterChange>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let wt = self.db.begin_write().map_err(store_err)?;
        let changes = match apply(&wt, &batch) {
            Ok(changes) => changes,
            Err(e) => {
                if let Err(abort_err) = wt.abort() {
                    tracing::warn!(error = %abort_err, "failed to abort roster transaction");
                }
                return Err(e);
            }
        };
        wt.commit().map_err(store_err)?;

        // No receivers is fine; the send error only means nobody is listening.
        for change in &changes {
            let _ = self.changes.send(change.clone());
        }
        Ok(changes)
    }

    fn subscribe(&self) -> broadcast::Receiver<RosterChange> {
        self.changes.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
