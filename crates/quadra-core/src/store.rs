//! The store trait the transition service and queries depend on.

use tokio::sync::broadcast;

use crate::batch::{RosterChange, WriteBatch};
use crate::error::Result;
use crate::invitation::Invitation;
use crate::membership::Membership;

/// Invitation and membership collections behind one transactional write.
///
/// Emails passed to queries are normalized by the implementation.
pub trait RosterStore: Send + Sync {
    /// Get one invitation by id.
    fn get_invitation(&self, id: &str) -> Result<Option<Invitation>>;

    /// Pending invitations addressed to `email`, oldest first.
    fn pending_invitations_for(&self, email: &str) -> Result<Vec<Invitation>>;

    /// Every invitation issued by a team, any status, oldest first.
    fn team_invitations(&self, team_id: &str) -> Result<Vec<Invitation>>;

    /// Memberships of a team, oldest first.
    fn team_members(&self, team_id: &str) -> Result<Vec<Membership>>;

    /// Apply all operations of `batch` atomically.
    ///
    /// Returns the changes that were committed; on error nothing was written.
    fn commit(&self, batch: WriteBatch) -> Result<Vec<RosterChange>>;

    /// Receive a notification for every committed change.
    fn subscribe(&self) -> broadcast::Receiver<RosterChange>;
}
