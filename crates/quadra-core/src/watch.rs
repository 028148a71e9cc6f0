//! Live query over an invitee's pending invitations.
//!
//! `watch_pending` delivers the current pending set once, then again after
//! every committed change that touches that invitee. The returned
//! `Subscription` stops delivery when cancelled or dropped.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::error::{Result, RosterError};
use crate::invitation::Invitation;
use crate::paths;
use crate::store::RosterStore;

/// Handle to a running live query.
pub struct Subscription {
    email: String,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Stop delivering updates. No callback runs after this returns to the
    /// runtime's next poll of the task.
    pub fn cancel(self) {
        tracing::debug!(email = %self.email, "pending-invitation watch cancelled");
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Watch the pending invitations addressed to `email`.
///
/// Must be called from inside a Tokio runtime. Store reads run on the
/// blocking pool; `on_change` runs on the runtime and should not block.
pub fn watch_pending<F>(
    store: Arc<dyn RosterStore>,
    email: &str,
    mut on_change: F,
) -> Result<Subscription>
where
    F: FnMut(Vec<Invitation>) + Send + 'static,
{
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| RosterError::NoRuntime)?;
    let email = paths::validated_email(email)?;

    // Subscribe before the first read so nothing committed in between is lost.
    let mut changes = store.subscribe();
    let task_email = email.clone();

    let task = runtime.spawn(async move {
        tracing::debug!(email = %task_email, "pending-invitation watch started");
        loop {
            let reader = store.clone();
            let lookup = task_email.clone();
            match tokio::task::spawn_blocking(move || reader.pending_invitations_for(&lookup)).await
            {
                Ok(Ok(pending)) => on_change(pending),
                Ok(Err(e)) => {
                    tracing::warn!(email = %task_email, error = %e, "pending-invitation read failed");
                }
                Err(e) => {
                    tracing::warn!(email = %task_email, error = %e, "pending-invitation read panicked");
                }
            }

            loop {
                match changes.recv().await {
                    Ok(change) if change.concerns_invitee(&task_email) => break,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::debug!(email = %task_email, missed, "watch lagged, re-reading");
                        break;
                    }
                    Err(RecvError::Closed) => return,
                }
            }
        }
    });

    Ok(Subscription { email, task })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RosterDb;
    use crate::decision::decide;
    use crate::identity::Identity;
    use crate::invitation::{issue_invitation, NewInvitation};
    use crate::types::Decision;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    fn open_tmp() -> (TempDir, Arc<RosterDb>) {
        let dir = TempDir::new().unwrap();
        let db = RosterDb::open(&dir.path().join("roster.db"), 16).unwrap();
        (dir, Arc::new(db))
    }

    fn forward() -> (
        impl FnMut(Vec<Invitation>) + Send + 'static,
        mpsc::UnboundedReceiver<Vec<Invitation>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            move |set: Vec<Invitation>| {
                let _ = tx.send(set);
            },
            rx,
        )
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Vec<Invitation>>) -> Vec<Invitation> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for pending set")
            .expect("watch ended")
    }

    #[tokio::test]
    async fn delivers_initial_set_then_updates() {
        let (_dir, db) = open_tmp();
        issue_invitation(
            db.as_ref(),
            NewInvitation::new("teamA", "Tigres", "u1@x.com", "coach").with_id("inv1"),
        )
        .unwrap();

        let (callback, mut rx) = forward();
        let sub = watch_pending(db.clone(), "U1@x.com", callback).unwrap();
        assert_eq!(sub.email(), "u1@x.com");

        let initial = next(&mut rx).await;
        assert_eq!(initial.len(), 1);

        issue_invitation(
            db.as_ref(),
            NewInvitation::new("teamB", "Leões", "u1@x.com", "player").with_id("inv2"),
        )
        .unwrap();
        assert_eq!(next(&mut rx).await.len(), 2);

        decide(
            db.as_ref(),
            &initial[0],
            Decision::Accept,
            &Identity::new("u1", "u1@x.com", "U1"),
        )
        .unwrap();
        let after = next(&mut rx).await;
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, "inv2");

        sub.cancel();
    }

    #[tokio::test]
    async fn ignores_other_invitees() {
        let (_dir, db) = open_tmp();
        let (callback, mut rx) = forward();
        let _sub = watch_pending(db.clone(), "u1@x.com", callback).unwrap();
        assert!(next(&mut rx).await.is_empty());

        issue_invitation(
            db.as_ref(),
            NewInvitation::new("teamA", "Tigres", "u2@x.com", "player"),
        )
        .unwrap();
        let quiet = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(quiet.is_err(), "unexpected update for another invitee");
    }

    #[tokio::test]
    async fn cancelled_watch_stops_delivering() {
        let (_dir, db) = open_tmp();
        let (callback, mut rx) = forward();
        let sub = watch_pending(db.clone(), "u1@x.com", callback).unwrap();
        next(&mut rx).await;

        sub.cancel();
        tokio::task::yield_now().await;

        issue_invitation(
            db.as_ref(),
            NewInvitation::new("teamA", "Tigres", "u1@x.com", "player"),
        )
        .unwrap();
        // Aborting the task drops the callback, which closes the channel.
        let after = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("channel should close after cancel");
        assert!(after.is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_email() {
        let (_dir, db) = open_tmp();
        let (callback, _rx) = forward();
        assert!(matches!(
            watch_pending(db, "nobody", callback),
            Err(RosterError::InvalidEmail(_))
        ));
    }

    #[test]
    fn requires_a_runtime() {
        let (_dir, db) = open_tmp();
        let (callback, _rx) = forward();
        assert!(matches!(
            watch_pending(db, "u1@x.com", callback),
            Err(RosterError::NoRuntime)
        ));
    }
}
