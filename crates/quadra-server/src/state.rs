use quadra_core::config::Config;
use quadra_core::db::RosterDb;
use quadra_core::store::RosterStore;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub store: Arc<dyn RosterStore>,
    /// uids with a decision currently being committed.
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl AppState {
    pub fn new(root: PathBuf, store: Arc<dyn RosterStore>) -> Self {
        Self {
            root,
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Load the club config under `root` and open its roster database.
    pub fn open(root: PathBuf) -> quadra_core::Result<Self> {
        let config = Config::load(&root)?;
        let store = RosterDb::open_for(&root, &config)?;
        Ok(Self::new(root, Arc::new(store)))
    }

    /// Mark `uid` as deciding. Returns `None` if a decision by the same uid is
    /// already in flight. The mark is cleared when the guard drops.
    ///
    /// Advisory only: the store's pending precondition is what keeps a
    /// duplicate decision from committing.
    pub fn begin_decision(&self, uid: &str) -> Option<InFlightGuard> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(uid.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            set: self.in_flight.clone(),
            uid: uid.to_string(),
        })
    }
}

pub struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    uid: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut set = self.set.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.uid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state() -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let db = RosterDb::open(&dir.path().join("roster.db"), 8).unwrap();
        let state = AppState::new(dir.path().to_path_buf(), Arc::new(db));
        (dir, state)
    }

    #[test]
    fn second_decision_by_same_uid_is_refused_until_first_ends() {
        let (_dir, state) = state();
        let guard = state.begin_decision("u1").unwrap();
        assert!(state.begin_decision("u1").is_none());
        assert!(state.begin_decision("u2").is_some());
        drop(guard);
        assert!(state.begin_decision("u1").is_some());
    }

    #[test]
    fn open_requires_initialized_club() {
        let dir = TempDir::new().unwrap();
        let err = AppState::open(dir.path().to_path_buf()).err().unwrap();
        assert_eq!(err.code(), "not_initialized");
    }
}
