//! sled-backed session store

use super::SessionStore;
use crate::error::StateError;
use crate::session::SessionSnapshot;
use std::path::Path;
use tracing::debug;

const SESSIONS_TREE: &str = "sessions";

pub struct SledSessionStore {
    db: sled::Db,
    sessions: sled::Tree,
}

impl SledSessionStore {
    /// Open (or create) the database under `dir`.
    pub fn open(dir: &Path) -> Result<Self, StateError> {
        std::fs::create_dir_all(dir)?;
        let db = sled::open(dir)?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, StateError> {
        let sessions = db.open_tree(SESSIONS_TREE)?;
        Ok(Self { db, sessions })
    }

    /// Block until pending writes reach disk.
    pub fn flush(&self) -> Result<(), StateError> {
        self.db.flush()?;
        Ok(())
    }
}

impl SessionStore for SledSessionStore {
    fn load(&self, key: &str) -> Result<Option<SessionSnapshot>, StateError> {
        let Some(bytes) = self.sessions.get(key.as_bytes())? else {
            return Ok(None);
        };
        let snapshot = serde_json::from_slice(&bytes).map_err(|e| StateError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(snapshot))
    }

    fn save(&self, key: &str, snapshot: &SessionSnapshot) -> Result<(), StateError> {
        let bytes = serde_json::to_vec(snapshot).map_err(|e| StateError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.sessions.insert(key.as_bytes(), bytes)?;
        self.flush()?;
        debug!(key, pending = snapshot.ledger.len(), "session state saved");
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<bool, StateError> {
        let existed = self.sessions.remove(key.as_bytes())?.is_some();
        self.flush()?;
        Ok(existed)
    }
}
