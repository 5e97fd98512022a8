//! Session Store
//!
//! Local persistence of session state between CLI invocations. Pending ledger
//! records, unsaved tree edits and list changes survive until they reach the
//! remote.

pub mod persistence;

pub use persistence::SledSessionStore;

use crate::error::StateError;
use crate::session::SessionSnapshot;

/// Session state keyed by remote repository (`owner/repo`).
pub trait SessionStore {
    fn load(&self, key: &str) -> Result<Option<SessionSnapshot>, StateError>;
    fn save(&self, key: &str, snapshot: &SessionSnapshot) -> Result<(), StateError>;
    /// Returns whether a snapshot existed.
    fn clear(&self, key: &str) -> Result<bool, StateError>;
}
