//! catalog-sync: change tracking and sync for a Git-hosted JSON catalog
//!
//! An admin session edits resources, list buckets and the category tree in
//! memory, buffers resource changes in an append-only ledger, and publishes
//! them as whole-file writes conditioned on each file's revision sha.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod format;
pub mod ledger;
pub mod lists;
pub mod logging;
pub mod remote;
pub mod resource;
pub mod session;
pub mod store;
pub mod sync;
pub mod tooling;
pub mod tree;
pub mod types;

pub use error::{ApiError, StoreError, StoreErrorKind};
pub use ledger::{ChangeLedger, ChangeRecord};
pub use lists::{Bucket, ListBucketCurator};
pub use remote::{GithubContentsStore, InMemoryStore, RemoteStore, StoreLayout};
pub use resource::Resource;
pub use session::AdminSession;
pub use sync::{ResourceSynchronizer, SyncReport};
pub use tree::{CategoryTreeEditor, TreeEdit};
