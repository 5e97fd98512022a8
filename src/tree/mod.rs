//! Category taxonomy
//!
//! A labeled tree persisted as one JSON document. Nodes are addressed by the
//! ordered sequence of labels from the root.

pub mod editor;
pub mod node;

pub use editor::{CategoryTreeEditor, NoOpReason, SaveOutcome, TreeEdit};
pub use node::{CategoryItems, CategoryNode, CategoryTree, LinkCollision, NodeData};
