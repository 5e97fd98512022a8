//! Category Tree Editor
//!
//! Path-addressed mutations over the in-memory tree. Every operation reports
//! whether it applied, overwrote an existing sibling, or was a no-op; a no-op
//! leaves the tree untouched. The tree is persisted as one whole-file write
//! conditioned on the sha it was loaded at.

use super::node::{CategoryItems, CategoryNode, CategoryTree, NodeData};
use crate::error::StoreError;
use crate::remote::{encode_document, fetch_json, RemoteStore};
use crate::types::Sha;
use serde::Serialize;
use tracing::{debug, info};

const SAVE_MESSAGE: &str = "Update db.json via admin dashboard";

/// Why a tree operation did nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoOpReason {
    /// The path has no labels
    EmptyPath,
    /// The new key is blank
    EmptyKey,
    /// An intermediate label does not resolve to a node with children
    MissingPath { label: String },
    /// The parent resolves but has no entry for the final label
    MissingNode,
    /// The rename target equals the current key
    Unchanged,
}

/// Outcome of a tree operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TreeEdit {
    Applied,
    /// Applied, replacing the existing entry `key`
    Overwrote { key: String },
    NoOp(NoOpReason),
}

impl TreeEdit {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, TreeEdit::NoOp(_))
    }
}

/// Outcome of a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved { sha: Sha },
    /// Remote content already matches the in-memory tree
    Unchanged,
}

/// In-memory category tree plus the sha it was read at.
#[derive(Debug, Clone, Default)]
pub struct CategoryTreeEditor {
    tree: CategoryTree,
    base_sha: Option<Sha>,
    dirty: bool,
}

fn parent_items_mut<'a>(
    roots: &'a mut CategoryItems,
    parent: &[String],
) -> Result<&'a mut CategoryItems, NoOpReason> {
    let mut current = roots;
    for label in parent {
        current = match current.get_mut(label).and_then(|node| node.items.as_mut()) {
            Some(items) => items,
            None => {
                return Err(NoOpReason::MissingPath {
                    label: label.clone(),
                })
            }
        };
    }
    Ok(current)
}

impl CategoryTreeEditor {
    pub fn new(tree: CategoryTree, base_sha: Option<Sha>) -> Self {
        Self {
            tree,
            base_sha,
            dirty: false,
        }
    }

    /// Read the tree document and remember its sha. An absent document is an
    /// empty tree with no base sha.
    pub async fn load(store: &dyn RemoteStore, path: &str) -> Result<Self, StoreError> {
        let editor = match fetch_json::<CategoryTree>(store, path).await? {
            Some((tree, sha)) => Self::new(tree, Some(sha)),
            None => Self::default(),
        };
        debug!(path, base_sha = ?editor.base_sha, "loaded category tree");
        Ok(editor)
    }

    /// Rebuild an editor from persisted local state.
    pub(crate) fn restore(tree: CategoryTree, base_sha: Option<Sha>, dirty: bool) -> Self {
        Self {
            tree,
            base_sha,
            dirty,
        }
    }

    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    pub fn base_sha(&self) -> Option<&str> {
        self.base_sha.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn track(&mut self, edit: TreeEdit) -> TreeEdit {
        if edit.is_mutation() {
            self.dirty = true;
        }
        edit
    }

    /// Replace the node at `path` entirely; children absent from `node` are dropped.
    pub fn edit(&mut self, path: &[String], node: CategoryNode) -> TreeEdit {
        let Some((last, parent)) = path.split_last() else {
            return TreeEdit::NoOp(NoOpReason::EmptyPath);
        };
        let edit = match parent_items_mut(&mut self.tree.roots, parent) {
            Err(reason) => TreeEdit::NoOp(reason),
            Ok(items) => match items.get_mut(last) {
                Some(slot) => {
                    *slot = node;
                    TreeEdit::Applied
                }
                None => TreeEdit::NoOp(NoOpReason::MissingNode),
            },
        };
        self.track(edit)
    }

    /// Change the key of the node at `path`, keeping its subtree and position.
    /// An existing sibling named `new_key` is replaced.
    pub fn rename_key(&mut self, path: &[String], new_key: &str) -> TreeEdit {
        let Some((last, parent)) = path.split_last() else {
            return TreeEdit::NoOp(NoOpReason::EmptyPath);
        };
        if new_key.trim().is_empty() {
            return TreeEdit::NoOp(NoOpReason::EmptyKey);
        }
        let edit = match parent_items_mut(&mut self.tree.roots, parent) {
            Err(reason) => TreeEdit::NoOp(reason),
            Ok(items) if !items.contains_key(last) => TreeEdit::NoOp(NoOpReason::MissingNode),
            Ok(_) if last == new_key => TreeEdit::NoOp(NoOpReason::Unchanged),
            Ok(items) => {
                let overwrote = items.contains_key(new_key);
                let entries = std::mem::take(items);
                *items = entries
                    .into_iter()
                    .filter(|(key, _)| key != new_key)
                    .map(|(key, node)| {
                        if key == *last {
                            (new_key.to_string(), node)
                        } else {
                            (key, node)
                        }
                    })
                    .collect();
                if overwrote {
                    TreeEdit::Overwrote {
                        key: new_key.to_string(),
                    }
                } else {
                    TreeEdit::Applied
                }
            }
        };
        self.track(edit)
    }

    /// Remove the node at `path` together with its subtree.
    pub fn delete(&mut self, path: &[String]) -> TreeEdit {
        let Some((last, parent)) = path.split_last() else {
            return TreeEdit::NoOp(NoOpReason::EmptyPath);
        };
        let edit = match parent_items_mut(&mut self.tree.roots, parent) {
            Err(reason) => TreeEdit::NoOp(reason),
            Ok(items) => match items.shift_remove(last) {
                Some(_) => TreeEdit::Applied,
                None => TreeEdit::NoOp(NoOpReason::MissingNode),
            },
        };
        self.track(edit)
    }

    /// Insert `key` under `parent_path`, creating missing intermediate nodes.
    /// The new node starts with an empty child map.
    pub fn insert_child(&mut self, parent_path: &[String], key: &str, data: NodeData) -> TreeEdit {
        if key.trim().is_empty() {
            return TreeEdit::NoOp(NoOpReason::EmptyKey);
        }
        let mut current = &mut self.tree.roots;
        for label in parent_path {
            let node = current.entry(label.clone()).or_default();
            current = node.items.get_or_insert_with(CategoryItems::new);
        }
        let edit = match current.insert(key.to_string(), CategoryNode::leaf(data)) {
            Some(_) => TreeEdit::Overwrote {
                key: key.to_string(),
            },
            None => TreeEdit::Applied,
        };
        self.track(edit)
    }

    /// Write the whole tree, conditioned on the sha it was loaded at.
    ///
    /// The current remote sha is re-read first; if it moved since load the save
    /// fails with a conflict and nothing is written.
    pub async fn save(&mut self, store: &dyn RemoteStore, path: &str) -> Result<SaveOutcome, StoreError> {
        let content = encode_document(path, &self.tree)?;
        let current = match store.read_file(path).await {
            Ok(file) => Some(file),
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        let current_sha = current.as_ref().map(|file| file.sha.clone());
        if current_sha != self.base_sha {
            return Err(StoreError::stale_sha(path));
        }
        if current.as_ref().is_some_and(|file| file.content == content) {
            self.dirty = false;
            return Ok(SaveOutcome::Unchanged);
        }

        let receipt = store
            .write_file(path, &content, current_sha.as_deref(), SAVE_MESSAGE)
            .await?;
        info!(path, sha = %receipt.sha, "category tree saved");
        self.base_sha = Some(receipt.sha.clone());
        self.dirty = false;
        Ok(SaveOutcome::Saved { sha: receipt.sha })
    }
}
