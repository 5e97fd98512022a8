//! Category node types and path resolution

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Child nodes keyed by label, in document order.
pub type CategoryItems = IndexMap<String, CategoryNode>;

/// One node of the category taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<CategoryItems>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Editable fields of a node, without children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub icon: String,
    pub link: String,
}

impl NodeData {
    pub fn new(icon: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            link: link.into(),
        }
    }
}

impl CategoryNode {
    pub fn new(icon: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            link: link.into(),
            ..Self::default()
        }
    }

    /// A fresh node holding `data` and an empty child map.
    pub fn leaf(data: NodeData) -> Self {
        Self {
            icon: data.icon,
            link: data.link,
            items: Some(CategoryItems::new()),
            extra: Map::new(),
        }
    }

    pub fn data(&self) -> NodeData {
        NodeData {
            icon: self.icon.clone(),
            link: self.link.clone(),
        }
    }

    pub fn with_child(mut self, label: impl Into<String>, child: CategoryNode) -> Self {
        self.items
            .get_or_insert_with(CategoryItems::new)
            .insert(label.into(), child);
        self
    }

    pub fn children(&self) -> impl Iterator<Item = (&String, &CategoryNode)> {
        self.items.iter().flat_map(|items| items.iter())
    }
}

/// The whole tree document: root labels mapped to nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
    pub roots: CategoryItems,
}

/// Sibling nodes sharing a `link` slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCollision {
    pub parent: Vec<String>,
    pub link: String,
    pub labels: Vec<String>,
}

impl CategoryTree {
    pub fn new(roots: CategoryItems) -> Self {
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Node at `path`, if every label resolves.
    pub fn resolve(&self, path: &[String]) -> Option<&CategoryNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(first)?;
        for label in rest {
            node = node.items.as_ref()?.get(label)?;
        }
        Some(node)
    }

    /// Node referenced by a resource's category string.
    pub fn find_by_category(&self, category: &str) -> Option<&CategoryNode> {
        self.resolve(&crate::types::parse_category_path(category))
    }

    /// Every node path in depth-first document order.
    pub fn paths(&self) -> Vec<Vec<String>> {
        fn walk(items: &CategoryItems, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
            for (label, node) in items {
                prefix.push(label.clone());
                out.push(prefix.clone());
                if let Some(children) = &node.items {
                    walk(children, prefix, out);
                }
                prefix.pop();
            }
        }
        let mut out = Vec::new();
        walk(&self.roots, &mut Vec::new(), &mut out);
        out
    }

    /// Siblings whose `link` slugs collide. Collisions are reported, not rejected.
    pub fn duplicate_links(&self) -> Vec<LinkCollision> {
        fn scan(items: &CategoryItems, parent: &mut Vec<String>, out: &mut Vec<LinkCollision>) {
            let mut by_link: IndexMap<&str, Vec<String>> = IndexMap::new();
            for (label, node) in items {
                if !node.link.is_empty() {
                    by_link.entry(node.link.as_str()).or_default().push(label.clone());
                }
            }
            for (link, labels) in by_link {
                if labels.len() > 1 {
                    out.push(LinkCollision {
                        parent: parent.clone(),
                        link: link.to_string(),
                        labels,
                    });
                }
            }
            for (label, node) in items {
                if let Some(children) = &node.items {
                    parent.push(label.clone());
                    scan(children, parent, out);
                    parent.pop();
                }
            }
        }
        let mut out = Vec::new();
        scan(&self.roots, &mut Vec::new(), &mut out);
        out
    }
}
