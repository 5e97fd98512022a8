//! CLI harness over an in-memory remote

use catalog_sync::config::SyncConfig;
use catalog_sync::tree::{CategoryNode, CategoryTree};
use catalog_sync::tooling::{Cli, CliContext};
use catalog_sync::{ApiError, InMemoryStore, StoreLayout};
use clap::Parser;
use std::sync::Arc;
use tempfile::TempDir;

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub context: CliContext,
    _state: TempDir,
}

impl Harness {
    /// Remote seeded with `Movies > Action` and `Books`, no local session yet.
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let tree = CategoryTree::new(
            [
                (
                    "Movies".to_string(),
                    CategoryNode::new("", "movies").with_child("Action", CategoryNode::new("", "action")),
                ),
                ("Books".to_string(), CategoryNode::new("", "books")),
            ]
            .into_iter()
            .collect(),
        );
        store.seed_json(&layout().category_tree_path(), &tree);

        let mut config = SyncConfig::default();
        config.remote.owner = "octo".to_string();
        config.remote.repo = "catalog".to_string();
        config.remote.token = Some("secret-token".to_string());
        let state = tempfile::tempdir().unwrap();
        let context = CliContext::with_remote(config, store.clone(), state.path().to_path_buf());
        Self {
            store,
            context,
            _state: state,
        }
    }

    /// Harness with a pulled session.
    pub fn pulled() -> Self {
        let harness = Self::new();
        harness.ok(&["pull"]);
        harness
    }

    pub fn run(&self, args: &[&str]) -> Result<String, ApiError> {
        let argv = std::iter::once("catalog-sync").chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv).unwrap();
        self.context.execute(&cli.command)
    }

    pub fn ok(&self, args: &[&str]) -> String {
        match self.run(args) {
            Ok(output) => output,
            Err(e) => panic!("{:?} failed: {}", args, e),
        }
    }

    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        serde_json::from_str(&self.ok(args)).unwrap()
    }

    /// Add a resource and return its uuid.
    pub fn add_resource(&self, name: &str, category: &str) -> String {
        let output = self.ok(&["resource", "add", "--name", name, "--category", category]);
        output
            .strip_prefix("Added resource ")
            .unwrap()
            .trim()
            .to_string()
    }
}

pub fn layout() -> StoreLayout {
    StoreLayout::default()
}
