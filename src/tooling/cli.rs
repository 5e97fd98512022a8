//! CLI Tooling
//!
//! Command-line interface over an admin session. Local edits are persisted in
//! the session store between invocations; only `pull`, `sync` and
//! `category save` talk to the remote.

use crate::config::{ConfigLoader, LoggingConfig, SyncConfig};
use crate::error::ApiError;
use crate::format::{
    format_assign_outcomes, format_bucket_text, format_category_tree, format_resource_detail,
    format_resource_table, format_save_outcome, format_stale_entries, format_status_text,
    format_sync_report_text, format_tree_edit,
};
use crate::lists::Bucket;
use crate::remote::{GithubContentsStore, RemoteStore};
use crate::resource::Resource;
use crate::session::AdminSession;
use crate::store::{SessionStore, SledSessionStore};
use crate::tree::{CategoryNode, NodeData, TreeEdit};
use crate::types::parse_category_path;
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// catalog-sync: edit a JSON catalog locally and publish it to a Git-hosted store
#[derive(Parser, Debug)]
#[command(name = "catalog-sync", version)]
#[command(about = "Change tracking and optimistic-concurrency sync for a Git-hosted JSON catalog")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory searched for catalog-sync.toml
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Local session state directory (overrides [state].dir)
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold `--log-*` flags over the configured logging section.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read the catalog from the remote into a fresh local session
    Pull {
        /// Discard local changes that were not synchronized
        #[arg(long)]
        force: bool,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show pending local changes
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create, edit, delete and inspect resources
    Resource {
        #[command(subcommand)]
        command: ResourceCommands,
    },
    /// Curate the recommend/hot/latest/top lists
    List {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Edit the category tree
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Replay pending resource and list changes against the remote
    Sync {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Resource fields settable from flags.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ResourceFields {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,
    /// Category path, e.g. "Movies > Action"
    #[arg(long)]
    pub category: Option<String>,
    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Image URL (repeatable)
    #[arg(long = "image")]
    pub images: Vec<String>,
    #[arg(long)]
    pub link: Option<String>,
    #[arg(long)]
    pub introduction: Option<String>,
    #[arg(long)]
    pub rating: Option<f64>,
    /// Read the full resource document from a JSON file instead
    #[arg(long, conflicts_with_all = ["name", "category", "tags", "images", "link", "introduction", "rating"])]
    pub from_json: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ResourceCommands {
    /// Add a resource under a new uuid
    Add {
        #[command(flatten)]
        fields: ResourceFields,
    },
    /// Edit a resource; flags replace the corresponding fields
    Edit {
        uuid: String,
        #[command(flatten)]
        fields: ResourceFields,
    },
    /// Delete a resource
    Delete { uuid: String },
    /// List resources
    List {
        /// Only resources whose category starts with this path
        #[arg(long)]
        category: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one resource
    Show {
        uuid: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListCommands {
    /// Add resources to a list (duplicates are skipped)
    Assign {
        /// recommend, hot, latest or top
        bucket: String,
        #[arg(required = true)]
        uuids: Vec<String>,
    },
    /// Show a list
    Show {
        bucket: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show list entries whose resource no longer exists
    Stale {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Remove stale list entries
    Prune {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Print the category tree
    Tree {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Insert a category, creating missing parents
    Add {
        key: String,
        /// Parent path, e.g. "Movies > Action" (omit for a root category)
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, default_value = "")]
        icon: String,
        #[arg(long, default_value = "")]
        link: String,
    },
    /// Replace a category's icon and link
    Edit {
        /// Category path, e.g. "Movies > Action"
        path: String,
        #[arg(long, default_value = "")]
        icon: String,
        #[arg(long, default_value = "")]
        link: String,
        /// Keep the existing children instead of dropping them
        #[arg(long)]
        keep_children: bool,
    },
    /// Rename a category in place; an existing sibling with the new key is replaced
    Rename { path: String, new_key: String },
    /// Delete a category and everything below it
    Delete { path: String },
    /// Write the tree to the remote
    Save,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (the token is never shown)
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// CLI context: configuration, remote client and local session store.
pub struct CliContext {
    config: SyncConfig,
    state_dir: Option<PathBuf>,
    remote: Option<Arc<dyn RemoteStore>>,
    state: Mutex<Option<Arc<SledSessionStore>>>,
    interactive: bool,
}

impl CliContext {
    /// Load configuration the way the binary does.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        state_dir: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path).map_err(|e| {
                ApiError::ConfigError(format!(
                    "Failed to load config from {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => ConfigLoader::load(&workspace_root)
                .map_err(|e| ApiError::ConfigError(format!("Failed to load config: {}", e)))?,
        };
        config.validate()?;
        Ok(Self {
            config,
            state_dir,
            remote: None,
            state: Mutex::new(None),
            interactive: true,
        })
    }

    /// Context over an explicit remote; prompts are disabled.
    pub fn with_remote(config: SyncConfig, remote: Arc<dyn RemoteStore>, state_dir: PathBuf) -> Self {
        Self {
            config,
            state_dir: Some(state_dir),
            remote: Some(remote),
            state: Mutex::new(None),
            interactive: false,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn remote(&self) -> Result<Arc<dyn RemoteStore>, ApiError> {
        if let Some(remote) = &self.remote {
            return Ok(remote.clone());
        }
        let client = GithubContentsStore::from_config(&self.config.remote)?;
        Ok(Arc::new(client))
    }

    fn session_key(&self) -> String {
        self.config.remote.slug()
    }

    /// Session store, opened on first use and kept for the context's lifetime.
    fn open_state(&self) -> Result<Arc<SledSessionStore>, ApiError> {
        let mut slot = self.state.lock();
        if let Some(state) = slot.as_ref() {
            return Ok(state.clone());
        }
        let dir = match &self.state_dir {
            Some(dir) => dir.clone(),
            None => self.config.state.resolve_dir(&self.config.remote)?,
        };
        let state = Arc::new(SledSessionStore::open(&dir)?);
        *slot = Some(state.clone());
        Ok(state)
    }

    fn load_session(&self, state: &SledSessionStore) -> Result<AdminSession, ApiError> {
        let snapshot = state.load(&self.session_key())?.ok_or_else(|| {
            ApiError::Validation("No local session; run `catalog-sync pull` first".to_string())
        })?;
        Ok(AdminSession::from_snapshot(
            self.config.layout.clone(),
            self.config.sync.clone(),
            snapshot,
        ))
    }

    fn persist(&self, state: &SledSessionStore, session: &AdminSession) -> Result<(), ApiError> {
        state.save(&self.session_key(), &session.snapshot())?;
        Ok(())
    }

    /// Load, mutate and persist the session in one step.
    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut AdminSession) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let state = self.open_state()?;
        let mut session = self.load_session(&state)?;
        let result = f(&mut session)?;
        self.persist(&state, &session)?;
        Ok(result)
    }

    fn confirm(&self, prompt: &str) -> Result<bool, ApiError> {
        if !self.interactive {
            return Ok(false);
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))
    }

    fn block_on<F: Future>(&self, future: F) -> Result<F::Output, ApiError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ApiError::ConfigError(
                "Cannot run remote operations from within an async runtime".to_string(),
            ));
        }
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))?;
        Ok(rt.block_on(future))
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Pull { force, yes } => self.handle_pull(*force, *yes),
            Commands::Status { format } => {
                let state = self.open_state()?;
                let session = self.load_session(&state)?;
                let status = session.status();
                if format == "json" {
                    to_json(&status)
                } else {
                    Ok(format_status_text(&status, &self.session_key()))
                }
            }
            Commands::Resource { command } => self.handle_resource_command(command),
            Commands::List { command } => self.handle_list_command(command),
            Commands::Category { command } => self.handle_category_command(command),
            Commands::Sync { format } => self.handle_sync(format),
            Commands::Config { command } => match command {
                ConfigCommands::Show { format } => {
                    if format == "json" {
                        to_json(&self.config)
                    } else {
                        toml::to_string_pretty(&self.config).map_err(|e| {
                            ApiError::ConfigError(format!("Failed to render config: {}", e))
                        })
                    }
                }
            },
        }
    }

    fn handle_pull(&self, force: bool, yes: bool) -> Result<String, ApiError> {
        let state = self.open_state()?;
        if let Some(existing) = state.load(&self.session_key())? {
            let existing = AdminSession::from_snapshot(
                self.config.layout.clone(),
                self.config.sync.clone(),
                existing,
            );
            if existing.has_unsynced_changes() {
                if !force {
                    return Err(ApiError::Validation(format!(
                        "Local session has unsynchronized changes ({} pending record(s)); run `sync` / `category save` first or `pull --force` to discard them",
                        existing.ledger().len()
                    )));
                }
                if !yes && !self.confirm("Discard unsynchronized local changes?")? {
                    return Ok("Pull cancelled".to_string());
                }
            }
        }

        let remote = self.remote()?;
        let layout = self.config.layout.clone();
        let options = self.config.sync.clone();
        let session = self.block_on(AdminSession::load(remote.as_ref(), layout, options))??;
        self.persist(&state, &session)?;
        let list_entries: usize = Bucket::ALL
            .iter()
            .map(|&bucket| session.lists().bucket(bucket).len())
            .sum();
        info!(remote = %self.session_key(), resources = session.resources().len(), "pulled catalog");
        Ok(format!(
            "Pulled {} resource(s), {} root category(ies) and {} list entry(ies) from {}",
            session.resources().len(),
            session.categories().tree().roots.len(),
            list_entries,
            self.session_key()
        ))
    }

    fn handle_sync(&self, format: &str) -> Result<String, ApiError> {
        let state = self.open_state()?;
        let mut session = self.load_session(&state)?;
        let remote = self.remote()?;
        let report = self.block_on(session.synchronize(remote))?;
        self.persist(&state, &session)?;

        let rendered = if format == "json" {
            to_json(&report)?
        } else {
            format_sync_report_text(&report)
        };
        if report.is_success() {
            Ok(rendered)
        } else {
            Err(ApiError::SyncIncomplete(rendered))
        }
    }

    fn handle_resource_command(&self, command: &ResourceCommands) -> Result<String, ApiError> {
        match command {
            ResourceCommands::Add { fields } => {
                let resource = build_resource(Resource::default(), fields)?;
                let uuid = self.with_session(|session| session.add_resource(resource))?;
                Ok(format!("Added resource {}", uuid))
            }
            ResourceCommands::Edit { uuid, fields } => {
                self.with_session(|session| {
                    let current = session
                        .resource(uuid)
                        .cloned()
                        .ok_or_else(|| ApiError::ResourceNotFound(uuid.clone()))?;
                    let updated = build_resource(current, fields)?;
                    session.edit_resource(uuid, updated)
                })?;
                Ok(format!("Edited resource {}", uuid))
            }
            ResourceCommands::Delete { uuid } => {
                let removed = self.with_session(|session| session.delete_resource(uuid))?;
                Ok(format!("Deleted resource {} ({})", uuid, removed.name))
            }
            ResourceCommands::List { category, format } => {
                let state = self.open_state()?;
                let session = self.load_session(&state)?;
                let prefix = category.as_deref().map(parse_category_path);
                let matching: Vec<_> = session
                    .resources()
                    .iter()
                    .filter(|(_, r)| match &prefix {
                        Some(prefix) => r.category_path().starts_with(prefix),
                        None => true,
                    })
                    .collect();
                if format == "json" {
                    let map: serde_json::Map<String, Value> = matching
                        .iter()
                        .map(|(uuid, r)| serde_json::to_value(r).map(|v| ((*uuid).clone(), v)))
                        .collect::<Result<_, _>>()
                        .map_err(|e| ApiError::Validation(format!("Failed to render JSON: {}", e)))?;
                    to_json(&map)
                } else {
                    Ok(format_resource_table(matching))
                }
            }
            ResourceCommands::Show { uuid, format } => {
                let state = self.open_state()?;
                let session = self.load_session(&state)?;
                let resource = session
                    .resource(uuid)
                    .ok_or_else(|| ApiError::ResourceNotFound(uuid.clone()))?;
                if format == "json" {
                    to_json(resource)
                } else {
                    Ok(format_resource_detail(uuid, resource))
                }
            }
        }
    }

    fn handle_list_command(&self, command: &ListCommands) -> Result<String, ApiError> {
        match command {
            ListCommands::Assign { bucket, uuids } => {
                let bucket: Bucket = bucket.parse()?;
                let outcomes = self.with_session(|session| session.bulk_assign(bucket, uuids))?;
                Ok(format_assign_outcomes(bucket, &outcomes))
            }
            ListCommands::Show { bucket, format } => {
                let bucket: Bucket = bucket.parse()?;
                let state = self.open_state()?;
                let session = self.load_session(&state)?;
                let entries = session.lists().bucket(bucket);
                if format == "json" {
                    to_json(&entries)
                } else {
                    Ok(format_bucket_text(bucket, entries))
                }
            }
            ListCommands::Stale { format } => {
                let state = self.open_state()?;
                let session = self.load_session(&state)?;
                let stale = session.stale_list_entries();
                if format == "json" {
                    to_json(&stale)
                } else {
                    Ok(format_stale_entries(&stale))
                }
            }
            ListCommands::Prune { yes } => {
                let state = self.open_state()?;
                let mut session = self.load_session(&state)?;
                let stale = session.stale_list_entries();
                if stale.is_empty() {
                    return Ok(format_stale_entries(&stale));
                }
                let prompt = format!("Remove {} stale list entry(ies)?", stale.len());
                if !yes && !self.confirm(&prompt)? {
                    return Ok("Prune cancelled".to_string());
                }
                let pruned = session.prune_stale_list_entries()?;
                self.persist(&state, &session)?;
                Ok(format!(
                    "Pruned {} stale list entry(ies); run `sync` to publish",
                    pruned.len()
                ))
            }
        }
    }

    fn handle_category_command(&self, command: &CategoryCommands) -> Result<String, ApiError> {
        match command {
            CategoryCommands::Tree { format } => {
                let state = self.open_state()?;
                let session = self.load_session(&state)?;
                if format == "json" {
                    to_json(session.categories().tree())
                } else {
                    Ok(format_category_tree(session.categories().tree()))
                }
            }
            CategoryCommands::Add {
                key,
                parent,
                icon,
                link,
            } => {
                let parent = parent.as_deref().map(parse_category_path).unwrap_or_default();
                let data = NodeData::new(icon.clone(), link.clone());
                self.apply_tree_edit(|session| session.categories_mut().insert_child(&parent, key, data))
            }
            CategoryCommands::Edit {
                path,
                icon,
                link,
                keep_children,
            } => {
                let path = parse_category_path(path);
                self.apply_tree_edit(|session| {
                    let mut node = CategoryNode::new(icon.clone(), link.clone());
                    if *keep_children {
                        if let Some(existing) = session.categories().tree().resolve(&path) {
                            node.items = existing.items.clone();
                            node.extra = existing.extra.clone();
                        }
                    }
                    session.categories_mut().edit(&path, node)
                })
            }
            CategoryCommands::Rename { path, new_key } => {
                let path = parse_category_path(path);
                self.apply_tree_edit(|session| session.categories_mut().rename_key(&path, new_key))
            }
            CategoryCommands::Delete { path } => {
                let path = parse_category_path(path);
                self.apply_tree_edit(|session| session.categories_mut().delete(&path))
            }
            CategoryCommands::Save => {
                let state = self.open_state()?;
                let mut session = self.load_session(&state)?;
                let remote = self.remote()?;
                let outcome = self.block_on(session.save_categories(remote.as_ref()))??;
                self.persist(&state, &session)?;
                Ok(format_save_outcome(&outcome))
            }
        }
    }

    fn apply_tree_edit(
        &self,
        f: impl FnOnce(&mut AdminSession) -> TreeEdit,
    ) -> Result<String, ApiError> {
        let edit = self.with_session(|session| Ok(f(session)))?;
        let mut out = format_tree_edit(&edit);
        if edit.is_mutation() {
            out.push_str(" Run `category save` to publish.");
        }
        Ok(out)
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::Validation(format!("Failed to render JSON: {}", e)))
}

fn read_resource_file(path: &Path) -> Result<Resource, ApiError> {
    let bytes = std::fs::read(path).map_err(|e| {
        ApiError::Validation(format!("Failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Validation(format!("Invalid resource JSON in {}: {}", path.display(), e)))
}

/// Apply flag values over `base`, or replace it with `--from-json`.
fn build_resource(base: Resource, fields: &ResourceFields) -> Result<Resource, ApiError> {
    if let Some(path) = &fields.from_json {
        return read_resource_file(path);
    }
    let mut resource = base;
    if let Some(name) = &fields.name {
        resource.name = name.clone();
    }
    if let Some(category) = &fields.category {
        resource.category = crate::types::join_category_path(&parse_category_path(category));
    }
    if !fields.tags.is_empty() {
        resource.tags = fields
            .tags
            .iter()
            .map(|tag| (tag.clone(), Value::Bool(true)))
            .collect();
    }
    if !fields.images.is_empty() {
        resource.images = fields.images.clone();
    }
    if let Some(link) = &fields.link {
        resource.link = Some(link.clone());
    }
    if let Some(introduction) = &fields.introduction {
        resource.introduction = Some(introduction.clone());
    }
    if let Some(rating) = fields.rating {
        resource.rating = Some(rating);
    }
    Ok(resource)
}
