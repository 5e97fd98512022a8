//! Format sync reports, session status, resources, lists and the category tree as text.

use crate::lists::{AssignOutcome, Bucket, StaleEntry};
use crate::resource::{Resource, ResourceSummary};
use crate::session::SessionStatus;
use crate::sync::SyncReport;
use crate::tree::{CategoryItems, CategoryTree, NoOpReason, SaveOutcome, TreeEdit};
use crate::types::{EpochMillis, ResourceId};
use chrono::{TimeZone, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Section heading in bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(header);
    table
}

pub fn format_timestamp(millis: EpochMillis) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(at) if millis > 0 => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        _ => "-".to_string(),
    }
}

/// Sync report: heading, per-file table, then the consolidated summary.
pub fn format_sync_report_text(report: &SyncReport) -> String {
    let mut out = format!("{}\n\n", format_section_heading(report.title()));
    if report.outcomes.is_empty() {
        out.push_str("Nothing to synchronize.\n");
        return out;
    }
    let mut table = new_table(vec!["File", "Operation", "Result", "Detail"]);
    for outcome in &report.outcomes {
        let result = match outcome.error_kind() {
            None => "ok".to_string(),
            Some(kind) => kind.to_string(),
        };
        table.add_row(vec![
            outcome.file.clone(),
            format!("{:?}", outcome.operation).to_lowercase(),
            result,
            outcome.message.clone().unwrap_or_default(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&report.summary());
    if report.conflicts().next().is_some() {
        out.push_str("Conflicting files changed remotely; run `pull` and re-apply.\n");
    }
    out
}

pub fn format_status_text(status: &SessionStatus, remote: &str) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Session Status"));
    out.push_str(&format!("  Remote: {}\n", remote));
    out.push_str(&format!(
        "  Pulled: {}\n",
        status.pulled_at.map(format_timestamp).unwrap_or_else(|| "never".to_string())
    ));
    out.push_str(&format!("  Resources: {}\n\n", status.resources));

    out.push_str(&format!("{}\n\n", format_section_heading("Pending changes")));
    let mut table = new_table(vec!["Kind", "Count"]);
    table.add_row(vec!["add".to_string(), status.pending_adds.to_string()]);
    table.add_row(vec!["edit".to_string(), status.pending_edits.to_string()]);
    table.add_row(vec!["delete".to_string(), status.pending_deletes.to_string()]);
    table.add_row(vec!["bulk".to_string(), status.pending_bulk.to_string()]);
    out.push_str(&format!("{}\n\n", table));

    let yes_no = |b: bool| if b { "yes" } else { "no" };
    out.push_str(&format!("  Unsaved category edits: {}\n", yes_no(status.categories_dirty)));
    out.push_str(&format!("  Unsynced list changes: {}\n", yes_no(status.lists_dirty)));
    if status.stale_list_entries > 0 {
        out.push_str(&format!(
            "  Stale list entries: {} (see `list stale`)\n",
            status.stale_list_entries
        ));
    }
    out
}

pub fn format_resource_table<'a>(
    resources: impl IntoIterator<Item = (&'a ResourceId, &'a Resource)>,
) -> String {
    let mut table = new_table(vec!["UUID", "Name", "Category", "Updated"]);
    let mut rows = 0;
    for (uuid, resource) in resources {
        table.add_row(vec![
            uuid.clone(),
            resource.name.clone(),
            resource.category.clone(),
            format_timestamp(resource.update_time),
        ]);
        rows += 1;
    }
    if rows == 0 {
        return "No resources.\n".to_string();
    }
    format!("{}\n", table)
}

pub fn format_resource_detail(uuid: &str, resource: &Resource) -> String {
    let mut out = format!("{}\n\n", format_section_heading(&resource.name));
    out.push_str(&format!("  UUID: {}\n", uuid));
    out.push_str(&format!("  Category: {}\n", resource.category));
    if !resource.tags.is_empty() {
        let tags: Vec<&str> = resource.tags.keys().map(String::as_str).collect();
        out.push_str(&format!("  Tags: {}\n", tags.join(", ")));
    }
    if let Some(link) = &resource.link {
        out.push_str(&format!("  Link: {}\n", link));
    }
    if let Some(rating) = resource.rating {
        out.push_str(&format!("  Rating: {}\n", rating));
    }
    out.push_str(&format!("  Uploaded: {}\n", format_timestamp(resource.uploaded)));
    out.push_str(&format!("  Updated: {}\n", format_timestamp(resource.update_time)));
    if !resource.source_links.is_empty() {
        out.push('\n');
        let mut table = new_table(vec!["Platform", "Link", "Password", "Size"]);
        for (platform, source) in &resource.source_links {
            table.add_row(vec![
                platform.clone(),
                source.url.clone(),
                source.password.clone().unwrap_or_default(),
                source.size.clone(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }
    out
}

pub fn format_bucket_text(bucket: Bucket, entries: &[ResourceSummary]) -> String {
    let mut out = format!("{}\n\n", format_section_heading(&format!("List: {}", bucket)));
    if entries.is_empty() {
        out.push_str("Empty.\n");
        return out;
    }
    let mut table = new_table(vec!["#", "UUID", "Name"]);
    for (i, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            entry.uuid.clone(),
            entry.resource.name.clone(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_assign_outcomes(bucket: Bucket, outcomes: &[(ResourceId, AssignOutcome)]) -> String {
    let mut out = String::new();
    for (uuid, outcome) in outcomes {
        let line = match outcome {
            AssignOutcome::Inserted => format!("added {} to {}", uuid, bucket),
            AssignOutcome::AlreadyPresent => format!("{} already in {}, skipped", uuid, bucket),
            AssignOutcome::UnknownResource => format!("{} is not a known resource, skipped", uuid),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn format_stale_entries(entries: &[StaleEntry]) -> String {
    if entries.is_empty() {
        return "No stale list entries.\n".to_string();
    }
    let mut table = new_table(vec!["List", "UUID"]);
    for entry in entries {
        table.add_row(vec![entry.bucket.to_string(), entry.uuid.clone()]);
    }
    format!("{}\n", table)
}

/// Indented outline of the tree, one label per line.
pub fn format_category_tree(tree: &CategoryTree) -> String {
    if tree.is_empty() {
        return "No categories.\n".to_string();
    }
    let mut out = String::new();
    write_items(&mut out, &tree.roots, 0);
    out
}

fn write_items(out: &mut String, items: &CategoryItems, depth: usize) {
    for (label, node) in items {
        out.push_str(&"  ".repeat(depth));
        out.push_str(label);
        if !node.link.is_empty() {
            out.push_str(&format!(" ({})", node.link));
        }
        out.push('\n');
        if let Some(children) = &node.items {
            write_items(out, children, depth + 1);
        }
    }
}

pub fn format_tree_edit(edit: &TreeEdit) -> String {
    match edit {
        TreeEdit::Applied => "Applied.".to_string(),
        TreeEdit::Overwrote { key } => format!("Applied; replaced existing entry '{}'.", key),
        TreeEdit::NoOp(reason) => format!("No change: {}.", describe_no_op(reason)),
    }
}

fn describe_no_op(reason: &NoOpReason) -> String {
    match reason {
        NoOpReason::EmptyPath => "empty path".to_string(),
        NoOpReason::EmptyKey => "empty key".to_string(),
        NoOpReason::MissingPath { label } => format!("'{}' does not exist on the path", label),
        NoOpReason::MissingNode => "no such category".to_string(),
        NoOpReason::Unchanged => "key is unchanged".to_string(),
    }
}

pub fn format_save_outcome(outcome: &SaveOutcome) -> String {
    match outcome {
        SaveOutcome::Saved { sha } => format!("Categories saved (sha {}).", short_sha(sha)),
        SaveOutcome::Unchanged => "Categories already up to date.".to_string(),
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
