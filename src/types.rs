//! Core types shared across the catalog sync engine.

/// ResourceId: opaque, client-minted resource identifier (UUID v4 text form)
pub type ResourceId = String;

/// Sha: revision hash of a remote file, used as an optimistic-concurrency token
pub type Sha = String;

/// Timestamp: milliseconds since the Unix epoch
pub type EpochMillis = i64;

/// Separator joining category labels in `Resource::category`
pub const CATEGORY_SEPARATOR: &str = " > ";

/// Current time in epoch milliseconds.
pub fn now_millis() -> EpochMillis {
    chrono::Utc::now().timestamp_millis()
}

/// Split a category string (`"A > B > C"`) into a label path.
pub fn parse_category_path(category: &str) -> Vec<String> {
    category
        .split('>')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join a label path into a category string.
pub fn join_category_path(path: &[String]) -> String {
    path.join(CATEGORY_SEPARATOR)
}
