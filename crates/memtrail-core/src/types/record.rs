//! History record and the values that describe an append or a listing.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{MemtrailError, MemtrailResult};

/// Column length limits, mirrored by the table's CHECK constraints.
pub mod limits {
    /// `memory_id`: UUID-style external identifier.
    pub const MEMORY_ID: usize = 36;
    /// `event`.
    pub const EVENT: usize = 10;
    /// `actor_id`: UUID-style identifier.
    pub const ACTOR_ID: usize = 36;
    /// `role`.
    pub const ROLE: usize = 50;
}

/// One immutable audit row describing a single mutation of a memory.
///
/// Serializes with every key present; absent values become `null`.
/// Deserialization also accepts the older `action` / `prev_value` /
/// `new_value` key names and a `0`/`1` deletion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Record ID.
    pub id: String,
    /// Memory ID this record refers to.
    pub memory_id: String,
    /// Memory content before the event.
    #[serde(default, alias = "prev_value")]
    pub old_memory: Option<String>,
    /// Memory content after the event.
    #[serde(default, alias = "new_value")]
    pub new_memory: Option<String>,
    /// Event type, normally `ADD`, `UPDATE` or `DELETE`.
    #[serde(alias = "action")]
    pub event: String,
    /// Creation timestamp supplied by the caller.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Update timestamp supplied by the caller.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-delete marker on the audit row itself.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_deleted: bool,
    /// Actor who made the change.
    #[serde(default)]
    pub actor_id: Option<String>,
    /// Role of the actor.
    #[serde(default)]
    pub role: Option<String>,
}

/// Optional values attached to an appended event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendOptions {
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub actor_id: Option<String>,
    pub role: Option<String>,
}

impl AppendOptions {
    /// Create empty options: no timestamps, not deleted, no actor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the creation timestamp.
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Set the update timestamp.
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Mark the row as soft-deleted.
    pub fn with_is_deleted(mut self, is_deleted: bool) -> Self {
        self.is_deleted = is_deleted;
        self
    }

    /// Set the actor ID.
    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Set the actor role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// Filter for administrative listings across all memories.
///
/// Every criterion is optional; an empty query matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Exact event string.
    pub event: Option<String>,
    /// Soft-delete flag.
    pub is_deleted: Option<bool>,
    /// Case-insensitive substring over memory ID and both values.
    pub search: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
    /// Maximum rows returned.
    pub limit: Option<usize>,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn is_deleted(mut self, is_deleted: bool) -> Self {
        self.is_deleted = Some(is_deleted);
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn created_after(mut self, at: DateTime<Utc>) -> Self {
        self.created_after = Some(at);
        self
    }

    pub fn created_before(mut self, at: DateTime<Utc>) -> Self {
        self.created_before = Some(at);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Render a timestamp for storage.
///
/// Fixed precision and a `Z` suffix keep text order equal to time order,
/// which the ORDER BY clauses rely on.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 with any offset, plus SQLite's own
/// `YYYY-MM-DD HH:MM:SS[.fff]` form, read as UTC.
pub fn parse_timestamp(value: &str) -> MemtrailResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| MemtrailError::parse(format!("invalid timestamp '{}': {}", value, e)))
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> HistoryRecord {
        HistoryRecord {
            id: "b1c0".to_string(),
            memory_id: "m1".to_string(),
            old_memory: None,
            new_memory: Some("fact A".to_string()),
            event: "ADD".to_string(),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
            updated_at: None,
            is_deleted: false,
            actor_id: None,
            role: None,
        }
    }

    #[test]
    fn test_serializes_every_key() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "id",
            "memory_id",
            "old_memory",
            "new_memory",
            "event",
            "created_at",
            "updated_at",
            "is_deleted",
            "actor_id",
            "role",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert_eq!(obj.len(), 10);
        assert!(obj["old_memory"].is_null());
        assert!(obj["updated_at"].is_null());
        assert_eq!(obj["is_deleted"], serde_json::json!(false));
        assert_eq!(obj["created_at"], serde_json::json!("2024-01-01T12:00:00Z"));
    }

    #[test]
    fn test_deserializes_legacy_keys() {
        let record: HistoryRecord = serde_json::from_value(serde_json::json!({
            "id": "x",
            "memory_id": "m1",
            "prev_value": "before",
            "new_value": "after",
            "action": "UPDATE",
            "is_deleted": 1
        }))
        .unwrap();

        assert_eq!(record.old_memory.as_deref(), Some("before"));
        assert_eq!(record.new_memory.as_deref(), Some("after"));
        assert_eq!(record.event, "UPDATE");
        assert!(record.is_deleted);
        assert!(record.created_at.is_none());
        assert!(record.actor_id.is_none());
    }

    #[test]
    fn test_timestamp_format_sorts_as_text() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert!(format_timestamp(&early) < format_timestamp(&late));
        assert_eq!(format_timestamp(&early), "2024-01-01T09:00:00.000000Z");
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-05T08:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-05T10:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-05 08:30:00").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_append_options_builder() {
        let opts = AppendOptions::new()
            .with_actor_id("u1")
            .with_role("admin")
            .with_is_deleted(true);
        assert_eq!(opts.actor_id.as_deref(), Some("u1"));
        assert_eq!(opts.role.as_deref(), Some("admin"));
        assert!(opts.is_deleted);
        assert!(opts.created_at.is_none());
    }
}
