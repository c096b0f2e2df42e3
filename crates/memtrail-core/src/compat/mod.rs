//! Compatibility with the older history field naming.
//!
//! Earlier callers talked to the history store with `action`, `prev_value`
//! and `new_value`, reported `is_deleted` as `0`/`1`, and left empty values
//! out of each entry entirely. [`LegacyHistoryAdapter`] accepts those calls
//! and answers in that shape while storing the canonical record.
//!
//! | legacy        | canonical    |
//! |---------------|--------------|
//! | `action`      | `event`      |
//! | `prev_value`  | `old_memory` |
//! | `new_value`   | `new_memory` |
//! | `is_deleted` (0/1) | `is_deleted` (bool) |
//! | (absent)      | `id`, `actor_id`, `role` |

use serde::{Deserialize, Serialize};

use crate::error::MemtrailResult;
use crate::traits::HistorySink;
use crate::types::{parse_timestamp, AppendOptions, HistoryRecord};

/// History entry in the legacy shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyHistoryEntry {
    pub memory_id: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    /// ISO 8601 with an explicit offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub is_deleted: u8,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<HistoryRecord> for LegacyHistoryEntry {
    fn from(record: HistoryRecord) -> Self {
        Self {
            memory_id: record.memory_id,
            action: record.event,
            prev_value: non_empty(record.old_memory),
            new_value: non_empty(record.new_memory),
            created_at: record.created_at.map(|at| at.to_rfc3339()),
            updated_at: record.updated_at.map(|at| at.to_rfc3339()),
            is_deleted: u8::from(record.is_deleted),
        }
    }
}

/// Legacy-style front end over any [`HistorySink`].
pub struct LegacyHistoryAdapter<S> {
    sink: S,
}

impl<S: HistorySink> LegacyHistoryAdapter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// The wrapped sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Record an event using legacy argument names.
    ///
    /// Timestamps are text, as legacy callers pass them; any non-zero
    /// `is_deleted` marks the row deleted.
    #[allow(clippy::too_many_arguments)]
    pub fn add_history(
        &self,
        memory_id: &str,
        prev_value: Option<&str>,
        new_value: Option<&str>,
        action: &str,
        created_at: Option<&str>,
        updated_at: Option<&str>,
        is_deleted: i32,
    ) -> MemtrailResult<()> {
        let options = AppendOptions {
            created_at: created_at.map(parse_timestamp).transpose()?,
            updated_at: updated_at.map(parse_timestamp).transpose()?,
            is_deleted: is_deleted != 0,
            actor_id: None,
            role: None,
        };
        self.sink
            .append_event(memory_id, prev_value, new_value, action, &options)
    }

    /// History for `memory_id` in the legacy shape, oldest first.
    pub fn get_history(&self, memory_id: &str) -> MemtrailResult<Vec<LegacyHistoryEntry>> {
        Ok(self
            .sink
            .get_history(memory_id)?
            .into_iter()
            .map(LegacyHistoryEntry::from)
            .collect())
    }

    pub fn reset(&self) -> MemtrailResult<()> {
        self.sink.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteHistoryStore;
    use crate::testing::RecordingSink;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_legacy_entry_omits_empty_values() {
        let record = HistoryRecord {
            id: "r1".to_string(),
            memory_id: "m1".to_string(),
            old_memory: Some(String::new()),
            new_memory: Some("fact A".to_string()),
            event: "ADD".to_string(),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            updated_at: None,
            is_deleted: false,
            actor_id: Some("u1".to_string()),
            role: None,
        };

        let value = serde_json::to_value(LegacyHistoryEntry::from(record)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "memory_id": "m1",
                "action": "ADD",
                "new_value": "fact A",
                "created_at": "2024-01-01T00:00:00+00:00",
                "is_deleted": 0
            })
        );
    }

    #[test]
    fn test_add_history_maps_onto_canonical_fields() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        let adapter = LegacyHistoryAdapter::new(store);

        adapter
            .add_history(
                "m1",
                Some("old"),
                None,
                "DELETE",
                Some("2024-02-01T10:00:00+00:00"),
                None,
                1,
            )
            .unwrap();

        let record = &adapter.sink().get_history("m1").unwrap()[0];
        assert_eq!(record.event, "DELETE");
        assert_eq!(record.old_memory.as_deref(), Some("old"));
        assert!(record.new_memory.is_none());
        assert!(record.is_deleted);
        assert_eq!(
            record.created_at,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap())
        );

        let legacy = adapter.get_history("m1").unwrap();
        assert_eq!(legacy[0].action, "DELETE");
        assert_eq!(legacy[0].prev_value.as_deref(), Some("old"));
        assert_eq!(legacy[0].is_deleted, 1);
    }

    #[test]
    fn test_add_history_rejects_bad_timestamp_without_writing() {
        let adapter = LegacyHistoryAdapter::new(RecordingSink::new());
        assert!(adapter
            .add_history("m1", None, Some("x"), "ADD", Some("not a date"), None, 0)
            .is_err());
        assert!(adapter.sink().calls().is_empty());
    }

    #[test]
    fn test_reset_forwards() {
        let adapter = LegacyHistoryAdapter::new(RecordingSink::new());
        adapter.reset().unwrap();
        assert_eq!(adapter.sink().resets(), 1);
    }
}
