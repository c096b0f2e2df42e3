//! Caller-side recording of memory mutations.
//!
//! [`HistoryRecorder`] is what a memory manager holds instead of a concrete
//! store. It stamps timestamps, attaches the acting identity and checks input
//! before anything reaches the sink, which itself stays permissive.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{MemtrailError, MemtrailResult};
use crate::traits::HistorySink;
use crate::types::{limits, AppendOptions, EventKind, HistoryRecord};

/// Records add/update/delete events for memories against a shared sink.
#[derive(Clone)]
pub struct HistoryRecorder {
    sink: Arc<dyn HistorySink>,
    actor_id: Option<String>,
    role: Option<String>,
}

impl HistoryRecorder {
    /// Create a recorder with no acting identity.
    pub fn new(sink: Arc<dyn HistorySink>) -> Self {
        Self {
            sink,
            actor_id: None,
            role: None,
        }
    }

    /// Attach an actor ID and role to every event recorded from now on.
    pub fn with_actor(
        mut self,
        actor_id: Option<impl Into<String>>,
        role: Option<impl Into<String>>,
    ) -> MemtrailResult<Self> {
        let actor_id = actor_id.map(Into::into);
        let role = role.map(Into::into);
        if let Some(actor_id) = &actor_id {
            check_len("actor_id", actor_id, limits::ACTOR_ID)?;
        }
        if let Some(role) = &role {
            check_len("role", role, limits::ROLE)?;
        }
        self.actor_id = actor_id;
        self.role = role;
        Ok(self)
    }

    /// The sink events are written to.
    pub fn sink(&self) -> &Arc<dyn HistorySink> {
        &self.sink
    }

    /// Record creation of a memory, stamped now.
    pub fn record_add(&self, memory_id: &str, new_value: &str) -> MemtrailResult<()> {
        let options = self.options().with_created_at(Utc::now());
        self.record(memory_id, None, Some(new_value), EventKind::Add, options)
    }

    /// Record a text change, keeping the memory's original creation time.
    pub fn record_update(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        new_value: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> MemtrailResult<()> {
        let mut options = self.options().with_updated_at(Utc::now());
        options.created_at = created_at;
        self.record(memory_id, old_value, Some(new_value), EventKind::Update, options)
    }

    /// Record removal of a memory, keeping its original creation time.
    /// The row is flagged as deleted.
    pub fn record_delete(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        created_at: Option<DateTime<Utc>>,
    ) -> MemtrailResult<()> {
        let mut options = self
            .options()
            .with_updated_at(Utc::now())
            .with_is_deleted(true);
        options.created_at = created_at;
        self.record(memory_id, old_value, None, EventKind::Delete, options)
    }

    /// Record an event described by its stored name.
    ///
    /// Names outside `ADD`, `UPDATE` and `DELETE` are rejected here even though
    /// the store would accept them.
    pub fn record_named(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        event: &str,
        options: AppendOptions,
    ) -> MemtrailResult<()> {
        let kind = EventKind::parse(event).ok_or_else(|| {
            MemtrailError::validation(format!(
                "unknown event '{}', expected ADD, UPDATE or DELETE",
                event
            ))
        })?;
        self.record(memory_id, old_value, new_value, kind, options)
    }

    /// History for a memory, oldest first.
    pub fn history(&self, memory_id: &str) -> MemtrailResult<Vec<HistoryRecord>> {
        self.sink.get_history(memory_id)
    }

    /// Clear all history. Callers must ensure nothing else is writing.
    pub fn reset(&self) -> MemtrailResult<()> {
        self.sink.reset()
    }

    fn options(&self) -> AppendOptions {
        AppendOptions {
            actor_id: self.actor_id.clone(),
            role: self.role.clone(),
            ..AppendOptions::default()
        }
    }

    fn record(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        kind: EventKind,
        options: AppendOptions,
    ) -> MemtrailResult<()> {
        if memory_id.is_empty() {
            return Err(MemtrailError::missing_field("memory_id"));
        }
        check_len("memory_id", memory_id, limits::MEMORY_ID)?;
        if let Some(actor_id) = &options.actor_id {
            check_len("actor_id", actor_id, limits::ACTOR_ID)?;
        }
        if let Some(role) = &options.role {
            check_len("role", role, limits::ROLE)?;
        }

        self.sink
            .append_event(memory_id, old_value, new_value, kind.as_str(), &options)
    }
}

// Column limits count characters, not bytes.
fn check_len(field: &str, value: &str, max: usize) -> MemtrailResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(MemtrailError::too_long(field, max, len));
    }
    Ok(())
}
