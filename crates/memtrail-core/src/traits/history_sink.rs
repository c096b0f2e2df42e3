//! History sink trait.

use async_trait::async_trait;

use crate::error::MemtrailResult;
use crate::types::{AppendOptions, HistoryRecord};

/// Capability the memory manager depends on to keep its audit trail.
///
/// Implementations are write-once, read-many, reset-all: there is no way to
/// change or remove a single event. Calls are blocking; wrap an
/// implementation in [`crate::store::AsyncHistoryStore`] from async code.
pub trait HistorySink: Send + Sync {
    /// Persist one new event with a freshly generated ID.
    ///
    /// `event` is stored as given; only the column length limits apply.
    fn append_event(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        event: &str,
        options: &AppendOptions,
    ) -> MemtrailResult<()>;

    /// All events for `memory_id`, oldest first. Unknown IDs yield an empty vector.
    fn get_history(&self, memory_id: &str) -> MemtrailResult<Vec<HistoryRecord>>;

    /// Delete every event for every memory.
    fn reset(&self) -> MemtrailResult<()>;
}

impl<S: HistorySink + ?Sized> HistorySink for std::sync::Arc<S> {
    fn append_event(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        event: &str,
        options: &AppendOptions,
    ) -> MemtrailResult<()> {
        (**self).append_event(memory_id, old_value, new_value, event, options)
    }

    fn get_history(&self, memory_id: &str) -> MemtrailResult<Vec<HistoryRecord>> {
        (**self).get_history(memory_id)
    }

    fn reset(&self) -> MemtrailResult<()> {
        (**self).reset()
    }
}

impl<S: HistorySink + ?Sized> HistorySink for &S {
    fn append_event(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        event: &str,
        options: &AppendOptions,
    ) -> MemtrailResult<()> {
        (**self).append_event(memory_id, old_value, new_value, event, options)
    }

    fn get_history(&self, memory_id: &str) -> MemtrailResult<Vec<HistoryRecord>> {
        (**self).get_history(memory_id)
    }

    fn reset(&self) -> MemtrailResult<()> {
        (**self).reset()
    }
}

/// Async view of a history sink, for memory managers running on tokio.
#[async_trait]
pub trait AsyncHistorySink: Send + Sync {
    /// See [`HistorySink::append_event`].
    async fn append_event(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        event: &str,
        options: &AppendOptions,
    ) -> MemtrailResult<()>;

    /// See [`HistorySink::get_history`].
    async fn get_history(&self, memory_id: &str) -> MemtrailResult<Vec<HistoryRecord>>;

    /// See [`HistorySink::reset`].
    async fn reset(&self) -> MemtrailResult<()>;
}
