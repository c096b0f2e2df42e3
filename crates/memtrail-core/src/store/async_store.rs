//! Async adapter over a blocking history sink.
//!
//! Each call runs on tokio's blocking pool so that SQLite I/O never stalls
//! the async runtime.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{MemtrailError, MemtrailResult};
use crate::traits::{AsyncHistorySink, HistorySink};
use crate::types::{AppendOptions, HistoryRecord};

/// Runs a [`HistorySink`] on `spawn_blocking`.
pub struct AsyncHistoryStore<S: ?Sized> {
    inner: Arc<S>,
}

impl<S: ?Sized> Clone for AsyncHistoryStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: HistorySink + ?Sized + 'static> AsyncHistoryStore<S> {
    /// Wrap a shared blocking sink.
    pub fn new(inner: Arc<S>) -> Self {
        Self { inner }
    }

    /// The wrapped blocking sink.
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }
}

async fn run_blocking<T, F>(f: F) -> MemtrailResult<T>
where
    F: FnOnce() -> MemtrailResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MemtrailError::internal(format!("history task failed: {}", e)))?
}

#[async_trait]
impl<S: HistorySink + ?Sized + 'static> AsyncHistorySink for AsyncHistoryStore<S> {
    async fn append_event(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        event: &str,
        options: &AppendOptions,
    ) -> MemtrailResult<()> {
        let inner = Arc::clone(&self.inner);
        let memory_id = memory_id.to_string();
        let old_value = old_value.map(str::to_string);
        let new_value = new_value.map(str::to_string);
        let event = event.to_string();
        let options = options.clone();

        run_blocking(move || {
            inner.append_event(
                &memory_id,
                old_value.as_deref(),
                new_value.as_deref(),
                &event,
                &options,
            )
        })
        .await
    }

    async fn get_history(&self, memory_id: &str) -> MemtrailResult<Vec<HistoryRecord>> {
        let inner = Arc::clone(&self.inner);
        let memory_id = memory_id.to_string();
        run_blocking(move || inner.get_history(&memory_id)).await
    }

    async fn reset(&self) -> MemtrailResult<()> {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || inner.reset()).await
    }
}
