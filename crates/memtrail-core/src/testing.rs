//! In-process sink double for unit tests.

use std::sync::Mutex;

use crate::error::{MemtrailError, MemtrailResult};
use crate::traits::HistorySink;
use crate::types::{AppendOptions, HistoryRecord};

/// One captured `append_event` call.
#[derive(Debug, Clone)]
pub(crate) struct AppendCall {
    pub memory_id: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub event: String,
    pub options: AppendOptions,
}

/// Captures calls in memory; optionally fails every call with a database error.
#[derive(Default)]
pub(crate) struct RecordingSink {
    calls: Mutex<Vec<AppendCall>>,
    resets: Mutex<usize>,
    failure: Option<&'static str>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &'static str) -> Self {
        Self {
            failure: Some(message),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<AppendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn resets(&self) -> usize {
        *self.resets.lock().unwrap()
    }

    fn check(&self) -> MemtrailResult<()> {
        match self.failure {
            Some(message) => Err(MemtrailError::database(message)),
            None => Ok(()),
        }
    }
}

impl HistorySink for RecordingSink {
    fn append_event(
        &self,
        memory_id: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        event: &str,
        options: &AppendOptions,
    ) -> MemtrailResult<()> {
        self.check()?;
        self.calls.lock().unwrap().push(AppendCall {
            memory_id: memory_id.to_string(),
            old_value: old_value.map(str::to_string),
            new_value: new_value.map(str::to_string),
            event: event.to_string(),
            options: options.clone(),
        });
        Ok(())
    }

    fn get_history(&self, memory_id: &str) -> MemtrailResult<Vec<HistoryRecord>> {
        self.check()?;
        Ok(self
            .calls()
            .into_iter()
            .enumerate()
            .filter(|(_, call)| call.memory_id == memory_id)
            .map(|(i, call)| HistoryRecord {
                id: format!("rec-{}", i),
                memory_id: call.memory_id,
                old_memory: call.old_value,
                new_memory: call.new_value,
                event: call.event,
                created_at: call.options.created_at,
                updated_at: call.options.updated_at,
                is_deleted: call.options.is_deleted,
                actor_id: call.options.actor_id,
                role: call.options.role,
            })
            .collect())
    }

    fn reset(&self) -> MemtrailResult<()> {
        self.check()?;
        self.calls.lock().unwrap().clear();
        *self.resets.lock().unwrap() += 1;
        Ok(())
    }
}
