use super::{Event, OutputHandler, Record};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Keeps every record in memory. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemoryOutput {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.records().into_iter().map(|r| r.event).collect()
    }
}

#[async_trait]
impl OutputHandler for MemoryOutput {
    async fn write(&mut self, record: &Record) -> Result<()> {
        self.records
            .lock()
            .map_err(|e| crate::error::Error::Internal(e.to_string()))?
            .push(record.clone());
        Ok(())
    }
}
