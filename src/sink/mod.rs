//! Result sinks: durable destinations for probe records

pub mod file;

pub use file::{FileSink, SinkFormat};

use crate::error::Result;
use crate::types::{Classification, ProbeRecord};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Append-only destination for probe records.
///
/// Must tolerate concurrent `append` calls from every scheduler worker.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn append(&self, record: &ProbeRecord) -> Result<()>;
}

/// Keeps records in memory, in delivery order
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ProbeRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ProbeRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.classification == classification)
            .count()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn append(&self, record: &ProbeRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}
