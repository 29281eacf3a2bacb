use crate::error::Result;
use crate::record::Record;
use tracing::debug;

/// Records waiting for the next block, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingRecords {
    records: Vec<Record>,
}

impl PendingRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers `record` after checking it can be canonically hashed once committed.
    pub fn push(&mut self, record: Record) -> Result<()> {
        record.check_canonical()?;
        self.records.push(record);
        debug!(pending = self.records.len(), "buffered record");
        Ok(())
    }

    /// Empties the buffer, returning everything it held.
    pub fn take(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.records)
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
