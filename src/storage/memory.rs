//! In-memory segment, for embedding and tests.

use parking_lot::Mutex;

use crate::error::Result;
use crate::record::Record;

use super::SegmentStore;

/// Segment held in process memory
#[derive(Debug)]
pub struct MemorySegment<K, V> {
    records: Mutex<Vec<Record<K, V>>>,
}

impl<K: Clone, V: Clone> MemorySegment<K, V> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Start from an existing record set
    pub fn with_records(records: Vec<Record<K, V>>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<Record<K, V>> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl<K, V> Default for MemorySegment<K, V> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }
}

impl<K: Clone, V: Clone> SegmentStore<K, V> for MemorySegment<K, V> {
    fn load_all(&self) -> Result<Vec<Record<K, V>>> {
        Ok(self.snapshot())
    }

    fn replace_all(&self, records: &[Record<K, V>]) -> Result<()> {
        *self.records.lock() = records.to_vec();
        Ok(())
    }
}
