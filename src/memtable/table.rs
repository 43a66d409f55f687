//! MemTable implementation
//!
//! Append-order record buffer with a tombstone set.

use std::collections::BTreeSet;

use crate::error::{LsmError, Result};
use crate::record::Record;

/// In-memory table for recent writes
#[derive(Debug)]
pub struct MemTable<K, V> {
    /// Pending records, oldest first
    records: Vec<Record<K, V>>,

    /// Keys deleted from the buffer whose older copies may still be on disk
    tombstones: BTreeSet<K>,

    /// Max number of records plus tombstones
    capacity: usize,
}

impl<K: Ord, V> MemTable<K, V> {
    /// Create a new empty MemTable holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            tombstones: BTreeSet::new(),
            capacity,
        }
    }

    /// Append a record at the end.
    ///
    /// Fails with `CapacityExceeded` when the buffer is already full. A fresh
    /// write supersedes any pending tombstone for the same key.
    pub fn append(&mut self, record: Record<K, V>) -> Result<()> {
        if self.is_full() {
            return Err(LsmError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        self.tombstones.remove(&record.key);
        self.records.push(record);
        Ok(())
    }

    /// Find the most recently appended record for `key`
    pub fn find(&self, key: &K) -> Option<&Record<K, V>> {
        self.records.iter().rev().find(|r| &r.key == key)
    }

    /// Remove the most recently appended record for `key`.
    ///
    /// Returns whether a record was removed.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.records.iter().rposition(|r| &r.key == key) {
            Some(pos) => {
                self.records.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Mark `key` as deleted so the next flush drops it from the segment
    pub fn tombstone(&mut self, key: K) {
        self.tombstones.insert(key);
    }

    /// Check if `key` has a pending tombstone
    pub fn is_tombstoned(&self, key: &K) -> bool {
        self.tombstones.contains(key)
    }

    /// Clear all records and tombstones (after successful flush)
    pub fn clear(&mut self) {
        self.records.clear();
        self.tombstones.clear();
    }

    /// Pending records in append order
    pub fn records(&self) -> &[Record<K, V>] {
        &self.records
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when the next append would exceed capacity.
    ///
    /// Tombstones occupy capacity like records, so deletes cannot grow the
    /// buffer past its bound between flushes.
    pub fn is_full(&self) -> bool {
        self.records.len() + self.tombstones.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pending tombstones
    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    /// True if a flush would change the segment
    pub fn has_pending_changes(&self) -> bool {
        !self.records.is_empty() || !self.tombstones.is_empty()
    }
}
