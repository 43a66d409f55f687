//! Engine Module
//!
//! The core storage engine that coordinates the memtable and the segment.
//!
//! ## Responsibilities
//! - Route put/get/delete across MemTable and Segment
//! - Trigger a flush when the MemTable is full
//! - Run the flush/merge protocol (sort, merge, dedup, drop tombstones)
//! - Keep the MemTable intact when a flush fails

use std::fmt::Display;
use std::fs;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::memtable::MemTable;
use crate::merge::{append_keep_newest, dedup_keep_newest, is_sorted_by_key, merge, merge_sort};
use crate::record::Record;
use crate::storage::{FileSegment, SegmentStore};

/// Flush lifecycle of an engine
///
/// A flush runs entirely under the engine write lock, so `flush_state()`
/// only ever reports `Idle`; `Flushing` is asserted against re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Idle,
    Flushing,
}

/// State guarded by the engine lock
struct EngineInner<K, V> {
    memtable: MemTable<K, V>,
    state: FlushState,
}

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete/flush): exclusive `inner` write lock for the
///   whole operation, including any segment rewrite
/// - **Reads** (get): shared `inner` read lock, held across the segment
///   load so a get never observes a half-finished flush
///
/// Nothing runs in the background: every segment write has completed (or
/// failed) before the call that caused it returns.
pub struct Engine<K, V, S> {
    /// Engine configuration
    config: Config,

    /// Persisted segment
    store: S,

    /// MemTable + flush state
    inner: RwLock<EngineInner<K, V>>,
}

impl<K, V> Engine<K, V, FileSegment<K, V>>
where
    K: Ord + Clone + Display + FromStr + Serialize + DeserializeOwned,
    V: Clone + Display + FromStr + Serialize + DeserializeOwned,
{
    /// Open an engine over the segment file at `config.segment_path`
    ///
    /// Creates the parent directory if needed. An absent segment file is an
    /// empty segment.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.segment_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = FileSegment::new(&config.segment_path, config.segment_format);
        Self::with_store(config, store)
    }
}

impl<K, V, S> Engine<K, V, S>
where
    K: Ord + Clone,
    V: Clone,
    S: SegmentStore<K, V>,
{
    /// Create an engine over any segment store
    pub fn with_store(config: Config, store: S) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            "Engine opened: buffer_capacity={}, sort_on_flush={}",
            config.buffer_capacity,
            config.sort_on_flush
        );

        let memtable = MemTable::new(config.buffer_capacity);

        Ok(Self {
            config,
            store,
            inner: RwLock::new(EngineInner {
                memtable,
                state: FlushState::Idle,
            }),
        })
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Reject records the segment could not persist
    /// 2. Acquire write lock
    /// 3. Flush first if the MemTable is full (abort on failure)
    /// 4. Append to MemTable
    pub fn put(&self, key: K, value: V) -> Result<()> {
        let record = Record::new(key, value);
        self.store.check_record(&record)?;

        let mut inner = self.inner.write();

        if inner.memtable.is_full() {
            tracing::debug!(
                "MemTable full ({} records, {} tombstones), flushing before put",
                inner.memtable.len(),
                inner.memtable.tombstone_count()
            );
            self.flush_internal(&mut inner)?;
        }

        inner.memtable.append(record)
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent write wins)
    /// 2. Pending tombstone (deleted, not yet flushed)
    /// 3. Segment (first match)
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        let inner = self.inner.read();

        if let Some(record) = inner.memtable.find(key) {
            return Ok(Some(record.value.clone()));
        }

        if inner.memtable.is_tombstoned(key) {
            return Ok(None);
        }

        let segment = self.store.load_all()?;
        Ok(segment
            .into_iter()
            .find(|r| &r.key == key)
            .map(|r| r.value))
    }

    /// Delete a key
    ///
    /// Buffered versions are dropped and a tombstone keeps any older copy on
    /// disk from resurfacing. Otherwise the segment is filtered by key and
    /// rewritten if it held the key.
    ///
    /// Returns whether anything was removed.
    pub fn delete(&self, key: &K) -> Result<bool> {
        let mut inner = self.inner.write();

        let mut removed_from_memtable = false;
        while inner.memtable.remove(key) {
            removed_from_memtable = true;
        }

        if removed_from_memtable {
            inner.memtable.tombstone(key.clone());
            return Ok(true);
        }

        if inner.memtable.is_tombstoned(key) {
            return Ok(false);
        }

        let mut segment = self.store.load_all()?;
        let before = segment.len();
        segment.retain(|r| &r.key != key);

        if segment.len() == before {
            return Ok(false);
        }

        self.store.replace_all(&segment)?;
        tracing::debug!(
            "Deleted key from segment ({} records removed)",
            before - segment.len()
        );

        Ok(true)
    }

    /// Flush memtable to the segment (public API)
    ///
    /// Forces a flush regardless of how full the MemTable is
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.write();
        self.flush_internal(&mut inner)
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self, inner: &mut EngineInner<K, V>) -> Result<()> {
        if !inner.memtable.has_pending_changes() {
            return Ok(());
        }

        debug_assert_eq!(inner.state, FlushState::Idle);
        inner.state = FlushState::Flushing;

        let result = self.merge_into_segment(&inner.memtable);

        inner.state = FlushState::Idle;

        match result {
            Ok(segment_len) => {
                tracing::info!(
                    "Flushed {} records ({} tombstones), segment now holds {} records",
                    inner.memtable.len(),
                    inner.memtable.tombstone_count(),
                    segment_len
                );
                inner.memtable.clear();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Flush failed, MemTable kept: {}", e);
                Err(e)
            }
        }
    }

    /// Merge the MemTable into the segment and persist the result.
    ///
    /// Returns the new segment length. Does not touch the MemTable.
    fn merge_into_segment(&self, memtable: &MemTable<K, V>) -> Result<usize> {
        let buffered = memtable.records().to_vec();
        let segment = self.store.load_all()?;

        let merged = if self.config.sort_on_flush {
            let buffered = merge_sort(buffered);
            // A segment written with sorting disabled needs ordering first
            let segment = if is_sorted_by_key(&segment) {
                segment
            } else {
                merge_sort(segment)
            };
            dedup_keep_newest(merge(segment, buffered))
        } else {
            append_keep_newest(segment, buffered)
        };

        let merged: Vec<Record<K, V>> = merged
            .into_iter()
            .filter(|r| !memtable.is_tombstoned(&r.key))
            .collect();

        self.store.replace_all(&merged)?;

        Ok(merged.len())
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data
    pub fn close(self) -> Result<()> {
        let mut inner = self.inner.write();
        self.flush_internal(&mut inner)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Copy of the buffered records in append order
    pub fn buffered_records(&self) -> Vec<Record<K, V>> {
        self.inner.read().memtable.records().to_vec()
    }

    /// Current segment contents, loaded from the store
    pub fn segment_records(&self) -> Result<Vec<Record<K, V>>> {
        let _inner = self.inner.read();
        self.store.load_all()
    }

    /// Get the memtable record count
    pub fn memtable_len(&self) -> usize {
        self.inner.read().memtable.len()
    }

    /// Get the number of pending tombstones
    pub fn tombstone_count(&self) -> usize {
        self.inner.read().memtable.tombstone_count()
    }

    /// Get the flush state
    pub fn flush_state(&self) -> FlushState {
        self.inner.read().state
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the segment store
    pub fn store(&self) -> &S {
        &self.store
    }
}
