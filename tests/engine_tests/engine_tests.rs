//! Tests for Engine
//!
//! These tests verify:
//! - Basic get/put/delete operations
//! - Flush triggering at capacity
//! - Last-writer-wins across tiers
//! - Delete visibility before and after flushes
//! - No data loss when the segment store fails
//! - Sorted and unsorted segment layouts
//! - File-backed persistence across reopen
//! - Concurrent gets alongside a writer

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use lsmkv::{
    Config, Engine, FileSegment, FlushState, LsmError, MemorySegment, Record, SegmentFormat,
    SegmentStore,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// In-memory store with switchable failures
#[derive(Default)]
struct FaultyStore {
    inner: MemorySegment<i64, i64>,
    fail_load: AtomicBool,
    fail_replace: AtomicBool,
    replace_calls: AtomicUsize,
}

impl FaultyStore {
    fn with_records(records: Vec<Record<i64, i64>>) -> Self {
        Self {
            inner: MemorySegment::with_records(records),
            ..Self::default()
        }
    }

    fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    fn set_fail_replace(&self, fail: bool) {
        self.fail_replace.store(fail, Ordering::SeqCst);
    }

    fn replace_calls(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }

    fn contents(&self) -> Vec<(i64, i64)> {
        self.inner.snapshot().iter().map(|r| (r.key, r.value)).collect()
    }
}

impl SegmentStore<i64, i64> for FaultyStore {
    fn load_all(&self) -> lsmkv::Result<Vec<Record<i64, i64>>> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "injected load failure").into());
        }
        self.inner.load_all()
    }

    fn replace_all(&self, records: &[Record<i64, i64>]) -> lsmkv::Result<()> {
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(
                std::io::Error::new(std::io::ErrorKind::Other, "injected replace failure").into(),
            );
        }
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.replace_all(records)
    }
}

fn setup_engine(capacity: usize, sort_on_flush: bool) -> Engine<i64, i64, FaultyStore> {
    let config = Config::builder()
        .buffer_capacity(capacity)
        .sort_on_flush(sort_on_flush)
        .build();
    Engine::with_store(config, FaultyStore::default()).unwrap()
}

fn setup_file_engine(
    temp_dir: &TempDir,
    capacity: usize,
    format: SegmentFormat,
) -> Engine<i64, i64, FileSegment<i64, i64>> {
    let config = Config::builder()
        .segment_path(temp_dir.path().join("data").join("segment.log"))
        .segment_format(format)
        .buffer_capacity(capacity)
        .build();
    Engine::open(config).unwrap()
}

fn pairs(records: &[Record<i64, i64>]) -> Vec<(i64, i64)> {
    records.iter().map(|r| (r.key, r.value)).collect()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_put_get() {
    let engine = setup_engine(4, true);

    engine.put(1, 10).unwrap();

    assert_eq!(engine.get(&1).unwrap(), Some(10));
}

#[test]
fn test_engine_get_nonexistent_key() {
    let engine = setup_engine(4, true);

    assert_eq!(engine.get(&42).unwrap(), None);
}

#[test]
fn test_engine_put_overwrite_in_buffer() {
    let engine = setup_engine(4, true);

    engine.put(1, 10).unwrap();
    engine.put(1, 11).unwrap();

    assert_eq!(engine.get(&1).unwrap(), Some(11));
    assert_eq!(engine.memtable_len(), 2);
}

#[test]
fn test_engine_rejects_zero_capacity() {
    let config = Config::builder().buffer_capacity(0).build();

    let result = Engine::with_store(config, FaultyStore::default());

    assert!(matches!(result, Err(LsmError::Config(_))));
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_reference_scenario() {
    let engine = setup_engine(2, true);

    engine.put(5, 50).unwrap();
    engine.put(3, 30).unwrap();
    assert_eq!(engine.store().replace_calls(), 0);

    engine.put(1, 10).unwrap();

    assert_eq!(engine.store().contents(), vec![(3, 30), (5, 50)]);
    assert_eq!(pairs(&engine.buffered_records()), vec![(1, 10)]);
    assert_eq!(engine.get(&3).unwrap(), Some(30));
    assert_eq!(engine.get(&1).unwrap(), Some(10));

    assert!(engine.delete(&5).unwrap());
    assert_eq!(engine.store().contents(), vec![(3, 30)]);
}

#[test]
fn test_flush_triggers_exactly_past_capacity() {
    let engine = setup_engine(3, true);

    for key in 0..3 {
        engine.put(key, key).unwrap();
    }
    assert_eq!(engine.memtable_len(), 3);
    assert_eq!(engine.store().replace_calls(), 0);

    engine.put(3, 3).unwrap();
    assert_eq!(engine.memtable_len(), 1);
    assert_eq!(engine.store().replace_calls(), 1);

    for key in 4..6 {
        engine.put(key, key).unwrap();
    }
    assert_eq!(engine.memtable_len(), 3);
    assert_eq!(engine.store().replace_calls(), 1);
}

#[test]
fn test_flush_durability_across_many_flushes() {
    let engine = setup_engine(4, true);

    for i in 0..50i64 {
        engine.put(i % 17, i).unwrap();
    }

    for key in 0..17i64 {
        let latest = (0..50i64).filter(|i| i % 17 == key).max().unwrap();
        assert_eq!(engine.get(&key).unwrap(), Some(latest), "key {}", key);
    }

    engine.flush().unwrap();
    let segment = engine.segment_records().unwrap();
    assert_eq!(segment.len(), 17);
    assert!(segment.windows(2).all(|w| w[0].key < w[1].key));
}

#[test]
fn test_last_writer_wins_across_flush() {
    let engine = setup_engine(2, true);

    engine.put(7, 1).unwrap();
    engine.flush().unwrap();
    engine.put(7, 2).unwrap();

    assert_eq!(engine.get(&7).unwrap(), Some(2));

    engine.flush().unwrap();

    assert_eq!(engine.get(&7).unwrap(), Some(2));
    assert_eq!(engine.store().contents(), vec![(7, 2)]);
}

#[test]
fn test_duplicates_in_buffer_flush_newest() {
    let engine = setup_engine(4, true);

    engine.put(2, 1).unwrap();
    engine.put(1, 1).unwrap();
    engine.put(2, 2).unwrap();
    engine.put(2, 3).unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.store().contents(), vec![(1, 1), (2, 3)]);
}

#[test]
fn test_flush_empty_is_noop() {
    let engine = setup_engine(2, true);

    engine.flush().unwrap();

    assert_eq!(engine.store().replace_calls(), 0);
    assert_eq!(engine.flush_state(), FlushState::Idle);
}

#[test]
fn test_unsorted_segment_keeps_append_order() {
    let engine = setup_engine(2, false);

    engine.put(5, 50).unwrap();
    engine.put(3, 30).unwrap();
    engine.put(1, 10).unwrap(); // Flushes [5, 3]
    engine.put(5, 51).unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.store().contents(), vec![(3, 30), (1, 10), (5, 51)]);
    assert_eq!(engine.get(&5).unwrap(), Some(51));
}

#[test]
fn test_sorted_flush_orders_unsorted_segment() {
    let config = Config::builder().buffer_capacity(4).build();
    let store = FaultyStore::with_records(vec![
        Record::new(9, 90),
        Record::new(4, 40),
        Record::new(6, 60),
    ]);
    let engine = Engine::with_store(config, store).unwrap();

    engine.put(4, 41).unwrap();
    engine.put(1, 10).unwrap();
    engine.flush().unwrap();

    assert_eq!(
        engine.store().contents(),
        vec![(1, 10), (4, 41), (6, 60), (9, 90)]
    );
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_from_buffer() {
    let engine = setup_engine(4, true);

    engine.put(1, 10).unwrap();

    assert!(engine.delete(&1).unwrap());
    assert_eq!(engine.get(&1).unwrap(), None);
    assert_eq!(engine.memtable_len(), 0);
}

#[test]
fn test_delete_removes_all_buffered_versions() {
    let engine = setup_engine(4, true);

    engine.put(1, 10).unwrap();
    engine.put(1, 11).unwrap();

    assert!(engine.delete(&1).unwrap());
    assert_eq!(engine.get(&1).unwrap(), None);
}

#[test]
fn test_delete_visible_after_flush() {
    let engine = setup_engine(2, true);

    engine.put(1, 10).unwrap();
    engine.delete(&1).unwrap();
    engine.put(2, 20).unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.get(&1).unwrap(), None);
    assert_eq!(engine.store().contents(), vec![(2, 20)]);
}

#[test]
fn test_delete_hides_stale_copy_on_disk() {
    let engine = setup_engine(2, true);

    engine.put(7, 1).unwrap();
    engine.flush().unwrap();
    engine.put(7, 2).unwrap();

    assert!(engine.delete(&7).unwrap());
    assert_eq!(engine.tombstone_count(), 1);
    assert_eq!(engine.get(&7).unwrap(), None);

    engine.flush().unwrap();

    assert_eq!(engine.get(&7).unwrap(), None);
    assert!(engine.store().contents().is_empty());
    assert_eq!(engine.tombstone_count(), 0);
}

#[test]
fn test_delete_tombstoned_key_again_returns_false() {
    let engine = setup_engine(2, true);

    engine.put(7, 1).unwrap();
    engine.flush().unwrap();
    engine.put(7, 2).unwrap();
    engine.delete(&7).unwrap();
    let calls = engine.store().replace_calls();

    assert!(!engine.delete(&7).unwrap());
    assert_eq!(engine.store().replace_calls(), calls);
}

#[test]
fn test_put_after_delete_supersedes_tombstone() {
    let engine = setup_engine(2, true);

    engine.put(7, 1).unwrap();
    engine.flush().unwrap();
    engine.put(7, 2).unwrap();
    engine.delete(&7).unwrap();
    engine.put(7, 3).unwrap();

    assert_eq!(engine.get(&7).unwrap(), Some(3));
    engine.flush().unwrap();
    assert_eq!(engine.store().contents(), vec![(7, 3)]);
}

#[test]
fn test_delete_from_segment() {
    let engine = setup_engine(2, true);

    engine.put(1, 10).unwrap();
    engine.put(2, 20).unwrap();
    engine.flush().unwrap();

    assert!(engine.delete(&1).unwrap());
    assert_eq!(engine.store().contents(), vec![(2, 20)]);
    assert_eq!(engine.get(&1).unwrap(), None);
    assert!(!engine.delete(&1).unwrap());
}

#[test]
fn test_delete_nonexistent_key_does_not_write() {
    let engine = setup_engine(2, true);
    engine.put(1, 10).unwrap();
    engine.flush().unwrap();
    let calls = engine.store().replace_calls();

    assert!(!engine.delete(&99).unwrap());
    assert_eq!(engine.store().replace_calls(), calls);
}

#[test]
fn test_put_delete_cycle_stays_bounded() {
    let engine = setup_engine(2, true);

    for key in 0..100i64 {
        engine.put(key, key).unwrap();
        engine.delete(&key).unwrap();
        assert!(engine.memtable_len() + engine.tombstone_count() <= 2, "key {}", key);
    }

    assert!(engine.store().replace_calls() > 0);
    assert!(engine.store().contents().is_empty());
    assert_eq!(engine.get(&42).unwrap(), None);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_failed_replace_keeps_memtable() {
    let engine = setup_engine(2, true);
    engine.put(1, 10).unwrap();
    engine.put(2, 20).unwrap();

    engine.store().set_fail_replace(true);
    let err = engine.put(3, 30).unwrap_err();

    assert!(err.is_io_failure());
    assert_eq!(engine.flush_state(), FlushState::Idle);
    assert_eq!(engine.memtable_len(), 2);
    assert!(engine.store().contents().is_empty());
    assert_eq!(engine.get(&1).unwrap(), Some(10));
    assert_eq!(engine.get(&2).unwrap(), Some(20));
    assert_eq!(engine.get(&3).unwrap(), None);

    engine.store().set_fail_replace(false);
    engine.put(3, 30).unwrap();

    assert_eq!(engine.store().contents(), vec![(1, 10), (2, 20)]);
    assert_eq!(engine.get(&3).unwrap(), Some(30));
}

#[test]
fn test_failed_load_during_flush_keeps_everything() {
    let engine = setup_engine(1, true);
    engine.put(1, 10).unwrap();
    engine.put(2, 20).unwrap(); // Flushes 1

    engine.store().set_fail_load(true);
    assert!(engine.put(3, 30).unwrap_err().is_io_failure());
    assert_eq!(engine.memtable_len(), 1);

    engine.store().set_fail_load(false);
    assert_eq!(engine.store().contents(), vec![(1, 10)]);
    assert_eq!(engine.get(&1).unwrap(), Some(10));
    assert_eq!(engine.get(&2).unwrap(), Some(20));
}

#[test]
fn test_failed_tombstone_flush_keeps_delete_pending() {
    let engine = setup_engine(2, true);
    engine.put(7, 1).unwrap();
    engine.flush().unwrap();
    engine.put(7, 2).unwrap();
    engine.delete(&7).unwrap();

    engine.store().set_fail_replace(true);
    assert!(engine.flush().is_err());

    assert_eq!(engine.tombstone_count(), 1);
    assert_eq!(engine.get(&7).unwrap(), None);
}

#[test]
fn test_get_surfaces_segment_failure() {
    let engine = setup_engine(2, true);
    engine.put(1, 10).unwrap();

    engine.store().set_fail_load(true);

    // Buffered keys never touch the segment
    assert_eq!(engine.get(&1).unwrap(), Some(10));
    assert!(engine.get(&2).unwrap_err().is_io_failure());
}

#[test]
fn test_delete_surfaces_segment_failure() {
    let engine = setup_engine(2, true);
    engine.put(1, 10).unwrap();
    engine.put(2, 20).unwrap();
    engine.flush().unwrap();

    engine.store().set_fail_replace(true);
    assert!(engine.delete(&1).unwrap_err().is_io_failure());

    engine.store().set_fail_replace(false);
    assert_eq!(engine.store().contents(), vec![(1, 10), (2, 20)]);
    assert_eq!(engine.get(&1).unwrap(), Some(10));
}

// =============================================================================
// File-Backed Engine Tests
// =============================================================================

#[test]
fn test_open_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();

    let _engine = setup_file_engine(&temp_dir, 4, SegmentFormat::Text);

    assert!(temp_dir.path().join("data").is_dir());
}

#[test]
fn test_open_rejects_empty_path() {
    let config = Config::builder().segment_path("").build();

    let result: lsmkv::Result<Engine<i64, i64, FileSegment<i64, i64>>> = Engine::open(config);

    assert!(matches!(result, Err(LsmError::Config(_))));
}

#[test]
fn test_text_engine_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = setup_file_engine(&temp_dir, 2, SegmentFormat::Text);
        engine.put(5, 50).unwrap();
        engine.put(3, 30).unwrap();
        engine.put(1, 10).unwrap();
        engine.close().unwrap();
    }

    let contents = std::fs::read_to_string(temp_dir.path().join("data/segment.log")).unwrap();
    assert_eq!(contents, "1 10\n3 30\n5 50\n");

    let engine = setup_file_engine(&temp_dir, 2, SegmentFormat::Text);
    assert_eq!(engine.get(&1).unwrap(), Some(10));
    assert_eq!(engine.get(&3).unwrap(), Some(30));
    assert_eq!(engine.get(&5).unwrap(), Some(50));
}

#[test]
fn test_binary_engine_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = setup_file_engine(&temp_dir, 3, SegmentFormat::Binary);
        for i in 0..10 {
            engine.put(i, i * 100).unwrap();
        }
        engine.delete(&4).unwrap();
        engine.close().unwrap();
    }

    let engine = setup_file_engine(&temp_dir, 3, SegmentFormat::Binary);
    assert_eq!(engine.segment_records().unwrap().len(), 9);
    assert_eq!(engine.get(&4).unwrap(), None);
    assert_eq!(engine.get(&9).unwrap(), Some(900));
}

#[test]
fn test_repeated_flushes_do_not_duplicate_segment() {
    let temp_dir = TempDir::new().unwrap();
    let engine = setup_file_engine(&temp_dir, 2, SegmentFormat::Text);

    for round in 0..5 {
        engine.put(1, round).unwrap();
        engine.put(2, round).unwrap();
        engine.flush().unwrap();
    }

    assert_eq!(pairs(&engine.segment_records().unwrap()), vec![(1, 4), (2, 4)]);
}

#[test]
fn test_unencodable_text_record_rejected_at_put() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("segment.log");
    let config = Config::builder()
        .segment_path(&path)
        .segment_format(SegmentFormat::Text)
        .buffer_capacity(1)
        .build();
    let engine: Engine<String, String, FileSegment<String, String>> =
        Engine::open(config).unwrap();

    let err = engine.put("a b".to_string(), "v".to_string()).unwrap_err();
    assert!(matches!(err, LsmError::Serialization(_)));
    let err = engine.put("k".to_string(), "two\nlines".to_string()).unwrap_err();
    assert!(matches!(err, LsmError::Serialization(_)));
    assert_eq!(engine.memtable_len(), 0);

    for key in ["k0", "k1", "k2"] {
        engine.put(key.to_string(), "v".to_string()).unwrap();
    }
    engine.close().unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "k0 v\nk1 v\nk2 v\n"
    );
}

#[test]
fn test_binary_segment_accepts_keys_with_spaces() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .segment_path(temp_dir.path().join("segment.bin"))
        .segment_format(SegmentFormat::Binary)
        .buffer_capacity(1)
        .build();
    let engine: Engine<String, String, FileSegment<String, String>> =
        Engine::open(config).unwrap();

    engine.put("a b".to_string(), "x\ny".to_string()).unwrap();
    engine.put("c".to_string(), "z".to_string()).unwrap();

    assert_eq!(
        engine.get(&"a b".to_string()).unwrap(),
        Some("x\ny".to_string())
    );
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_gets_during_writes() {
    let config = Config::builder().buffer_capacity(8).build();
    let engine = Arc::new(Engine::with_store(config, MemorySegment::new()).unwrap());

    for key in 0..10i64 {
        engine.put(key, key * 10).unwrap();
    }

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..200 {
                    for key in 0..10i64 {
                        assert_eq!(engine.get(&key).unwrap(), Some(key * 10));
                    }
                }
            })
        })
        .collect();

    for key in 100..400i64 {
        engine.put(key, key).unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(engine.get(&399).unwrap(), Some(399));
}
