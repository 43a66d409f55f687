//! MemTable Module
//!
//! Bounded in-memory buffer for recent writes.
//!
//! ## Responsibilities
//! - Hold pending writes in insertion order until the next flush
//! - Refuse appends past capacity (the engine flushes first)
//! - Resolve a key to its most recently appended version
//! - Track tombstones for keys deleted while buffered
//!
//! ## Data Structure Choice
//! A plain `Vec` in append order:
//! - Duplicate keys may coexist; lookups scan newest to oldest
//! - Ordering by key happens at flush time (see `merge`)
//! - Capacity is counted in records plus pending tombstones, not bytes
//!
//! The memtable has no locking of its own; the engine owns it behind its
//! read/write lock.

mod table;

pub use table::MemTable;
