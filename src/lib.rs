//! # lsmkv
//!
//! A minimal log-structured-merge key-value engine with:
//! - A bounded, append-order MemTable for recent writes
//! - A single segment rewritten atomically on every flush
//! - Last-writer-wins resolution across tiers, with tombstones for deletes
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine                                │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  MemTable   │  flush   │    Merge    │
//!   │  (bounded)  │ ───────► │ sort/dedup  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ replace_all
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Segment   │
//!                           │ (tmp+rename)│
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod record;

pub mod merge;
pub mod memtable;
pub mod storage;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LsmError, Result};
pub use config::{Config, SegmentFormat};
pub use engine::{Engine, FlushState};
pub use record::Record;
pub use storage::{FileSegment, MemorySegment, SegmentStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of lsmkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
