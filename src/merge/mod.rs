//! Merge Module
//!
//! Ordering and reconciliation of record runs.
//!
//! ## Responsibilities
//! - Stable merge sort of the memtable snapshot before a flush
//! - Two-way merge of the (older) segment run with the (newer) memtable run
//! - Newest-wins collapse of equal-key runs
//! - Append-order reconciliation when sorting is disabled
//!
//! ## Tie-break Rule
//! ```text
//!   older:  (1,a) (3,b)        newer:  (3,c) (4,d)
//!   merge:  (1,a) (3,b) (3,c) (4,d)     <- newer lands after older
//!   dedup:  (1,a) (3,c) (4,d)           <- last of each run wins
//! ```
//!
//! Everything here is pure and synchronous; no I/O.

mod combine;
mod sort;

pub use combine::{append_keep_newest, dedup_keep_newest, merge};
pub use sort::{is_sorted_by_key, merge_sort};
