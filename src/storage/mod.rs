//! Storage Module
//!
//! Persistent segment layer behind the `SegmentStore` trait.
//!
//! ## Responsibilities
//! - Load the entire persisted record set
//! - Replace it atomically with a new record set
//! - Own the on-disk encoding (text or binary)
//!
//! ## Replacement Protocol
//! ```text
//!   encode(records) ──► {segment}.tmp ──fsync──► rename ──► {segment}
//!                                                  │
//!                               (unix) fsync parent directory
//! ```
//! A failure before the rename leaves the previous segment untouched and
//! removes the temp file.

mod binary;
mod file;
mod memory;
mod text;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::record::Record;

pub use file::FileSegment;
pub use memory::MemorySegment;

/// The persisted record set consumed by the engine
pub trait SegmentStore<K, V> {
    /// Read every persisted record.
    ///
    /// An absent or empty store yields an empty vector.
    fn load_all(&self) -> Result<Vec<Record<K, V>>>;

    /// Overwrite the persisted set with exactly `records`.
    ///
    /// On failure the previous contents must remain intact.
    fn replace_all(&self, records: &[Record<K, V>]) -> Result<()>;

    /// Reject a record this store could never persist.
    ///
    /// Called before the record enters the memtable, so a bad record fails
    /// its own put instead of every later flush.
    fn check_record(&self, _record: &Record<K, V>) -> Result<()> {
        Ok(())
    }
}

impl<K, V, S: SegmentStore<K, V> + ?Sized> SegmentStore<K, V> for Arc<S> {
    fn load_all(&self) -> Result<Vec<Record<K, V>>> {
        (**self).load_all()
    }

    fn replace_all(&self, records: &[Record<K, V>]) -> Result<()> {
        (**self).replace_all(records)
    }

    fn check_record(&self, record: &Record<K, V>) -> Result<()> {
        (**self).check_record(record)
    }
}

// =============================================================================
// Atomic File Replacement
// =============================================================================

/// Replace the file at `path` with `bytes` via temp file + rename
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = temp_path(path);

    if let Err(e) = write_temp(&tmp_path, bytes).and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    // The new contents are already visible; a failed directory sync only
    // weakens durability of the rename itself.
    #[cfg(unix)]
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            tracing::warn!("Failed to sync directory {}: {}", parent.display(), e);
        }
    }

    Ok(())
}

/// `{path}.tmp`, next to the target so the rename stays on one filesystem
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_temp(tmp_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp_path)?;

    file.write_all(bytes)?;
    file.sync_all()
}
