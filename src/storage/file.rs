//! File-backed segment
//!
//! A single file rewritten whole on every replacement.

use std::fmt::Display;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::SegmentFormat;
use crate::error::Result;
use crate::record::Record;

use super::{binary, text, write_atomically, SegmentStore};

/// Segment stored in one file at `path`
///
/// Records are never cached; every `load_all` reads the file again.
#[derive(Debug)]
pub struct FileSegment<K, V> {
    path: PathBuf,
    format: SegmentFormat,
    _records: PhantomData<fn() -> (K, V)>,
}

impl<K, V> FileSegment<K, V> {
    pub fn new(path: impl Into<PathBuf>, format: SegmentFormat) -> Self {
        Self {
            path: path.into(),
            format,
            _records: PhantomData,
        }
    }

    /// Get the segment file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SegmentFormat {
        self.format
    }
}

impl<K, V> SegmentStore<K, V> for FileSegment<K, V>
where
    K: Display + FromStr + Serialize + DeserializeOwned,
    V: Display + FromStr + Serialize + DeserializeOwned,
{
    fn load_all(&self) -> Result<Vec<Record<K, V>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match self.format {
            SegmentFormat::Text => text::decode(&bytes),
            SegmentFormat::Binary => binary::decode(&bytes),
        }
    }

    fn replace_all(&self, records: &[Record<K, V>]) -> Result<()> {
        let bytes = match self.format {
            SegmentFormat::Text => text::encode(records)?,
            SegmentFormat::Binary => binary::encode(records)?,
        };

        write_atomically(&self.path, &bytes)?;

        tracing::debug!(
            "Segment {} rewritten: {} records, {} bytes",
            self.path.display(),
            records.len(),
            bytes.len()
        );

        Ok(())
    }

    fn check_record(&self, record: &Record<K, V>) -> Result<()> {
        match self.format {
            SegmentFormat::Text => text::check(record),
            SegmentFormat::Binary => Ok(()),
        }
    }
}
