//! Configuration for lsmkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{LsmError, Result};

/// Main configuration for an lsmkv engine
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Max number of records buffered before the next put flushes
    pub buffer_capacity: usize,

    /// Sort the buffer (and keep the segment ordered by key) on every flush
    pub sort_on_flush: bool,

    // -------------------------------------------------------------------------
    // Segment Configuration
    // -------------------------------------------------------------------------
    /// Segment file used by `Engine::open`.
    /// The file is rewritten whole on every flush via `{segment_path}.tmp`.
    pub segment_path: PathBuf,

    /// On-disk encoding of the segment file
    pub segment_format: SegmentFormat,
}

/// Segment file encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentFormat {
    /// One `"key value"` pair per line
    #[default]
    Text,

    /// Header + bincode payload + CRC32 footer
    Binary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_capacity: 1024,
            sort_on_flush: true,
            segment_path: PathBuf::from("./lsmkv_data/segment.log"),
            segment_format: SegmentFormat::Text,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(LsmError::Config(
                "buffer_capacity must be greater than zero".to_string(),
            ));
        }
        if self.segment_path.as_os_str().is_empty() {
            return Err(LsmError::Config("segment_path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the memtable capacity (in records)
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    /// Enable or disable sorting on flush
    pub fn sort_on_flush(mut self, sort: bool) -> Self {
        self.config.sort_on_flush = sort;
        self
    }

    /// Set the segment file path
    pub fn segment_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.segment_path = path.into();
        self
    }

    /// Set the segment file encoding
    pub fn segment_format(mut self, format: SegmentFormat) -> Self {
        self.config.segment_format = format;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
