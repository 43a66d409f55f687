//! Error types for lsmkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LsmError
pub type Result<T> = std::result::Result<T, LsmError>;

/// Unified error type for lsmkv operations
#[derive(Debug, Error)]
pub enum LsmError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Segment Errors
    // -------------------------------------------------------------------------
    #[error("Segment corruption detected: {0}")]
    Corruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // MemTable Errors
    // -------------------------------------------------------------------------
    #[error("MemTable capacity exceeded (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LsmError {
    /// True when the segment store could not complete a load or replace.
    pub fn is_io_failure(&self) -> bool {
        matches!(self, LsmError::Io(_) | LsmError::Corruption(_))
    }
}

impl From<bincode::Error> for LsmError {
    fn from(e: bincode::Error) -> Self {
        LsmError::Serialization(e.to_string())
    }
}
