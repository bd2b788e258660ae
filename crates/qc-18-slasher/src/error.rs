//! Error types for the Slasher subsystem
//!
//! The addressing functions never fail. Errors come from configuration,
//! chunk payload decoding, the window policy and the backing store.

use shared_types::Epoch;
use thiserror::Error;

/// Key-value store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KVStoreError {
    /// I/O error during read/write
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

/// Slasher subsystem errors
#[derive(Debug, Error)]
pub enum SlasherError {
    /// Layout configuration rejected at startup
    #[error("Invalid slasher configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Cell index outside the chunk payload
    #[error("Cell {cell} out of bounds for chunk of {len} cells")]
    CellOutOfBounds { cell: u64, len: usize },

    /// Stored payload does not match the configured layout
    #[error("Chunk size mismatch: expected {expected} cells, got {actual}")]
    ChunkSizeMismatch { expected: u64, actual: u64 },

    /// Chunk index beyond the history window
    #[error("Chunk index {chunk_index} out of range (chunks per history: {limit})")]
    ChunkIndexOutOfRange { chunk_index: u64, limit: u64 },

    /// Epoch older than the retained window would alias a newer epoch
    #[error("Epoch {epoch} outside history window (oldest retained: {oldest})")]
    EpochOutsideHistory { epoch: Epoch, oldest: Epoch },

    /// Epoch ahead of the current epoch
    #[error("Epoch {epoch} is ahead of current epoch {current}")]
    EpochInFuture { epoch: Epoch, current: Epoch },

    /// Chunk payload (de)serialization failed
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(#[from] KVStoreError),
}

/// Result type for slasher operations
pub type SlasherResult<T> = Result<T, SlasherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_converts() {
        let err: SlasherError = KVStoreError::IOError {
            message: "disk gone".into(),
        }
        .into();
        assert!(matches!(err, SlasherError::Storage(_)));
        assert_eq!(err.to_string(), "Storage error: KV store I/O error: disk gone");
    }

    #[test]
    fn test_window_error_message() {
        let err = SlasherError::EpochOutsideHistory {
            epoch: Epoch(3),
            oldest: Epoch(10),
        };
        assert_eq!(
            err.to_string(),
            "Epoch 3 outside history window (oldest retained: 10)"
        );
    }
}
