//! Domain module for the Slasher subsystem
//!
//! ## Core Modules
//! - params: `(validator, epoch)` to chunk/cell/key addressing
//! - chunk: fixed-width span chunk payload
//! - keys: store key layout for chunks
//! - config: layout configuration and validation
//!
//! RULES:
//! - No I/O operations
//! - Addressing functions are total

pub mod chunk;
pub mod config;
pub mod keys;
pub mod params;

pub use chunk::{ChunkKind, SpanChunk};
pub use config::{SlasherConfig, MAX_CHUNK_CELLS};
pub use keys::ChunkKey;
pub use params::{
    FlatSliceId, Parameters, DEFAULT_CHUNK_SIZE, DEFAULT_HISTORY_LENGTH,
    DEFAULT_VALIDATOR_CHUNK_SIZE,
};
