//! # qc-18-slasher
//!
//! Span-chunk indexing for slashing detection.
//!
//! ## Overview
//!
//! Detecting double votes and surround votes needs, for every validator, a
//! rolling history of min/max attestation spans per epoch. History is
//! unbounded in principle; storage is not. This crate provides:
//! - **Addressing**: `Parameters` maps `(validator, epoch)` to a chunk key and a
//!   cell inside that chunk, wrapping epochs over a fixed history window
//! - **Payload**: `SpanChunk`, a fixed-width `u16` cell array per chunk
//! - **Storage**: `SpanIndexService` reads, writes and prunes chunks through
//!   the `KeyValueStore` port
//!
//! ## Layout
//!
//! ```text
//! (validator, epoch)
//!     │
//!     ├── validator_chunk_index = validator / validator_chunk_size
//!     ├── chunk_index           = (epoch % history_length) / chunk_size
//!     │
//!     ├── flat_slice_id = validator_chunk_index * ceil(history_length / chunk_size)
//!     │                   + chunk_index                        ──→ store key
//!     │
//!     └── cell_index    = (validator % validator_chunk_size) * chunk_size
//!                         + epoch % chunk_size                 ──→ offset in chunk
//! ```
//!
//! ## Invariants
//!
//! - Addressing is pure and total: zero-sized layouts yield zeros or empty
//!   sequences, never a panic
//! - `chunk_index(e) == chunk_index(e + history_length)`
//! - `validator_indices_in_chunk` is the exact inverse of
//!   `validator_chunk_index`
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_slasher::{ChunkKind, InMemoryKVStore, SlasherConfig, SpanIndexApi,
//!     SpanIndexService, SpanUpdate};
//!
//! let service = SpanIndexService::from_config(SlasherConfig::from_env()?, InMemoryKVStore::new())?;
//! service.write_span(ChunkKind::MinSpan, SpanUpdate::new(validator, epoch, 3), current_epoch)?;
//! let span = service.read_span(ChunkKind::MinSpan, validator, epoch)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::InMemoryKVStore;
pub use domain::{
    ChunkKey, ChunkKind, FlatSliceId, Parameters, SlasherConfig, SpanChunk, DEFAULT_CHUNK_SIZE,
    DEFAULT_HISTORY_LENGTH, DEFAULT_VALIDATOR_CHUNK_SIZE,
};
pub use error::{KVStoreError, SlasherError, SlasherResult};
pub use ports::{BatchOperation, KeyValueStore, SpanIndexApi, SpanUpdate};
pub use service::SpanIndexService;
pub use shared_types::{CellIndex, ChunkIndex, Epoch, ValidatorChunkIndex, ValidatorIndex};
