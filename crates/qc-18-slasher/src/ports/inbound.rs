//! Driving Ports (API - Inbound)
//!
//! What the detection layer calls to read and write span history.

use crate::domain::{ChunkKind, Parameters, SpanChunk};
use crate::error::SlasherResult;
use shared_types::{ChunkIndex, Epoch, ValidatorChunkIndex, ValidatorIndex};
use std::collections::BTreeMap;

/// New span value for one `(validator, epoch)` cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpanUpdate {
    pub validator: ValidatorIndex,
    pub epoch: Epoch,
    pub value: u16,
}

impl SpanUpdate {
    pub fn new(validator: ValidatorIndex, epoch: Epoch, value: u16) -> Self {
        Self {
            validator,
            epoch,
            value,
        }
    }
}

/// Primary span index API.
///
/// Chunks are addressed by `(validator_chunk_index, chunk_index)`; single
/// cells by `(validator, epoch)`. Missing chunks read as
/// [`SpanChunk::empty`].
pub trait SpanIndexApi: Send + Sync {
    /// Layout used for every address computed by this index.
    fn params(&self) -> &Parameters;

    /// Load one chunk.
    fn load_chunk(
        &self,
        kind: ChunkKind,
        validator_chunk_index: ValidatorChunkIndex,
        chunk_index: ChunkIndex,
    ) -> SlasherResult<SpanChunk>;

    /// Load several chunks of one validator-chunk, keyed by chunk index.
    fn load_chunks(
        &self,
        kind: ChunkKind,
        validator_chunk_index: ValidatorChunkIndex,
        chunk_indices: &[ChunkIndex],
    ) -> SlasherResult<BTreeMap<ChunkIndex, SpanChunk>>;

    /// Persist chunks of one validator-chunk in a single atomic batch.
    fn save_chunks(
        &self,
        validator_chunk_index: ValidatorChunkIndex,
        chunks: &BTreeMap<ChunkIndex, SpanChunk>,
    ) -> SlasherResult<()>;

    /// Span currently stored for `(validator, epoch)`.
    fn read_span(
        &self,
        kind: ChunkKind,
        validator: ValidatorIndex,
        epoch: Epoch,
    ) -> SlasherResult<u16>;

    /// Store one span, rejecting epochs outside the retained window.
    fn write_span(
        &self,
        kind: ChunkKind,
        update: SpanUpdate,
        current_epoch: Epoch,
    ) -> SlasherResult<()>;

    /// Store many spans, loading and saving each touched chunk once.
    ///
    /// All-or-nothing: one stale epoch rejects the whole batch.
    fn apply_updates(
        &self,
        kind: ChunkKind,
        updates: &[SpanUpdate],
        current_epoch: Epoch,
    ) -> SlasherResult<usize>;

    /// Delete every chunk (both kinds) of a validator-chunk.
    ///
    /// Returns the number of chunks removed.
    fn prune_validator_chunk(
        &self,
        validator_chunk_index: ValidatorChunkIndex,
    ) -> SlasherResult<usize>;
}
