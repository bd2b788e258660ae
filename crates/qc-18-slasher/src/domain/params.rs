//! # Span Chunk Addressing
//!
//! Maps `(validator, epoch)` observations onto bounded, chunked storage.
//!
//! ## Layout
//!
//! Validators are grouped into validator-chunks of `validator_chunk_size`
//! consecutive indices. Each validator-chunk owns `num_chunks_per_history`
//! chunks, each holding `chunk_size` consecutive epochs for every validator in
//! the group. Inside a chunk, cells are validator-major, epoch-minor:
//!
//! ```text
//! chunk_size = 3, validator_chunk_size = 3
//!
//!     val0     val1     val2
//!      |        |        |
//!   {     }  {     }  {     }
//!  [2, 2, 2, 2, 2, 2, 2, 2, 2]
//!                        |-> epoch 1 (or 4, 7, ...), validator 2 => cell 7
//! ```
//!
//! Epochs are reduced modulo `history_length` before addressing, so the history
//! window behaves as a circular buffer. An epoch older than the window aliases
//! a newer one; callers use [`Parameters::is_within_history`] to reject those.
//! Distinct epochs inside the window only get distinct cells when
//! `history_length` is a whole number of chunks, which `SlasherConfig::validate`
//! enforces.
//!
//! ## Totality
//!
//! Every mapping is defined for all `u64` inputs, including zero-sized
//! configurations. Zero sizes are rejected by `SlasherConfig::validate`, never
//! here.

use shared_types::{CellIndex, ChunkIndex, Epoch, ValidatorChunkIndex, ValidatorIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Epochs per chunk, per validator.
pub const DEFAULT_CHUNK_SIZE: u64 = 16;

/// Validators sharing one chunk.
pub const DEFAULT_VALIDATOR_CHUNK_SIZE: u64 = 256;

/// Epochs retained before wraparound.
pub const DEFAULT_HISTORY_LENGTH: u64 = 4096;

/// Storage key of one chunk (not one cell).
///
/// `validator_chunk_index * num_chunks_per_history + chunk_index`, so all chunks
/// of a validator-chunk occupy one contiguous id range and consecutive
/// validator-chunks occupy consecutive ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatSliceId(pub u64);

impl FlatSliceId {
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FlatSliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable sizing of the span-chunk layout.
///
/// Construct once at start-up (usually through `SlasherConfig`) and pass by
/// reference or copy; there is no global instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Parameters {
    chunk_size: u64,
    validator_chunk_size: u64,
    history_length: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            validator_chunk_size: DEFAULT_VALIDATOR_CHUNK_SIZE,
            history_length: DEFAULT_HISTORY_LENGTH,
        }
    }
}

impl Parameters {
    /// Build parameters without validation.
    ///
    /// Degenerate (zero) values are accepted and yield degenerate outputs.
    pub const fn new(chunk_size: u64, validator_chunk_size: u64, history_length: u64) -> Self {
        Self {
            chunk_size,
            validator_chunk_size,
            history_length,
        }
    }

    pub const fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub const fn validator_chunk_size(&self) -> u64 {
        self.validator_chunk_size
    }

    pub const fn history_length(&self) -> u64 {
        self.history_length
    }

    /// `ceil(history_length / chunk_size)`, or 0 when `chunk_size == 0`.
    pub const fn num_chunks_per_history(&self) -> u64 {
        if self.chunk_size == 0 {
            return 0;
        }
        self.history_length.div_ceil(self.chunk_size)
    }

    /// Number of cells in one chunk payload.
    pub const fn chunk_len(&self) -> u64 {
        self.validator_chunk_size.saturating_mul(self.chunk_size)
    }

    /// Position of `epoch` within its chunk: `epoch mod chunk_size`.
    pub const fn chunk_offset(&self, epoch: Epoch) -> u64 {
        epoch.modulo(self.chunk_size)
    }

    /// Position of `validator` within its validator-chunk.
    pub const fn validator_offset(&self, validator: ValidatorIndex) -> u64 {
        validator.modulo(self.validator_chunk_size)
    }

    /// Chunk slot of `epoch` within the history window.
    ///
    /// `(epoch mod history_length) div chunk_size`; periodic in
    /// `history_length`.
    pub const fn chunk_index(&self, epoch: Epoch) -> ChunkIndex {
        Epoch::new(epoch.modulo(self.history_length)).div(self.chunk_size)
    }

    /// Validator-chunk holding `validator`. Unbounded above.
    pub const fn validator_chunk_index(&self, validator: ValidatorIndex) -> ValidatorChunkIndex {
        validator.div(self.validator_chunk_size)
    }

    /// Position of `(validator, epoch)` inside the chunk that stores it.
    pub const fn cell_index(&self, validator: ValidatorIndex, epoch: Epoch) -> CellIndex {
        self.validator_offset(validator)
            .saturating_mul(self.chunk_size)
            .saturating_add(self.chunk_offset(epoch))
    }

    /// Storage key of the chunk holding `(validator, epoch)`.
    pub const fn flat_slice_id(&self, validator: ValidatorIndex, epoch: Epoch) -> FlatSliceId {
        self.flat_slice_id_for(
            self.validator_chunk_index(validator),
            self.chunk_index(epoch),
        )
    }

    /// Storage key from already-reduced coordinates.
    ///
    /// Injective while `validator_chunk_index * num_chunks_per_history` fits in
    /// a `u64`; wraps beyond that instead of panicking.
    pub const fn flat_slice_id_for(
        &self,
        validator_chunk_index: ValidatorChunkIndex,
        chunk_index: ChunkIndex,
    ) -> FlatSliceId {
        FlatSliceId(
            validator_chunk_index
                .wrapping_mul(self.num_chunks_per_history())
                .wrapping_add(chunk_index),
        )
    }

    /// Inverse of [`Parameters::flat_slice_id_for`].
    ///
    /// Returns `(0, 0)` for a configuration with no chunks per history.
    pub const fn decompose_flat_slice_id(
        &self,
        id: FlatSliceId,
    ) -> (ValidatorChunkIndex, ChunkIndex) {
        let width = self.num_chunks_per_history();
        if width == 0 {
            return (0, 0);
        }
        (id.0 / width, id.0 % width)
    }

    /// The `validator_chunk_size` consecutive validators stored in
    /// `validator_chunk_index`, ascending.
    ///
    /// Empty when `validator_chunk_size == 0`. Truncated at `u64::MAX` for
    /// chunk indices at the very top of the domain.
    pub fn validator_indices_in_chunk(
        &self,
        validator_chunk_index: ValidatorChunkIndex,
    ) -> Vec<ValidatorIndex> {
        let Some(low) = validator_chunk_index.checked_mul(self.validator_chunk_size) else {
            return Vec::new();
        };
        let high = low.saturating_add(self.validator_chunk_size);
        (low..high).map(ValidatorIndex).collect()
    }

    /// Partition `validators` by validator-chunk so each chunk is loaded once.
    pub fn group_by_validator_chunk<I>(
        &self,
        validators: I,
    ) -> BTreeMap<ValidatorChunkIndex, Vec<ValidatorIndex>>
    where
        I: IntoIterator<Item = ValidatorIndex>,
    {
        let mut groups: BTreeMap<ValidatorChunkIndex, Vec<ValidatorIndex>> = BTreeMap::new();
        for validator in validators {
            groups
                .entry(self.validator_chunk_index(validator))
                .or_default()
                .push(validator);
        }
        groups
    }

    /// Oldest epoch still distinguishable at `current_epoch`.
    pub const fn oldest_retained_epoch(&self, current_epoch: Epoch) -> Epoch {
        current_epoch.saturating_sub(self.history_length.saturating_sub(1))
    }

    /// Whether `epoch` lies in `[oldest_retained_epoch, current_epoch]`.
    ///
    /// Outside that window the wraparound would overwrite or misread another
    /// epoch's cell. Inside it, cells are distinct only for layouts where
    /// `chunk_size` divides `history_length`.
    pub fn is_within_history(&self, epoch: Epoch, current_epoch: Epoch) -> bool {
        self.history_length > 0
            && epoch <= current_epoch
            && epoch >= self.oldest_retained_epoch(current_epoch)
    }
}
