//! # Span Chunks
//!
//! Fixed-width payload stored under one `FlatSliceId`: one `u16` span per
//! `(validator, epoch)` cell of a validator-chunk, laid out as described in
//! [`crate::domain::params`].

use crate::domain::params::Parameters;
use crate::error::{SlasherError, SlasherResult};
use serde::{Deserialize, Serialize};
use shared_types::{Epoch, ValidatorIndex};

/// Which span history a chunk belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChunkKind {
    /// Minimum target distance of any attestation with a later source.
    MinSpan,
    /// Maximum target distance of any attestation with an earlier source.
    MaxSpan,
}

impl ChunkKind {
    pub const ALL: [ChunkKind; 2] = [ChunkKind::MinSpan, ChunkKind::MaxSpan];

    /// Value of a cell that has never been written.
    pub const fn neutral_value(self) -> u16 {
        match self {
            ChunkKind::MinSpan => u16::MAX,
            ChunkKind::MaxSpan => 0,
        }
    }

    /// Key namespace byte in the store.
    pub const fn key_prefix(self) -> u8 {
        match self {
            ChunkKind::MinSpan => b'n',
            ChunkKind::MaxSpan => b'x',
        }
    }

    pub const fn from_key_prefix(prefix: u8) -> Option<Self> {
        match prefix {
            b'n' => Some(ChunkKind::MinSpan),
            b'x' => Some(ChunkKind::MaxSpan),
            _ => None,
        }
    }

    /// Label used in logs and metrics.
    pub const fn label(self) -> &'static str {
        match self {
            ChunkKind::MinSpan => "min_span",
            ChunkKind::MaxSpan => "max_span",
        }
    }
}

/// One chunk of span values for a validator-chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpanChunk {
    kind: ChunkKind,
    cells: Vec<u16>,
}

impl SpanChunk {
    /// A chunk with every cell at the kind's neutral value.
    ///
    /// `params` should come from a validated `SlasherConfig`; the payload is
    /// `chunk_len()` cells long.
    pub fn empty(kind: ChunkKind, params: &Parameters) -> Self {
        Self {
            kind,
            cells: vec![kind.neutral_value(); params.chunk_len() as usize],
        }
    }

    pub fn kind(&self) -> ChunkKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[u16] {
        &self.cells
    }

    /// Whether no cell has been moved off the neutral value.
    pub fn is_neutral(&self) -> bool {
        let neutral = self.kind.neutral_value();
        self.cells.iter().all(|&cell| cell == neutral)
    }

    /// Span stored for `(validator, epoch)`.
    pub fn get(
        &self,
        params: &Parameters,
        validator: ValidatorIndex,
        epoch: Epoch,
    ) -> SlasherResult<u16> {
        let cell = params.cell_index(validator, epoch);
        usize::try_from(cell)
            .ok()
            .and_then(|i| self.cells.get(i).copied())
            .ok_or(SlasherError::CellOutOfBounds {
                cell,
                len: self.cells.len(),
            })
    }

    /// Overwrite the span stored for `(validator, epoch)`.
    pub fn set(
        &mut self,
        params: &Parameters,
        validator: ValidatorIndex,
        epoch: Epoch,
        value: u16,
    ) -> SlasherResult<()> {
        let cell = params.cell_index(validator, epoch);
        let len = self.cells.len();
        let slot = usize::try_from(cell)
            .ok()
            .and_then(|i| self.cells.get_mut(i))
            .ok_or(SlasherError::CellOutOfBounds { cell, len })?;
        *slot = value;
        Ok(())
    }

    pub fn to_bytes(&self) -> SlasherResult<Vec<u8>> {
        bincode::serialize(&self.cells).map_err(|e| SlasherError::Serialization {
            reason: e.to_string(),
        })
    }

    /// Decode a stored payload, checking it matches the configured layout.
    pub fn from_bytes(kind: ChunkKind, params: &Parameters, bytes: &[u8]) -> SlasherResult<Self> {
        let cells: Vec<u16> =
            bincode::deserialize(bytes).map_err(|e| SlasherError::Serialization {
                reason: e.to_string(),
            })?;
        let expected = params.chunk_len();
        if cells.len() as u64 != expected {
            return Err(SlasherError::ChunkSizeMismatch {
                expected,
                actual: cells.len() as u64,
            });
        }
        Ok(Self { kind, cells })
    }
}
