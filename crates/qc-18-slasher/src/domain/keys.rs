//! Store keys for span chunks.
//!
//! `{kind prefix}{flat slice id, big-endian}`. Big-endian ids sort in numeric
//! order, so the chunks of one validator-chunk form a single contiguous key
//! range that a range scan can prune.

use crate::domain::chunk::ChunkKind;
use crate::domain::params::{FlatSliceId, Parameters};
use shared_types::ValidatorChunkIndex;

/// Key builder for the span chunk namespace.
#[derive(Debug, Clone, Copy)]
pub struct ChunkKey;

impl ChunkKey {
    /// Prefix byte plus an 8-byte id.
    pub const LEN: usize = 9;

    pub fn encode(kind: ChunkKind, id: FlatSliceId) -> Vec<u8> {
        let mut key = Vec::with_capacity(Self::LEN);
        key.push(kind.key_prefix());
        key.extend_from_slice(&id.as_u64().to_be_bytes());
        key
    }

    /// Parse a key produced by [`ChunkKey::encode`].
    pub fn decode(key: &[u8]) -> Option<(ChunkKind, FlatSliceId)> {
        if key.len() != Self::LEN {
            return None;
        }
        let kind = ChunkKind::from_key_prefix(key[0])?;
        let id: [u8; 8] = key[1..].try_into().ok()?;
        Some((kind, FlatSliceId(u64::from_be_bytes(id))))
    }

    /// Half-open key range `[start, end)` covering every chunk of
    /// `validator_chunk_index` for `kind`.
    pub fn validator_chunk_range(
        kind: ChunkKind,
        params: &Parameters,
        validator_chunk_index: ValidatorChunkIndex,
    ) -> (Vec<u8>, Vec<u8>) {
        let start = params.flat_slice_id_for(validator_chunk_index, 0);
        let end = match start
            .as_u64()
            .checked_add(params.num_chunks_per_history())
        {
            Some(end) => Self::encode(kind, FlatSliceId(end)),
            // Past the last id: the next prefix byte bounds the namespace.
            None => vec![kind.key_prefix().saturating_add(1)],
        };
        (Self::encode(kind, start), end)
    }
}
