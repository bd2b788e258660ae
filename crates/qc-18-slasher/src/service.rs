//! # Span Index Service
//!
//! Reads and writes span chunks through the [`KeyValueStore`] port, using
//! [`Parameters`] for every address.
//!
//! ## Locking
//!
//! One `RwLock` guards the store. Reads share it; read-modify-write batches
//! (`apply_updates`) and pruning hold the write lock for the whole batch so two
//! writers touching the same validator-chunk cannot lose each other's cells.

use crate::domain::{ChunkKey, ChunkKind, Parameters, SlasherConfig, SpanChunk};
use crate::error::{SlasherError, SlasherResult};
use crate::metrics;
use crate::ports::inbound::{SpanIndexApi, SpanUpdate};
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use parking_lot::RwLock;
use shared_types::{ChunkIndex, Epoch, ValidatorChunkIndex, ValidatorIndex};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Span index over a key-value store.
pub struct SpanIndexService<S: KeyValueStore> {
    params: Parameters,
    store: RwLock<S>,
}

impl<S: KeyValueStore> SpanIndexService<S> {
    /// Create a service over `store`.
    ///
    /// `params` goes through the same checks as a [`SlasherConfig`], so a
    /// layout whose chunks cannot be allocated is refused here.
    pub fn new(params: Parameters, store: S) -> SlasherResult<Self> {
        Self::from_config(SlasherConfig::from(params), store)
    }

    /// Validate `config` and create a service.
    pub fn from_config(config: SlasherConfig, store: S) -> SlasherResult<Self> {
        Ok(Self {
            params: Parameters::try_from(config)?,
            store: RwLock::new(store),
        })
    }

    /// Consume the service and hand back the store.
    pub fn into_store(self) -> S {
        self.store.into_inner()
    }

    fn chunk_key(
        &self,
        kind: ChunkKind,
        validator_chunk_index: ValidatorChunkIndex,
        chunk_index: ChunkIndex,
    ) -> SlasherResult<Vec<u8>> {
        // A chunk index past the window would alias the next validator-chunk.
        let limit = self.params.num_chunks_per_history();
        if chunk_index >= limit {
            return Err(SlasherError::ChunkIndexOutOfRange { chunk_index, limit });
        }
        let id = self
            .params
            .flat_slice_id_for(validator_chunk_index, chunk_index);
        Ok(ChunkKey::encode(kind, id))
    }

    fn decode(&self, kind: ChunkKind, stored: Option<Vec<u8>>) -> SlasherResult<SpanChunk> {
        match stored {
            Some(bytes) => SpanChunk::from_bytes(kind, &self.params, &bytes),
            None => Ok(SpanChunk::empty(kind, &self.params)),
        }
    }

    fn check_window(&self, epoch: Epoch, current_epoch: Epoch) -> SlasherResult<()> {
        if epoch > current_epoch {
            metrics::record_epoch_rejected("future");
            warn!(
                %epoch,
                %current_epoch,
                "[qc-18] Rejecting span write for future epoch"
            );
            return Err(SlasherError::EpochInFuture {
                epoch,
                current: current_epoch,
            });
        }
        if !self.params.is_within_history(epoch, current_epoch) {
            let oldest = self.params.oldest_retained_epoch(current_epoch);
            metrics::record_epoch_rejected("outside_history");
            warn!(
                %epoch,
                %oldest,
                "[qc-18] Rejecting span write outside history window"
            );
            return Err(SlasherError::EpochOutsideHistory { epoch, oldest });
        }
        Ok(())
    }
}

impl<S: KeyValueStore> SpanIndexApi for SpanIndexService<S> {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn load_chunk(
        &self,
        kind: ChunkKind,
        validator_chunk_index: ValidatorChunkIndex,
        chunk_index: ChunkIndex,
    ) -> SlasherResult<SpanChunk> {
        let key = self.chunk_key(kind, validator_chunk_index, chunk_index)?;
        let stored = self.store.read().get(&key)?;
        metrics::record_chunks_loaded(kind.label(), 1);
        debug!(
            kind = kind.label(),
            validator_chunk_index,
            chunk_index,
            found = stored.is_some(),
            "[qc-18] Loaded span chunk"
        );
        self.decode(kind, stored)
    }

    fn load_chunks(
        &self,
        kind: ChunkKind,
        validator_chunk_index: ValidatorChunkIndex,
        chunk_indices: &[ChunkIndex],
    ) -> SlasherResult<BTreeMap<ChunkIndex, SpanChunk>> {
        let mut chunks = BTreeMap::new();
        let store = self.store.read();
        for &chunk_index in chunk_indices {
            if chunks.contains_key(&chunk_index) {
                continue;
            }
            let key = self.chunk_key(kind, validator_chunk_index, chunk_index)?;
            let chunk = self.decode(kind, store.get(&key)?)?;
            chunks.insert(chunk_index, chunk);
        }
        drop(store);

        metrics::record_chunks_loaded(kind.label(), chunks.len() as u64);
        debug!(
            kind = kind.label(),
            validator_chunk_index,
            count = chunks.len(),
            "[qc-18] Loaded span chunks"
        );
        Ok(chunks)
    }

    fn save_chunks(
        &self,
        validator_chunk_index: ValidatorChunkIndex,
        chunks: &BTreeMap<ChunkIndex, SpanChunk>,
    ) -> SlasherResult<()> {
        let expected = self.params.chunk_len();
        let mut operations = Vec::with_capacity(chunks.len());
        for (&chunk_index, chunk) in chunks {
            if chunk.len() as u64 != expected {
                return Err(SlasherError::ChunkSizeMismatch {
                    expected,
                    actual: chunk.len() as u64,
                });
            }
            let key = self.chunk_key(chunk.kind(), validator_chunk_index, chunk_index)?;
            operations.push(BatchOperation::put(key, chunk.to_bytes()?));
        }
        if operations.is_empty() {
            return Ok(());
        }

        self.store.write().atomic_batch_write(operations)?;
        for chunk in chunks.values() {
            metrics::record_chunks_written(chunk.kind().label(), 1);
        }
        debug!(
            validator_chunk_index,
            count = chunks.len(),
            "[qc-18] Saved span chunks"
        );
        Ok(())
    }

    fn read_span(
        &self,
        kind: ChunkKind,
        validator: ValidatorIndex,
        epoch: Epoch,
    ) -> SlasherResult<u16> {
        let chunk = self.load_chunk(
            kind,
            self.params.validator_chunk_index(validator),
            self.params.chunk_index(epoch),
        )?;
        chunk.get(&self.params, validator, epoch)
    }

    fn write_span(
        &self,
        kind: ChunkKind,
        update: SpanUpdate,
        current_epoch: Epoch,
    ) -> SlasherResult<()> {
        self.apply_updates(kind, &[update], current_epoch)
            .map(|_| ())
    }

    fn apply_updates(
        &self,
        kind: ChunkKind,
        updates: &[SpanUpdate],
        current_epoch: Epoch,
    ) -> SlasherResult<usize> {
        for update in updates {
            self.check_window(update.epoch, current_epoch)?;
        }

        // Later updates to the same cell win.
        let mut touched: BTreeMap<(ValidatorChunkIndex, ChunkIndex), Vec<&SpanUpdate>> =
            BTreeMap::new();
        for update in updates {
            let address = (
                self.params.validator_chunk_index(update.validator),
                self.params.chunk_index(update.epoch),
            );
            touched.entry(address).or_default().push(update);
        }
        if touched.is_empty() {
            return Ok(0);
        }

        let mut store = self.store.write();
        let mut operations = Vec::with_capacity(touched.len());
        for (&(validator_chunk_index, chunk_index), group) in &touched {
            let key = self.chunk_key(kind, validator_chunk_index, chunk_index)?;
            let mut chunk = self.decode(kind, store.get(&key)?)?;
            for update in group {
                chunk.set(&self.params, update.validator, update.epoch, update.value)?;
            }
            operations.push(BatchOperation::put(key, chunk.to_bytes()?));
        }
        store.atomic_batch_write(operations)?;
        drop(store);

        let written = touched.len();
        metrics::record_chunks_loaded(kind.label(), written as u64);
        metrics::record_chunks_written(kind.label(), written as u64);
        debug!(
            kind = kind.label(),
            updates = updates.len(),
            chunks = written,
            "[qc-18] Applied span updates"
        );
        Ok(written)
    }

    fn prune_validator_chunk(
        &self,
        validator_chunk_index: ValidatorChunkIndex,
    ) -> SlasherResult<usize> {
        let mut store = self.store.write();
        let mut operations = Vec::new();
        for kind in ChunkKind::ALL {
            let (start, end) =
                ChunkKey::validator_chunk_range(kind, &self.params, validator_chunk_index);
            for (key, _) in store.range_scan(&start, &end)? {
                operations.push(BatchOperation::delete(key));
            }
        }

        let pruned = operations.len();
        if pruned > 0 {
            store.atomic_batch_write(operations)?;
        }
        drop(store);

        metrics::record_chunks_pruned(pruned as u64);
        debug!(validator_chunk_index, pruned, "[qc-18] Pruned validator chunk");
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryKVStore;

    fn service() -> SpanIndexService<InMemoryKVStore> {
        SpanIndexService::new(Parameters::new(3, 3, 6), InMemoryKVStore::new()).unwrap()
    }

    fn update(validator: u64, epoch: u64, value: u16) -> SpanUpdate {
        SpanUpdate::new(ValidatorIndex(validator), Epoch(epoch), value)
    }

    #[test]
    fn test_missing_chunk_reads_neutral() {
        let service = service();
        let chunk = service.load_chunk(ChunkKind::MinSpan, 0, 1).unwrap();

        assert_eq!(chunk, SpanChunk::empty(ChunkKind::MinSpan, service.params()));
        assert_eq!(
            service
                .read_span(ChunkKind::MaxSpan, ValidatorIndex(4), Epoch(2))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_write_then_read_span() {
        let service = service();
        service
            .write_span(ChunkKind::MinSpan, update(10, 10, 7), Epoch(10))
            .unwrap();

        let value = service
            .read_span(ChunkKind::MinSpan, ValidatorIndex(10), Epoch(10))
            .unwrap();
        assert_eq!(value, 7);

        // Other kind is untouched
        let other = service
            .read_span(ChunkKind::MaxSpan, ValidatorIndex(10), Epoch(10))
            .unwrap();
        assert_eq!(other, 0);
    }

    #[test]
    fn test_write_lands_at_flat_slice_id() {
        let service = service();
        service
            .write_span(ChunkKind::MaxSpan, update(10, 10, 3), Epoch(10))
            .unwrap();

        let store = service.into_store();
        let key = ChunkKey::encode(ChunkKind::MaxSpan, crate::domain::FlatSliceId(7));
        assert!(store.exists(&key).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_future_epoch_rejected() {
        let service = service();
        let result = service.write_span(ChunkKind::MinSpan, update(0, 5, 1), Epoch(4));
        assert!(matches!(result, Err(SlasherError::EpochInFuture { .. })));
    }

    #[test]
    fn test_stale_epoch_rejected() {
        let service = service();
        // history 6 at epoch 20 retains 15..=20
        let result = service.write_span(ChunkKind::MinSpan, update(0, 14, 1), Epoch(20));
        assert!(matches!(
            result,
            Err(SlasherError::EpochOutsideHistory {
                epoch: Epoch(14),
                oldest: Epoch(15)
            })
        ));
    }

    #[test]
    fn test_apply_updates_groups_by_chunk() {
        let service = service();
        let updates = [
            update(0, 0, 1),
            update(1, 1, 2),
            update(2, 2, 3),
            // same validator-chunk, next chunk in history
            update(0, 3, 4),
            // next validator-chunk
            update(4, 0, 5),
        ];

        let written = service
            .apply_updates(ChunkKind::MaxSpan, &updates, Epoch(5))
            .unwrap();
        assert_eq!(written, 3);

        for u in updates {
            assert_eq!(
                service
                    .read_span(ChunkKind::MaxSpan, u.validator, u.epoch)
                    .unwrap(),
                u.value
            );
        }
    }

    #[test]
    fn test_apply_updates_is_all_or_nothing() {
        let service = service();
        let updates = [update(0, 5, 1), update(0, 9, 2)];

        assert!(service
            .apply_updates(ChunkKind::MinSpan, &updates, Epoch(8))
            .is_err());
        assert_eq!(service.into_store().len(), 0);
    }

    #[test]
    fn test_later_update_wins() {
        let service = service();
        service
            .apply_updates(
                ChunkKind::MinSpan,
                &[update(1, 1, 9), update(1, 1, 4)],
                Epoch(1),
            )
            .unwrap();

        assert_eq!(
            service
                .read_span(ChunkKind::MinSpan, ValidatorIndex(1), Epoch(1))
                .unwrap(),
            4
        );
    }

    #[test]
    fn test_chunk_index_out_of_range() {
        let service = service();
        let result = service.load_chunk(ChunkKind::MinSpan, 0, 2);
        assert!(matches!(
            result,
            Err(SlasherError::ChunkIndexOutOfRange {
                chunk_index: 2,
                limit: 2
            })
        ));
    }

    #[test]
    fn test_save_and_load_chunks() {
        let service = service();
        let params = *service.params();

        let mut chunk = SpanChunk::empty(ChunkKind::MaxSpan, &params);
        chunk.set(&params, ValidatorIndex(7), Epoch(4), 12).unwrap();
        let chunks = BTreeMap::from([(1, chunk.clone())]);
        service.save_chunks(2, &chunks).unwrap();

        let loaded = service
            .load_chunks(ChunkKind::MaxSpan, 2, &[0, 1, 1])
            .unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[&1], chunk);
        assert!(loaded[&0].is_neutral());
    }

    #[test]
    fn test_save_rejects_foreign_layout() {
        let service = service();
        let wrong = SpanChunk::empty(ChunkKind::MinSpan, &Parameters::new(2, 2, 4));
        let result = service.save_chunks(0, &BTreeMap::from([(0, wrong)]));
        assert!(matches!(
            result,
            Err(SlasherError::ChunkSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_prune_validator_chunk() {
        let service = service();
        let updates = [update(3, 0, 1), update(5, 4, 2), update(6, 0, 3)];
        service
            .apply_updates(ChunkKind::MinSpan, &updates, Epoch(5))
            .unwrap();
        service
            .apply_updates(ChunkKind::MaxSpan, &updates, Epoch(5))
            .unwrap();

        // validator-chunk 1 holds validators 3..6: two chunks per kind
        assert_eq!(service.prune_validator_chunk(1).unwrap(), 4);
        assert_eq!(service.prune_validator_chunk(1).unwrap(), 0);

        // validator 6 lives in validator-chunk 2 and survives
        assert_eq!(
            service
                .read_span(ChunkKind::MinSpan, ValidatorIndex(6), Epoch(0))
                .unwrap(),
            3
        );
        assert_eq!(
            service
                .read_span(ChunkKind::MinSpan, ValidatorIndex(3), Epoch(0))
                .unwrap(),
            u16::MAX
        );
    }

    #[test]
    fn test_from_config_validates() {
        let config = SlasherConfig::default().with_chunk_size(0);
        let result = SpanIndexService::from_config(config, InMemoryKVStore::new());
        assert!(matches!(result, Err(SlasherError::InvalidConfig { .. })));
    }

    #[test]
    fn test_ragged_history_refused_before_any_write() {
        // With 7 epochs in chunks of 3, epochs 4 and 10 would share a cell
        // while both are inside the window at epoch 10.
        let config = SlasherConfig::default()
            .with_chunk_size(3)
            .with_validator_chunk_size(1)
            .with_history_length(7);
        let result = SpanIndexService::from_config(config, InMemoryKVStore::new());
        assert!(matches!(
            result,
            Err(SlasherError::InvalidConfig {
                field: "history_length",
                ..
            })
        ));
    }

    #[test]
    fn test_new_refuses_unallocatable_layout() {
        let huge = Parameters::new(1 << 20, 1 << 20, 1 << 20);
        assert!(matches!(
            SpanIndexService::new(huge, InMemoryKVStore::new()),
            Err(SlasherError::InvalidConfig {
                field: "chunk_size",
                ..
            })
        ));

        let saturated = Parameters::new(u64::MAX, 2, u64::MAX);
        assert!(SpanIndexService::new(saturated, InMemoryKVStore::new()).is_err());
    }
}
