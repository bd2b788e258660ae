//! # Slasher Metrics
//!
//! Prometheus metrics for span chunk I/O.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-slasher = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `slasher_chunks_loaded_total` - Chunks read from the store (by kind)
//! - `slasher_chunks_written_total` - Chunks written to the store (by kind)
//! - `slasher_chunks_pruned_total` - Chunks deleted by validator-chunk pruning
//! - `slasher_epochs_rejected_total` - Span writes rejected by the window policy (by reason)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Chunks read from the store, labeled by kind
    pub static ref CHUNKS_LOADED: IntCounterVec = register_int_counter_vec!(
        "slasher_chunks_loaded_total",
        "Total number of span chunks loaded",
        &["kind"]
    )
    .expect("Failed to create CHUNKS_LOADED metric");

    /// Chunks written to the store, labeled by kind
    pub static ref CHUNKS_WRITTEN: IntCounterVec = register_int_counter_vec!(
        "slasher_chunks_written_total",
        "Total number of span chunks written",
        &["kind"]
    )
    .expect("Failed to create CHUNKS_WRITTEN metric");

    /// Chunks deleted by pruning
    pub static ref CHUNKS_PRUNED: IntCounter = register_int_counter!(
        "slasher_chunks_pruned_total",
        "Total number of span chunks pruned"
    )
    .expect("Failed to create CHUNKS_PRUNED metric");

    /// Span writes rejected by the history window policy, labeled by reason
    pub static ref EPOCHS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "slasher_epochs_rejected_total",
        "Total number of span writes rejected by the history window",
        &["reason"]
    )
    .expect("Failed to create EPOCHS_REJECTED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record chunks loaded
#[cfg(feature = "metrics")]
pub fn record_chunks_loaded(kind: &str, count: u64) {
    CHUNKS_LOADED.with_label_values(&[kind]).inc_by(count);
}

/// Record chunks written
#[cfg(feature = "metrics")]
pub fn record_chunks_written(kind: &str, count: u64) {
    CHUNKS_WRITTEN.with_label_values(&[kind]).inc_by(count);
}

/// Record chunks pruned
#[cfg(feature = "metrics")]
pub fn record_chunks_pruned(count: u64) {
    CHUNKS_PRUNED.inc_by(count);
}

/// Record a rejected epoch
#[cfg(feature = "metrics")]
pub fn record_epoch_rejected(reason: &str) {
    EPOCHS_REJECTED.with_label_values(&[reason]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_chunks_loaded(_kind: &str, _count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_chunks_written(_kind: &str, _count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_chunks_pruned(_count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_epoch_rejected(_reason: &str) {}
