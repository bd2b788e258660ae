//! # Core Domain Entities
//!
//! Primitive consensus coordinates shared by the slasher crates.
//!
//! ## Clusters
//!
//! - **Time**: `Epoch`
//! - **Identity**: `ValidatorIndex`
//! - **Addressing**: `ValidatorChunkIndex`, `ChunkIndex`, `CellIndex`
//!
//! Every arithmetic helper here is total: a zero divisor yields 0 instead of
//! panicking, so a long-running monitor never aborts on odd input.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a group of `validator_chunk_size` consecutive validators.
pub type ValidatorChunkIndex = u64;

/// Index of a chunk within one validator-chunk's history window.
pub type ChunkIndex = u64;

/// Position of a single span value inside a chunk payload.
pub type CellIndex = u64;

// =============================================================================
// EPOCH
// =============================================================================

/// A consensus epoch. Monotonically increasing, unbounded.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Epoch(pub u64);

impl Epoch {
    pub const fn new(epoch: u64) -> Self {
        Self(epoch)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// `self mod n`, or 0 when `n == 0`.
    pub const fn modulo(self, n: u64) -> u64 {
        match self.0.checked_rem(n) {
            Some(rem) => rem,
            None => 0,
        }
    }

    /// `self div n`, or 0 when `n == 0`.
    pub const fn div(self, n: u64) -> u64 {
        match self.0.checked_div(n) {
            Some(quot) => quot,
            None => 0,
        }
    }

    pub const fn saturating_sub(self, n: u64) -> Self {
        Self(self.0.saturating_sub(n))
    }

    pub const fn saturating_add(self, n: u64) -> Self {
        Self(self.0.saturating_add(n))
    }
}

impl From<u64> for Epoch {
    fn from(epoch: u64) -> Self {
        Self(epoch)
    }
}

impl From<Epoch> for u64 {
    fn from(epoch: Epoch) -> Self {
        epoch.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// VALIDATOR INDEX
// =============================================================================

/// Position of a validator in the registry being monitored.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ValidatorIndex(pub u64);

impl ValidatorIndex {
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// `self mod n`, or 0 when `n == 0`.
    pub const fn modulo(self, n: u64) -> u64 {
        match self.0.checked_rem(n) {
            Some(rem) => rem,
            None => 0,
        }
    }

    /// `self div n`, or 0 when `n == 0`.
    pub const fn div(self, n: u64) -> u64 {
        match self.0.checked_div(n) {
            Some(quot) => quot,
            None => 0,
        }
    }
}

impl From<u64> for ValidatorIndex {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

impl From<ValidatorIndex> for u64 {
    fn from(index: ValidatorIndex) -> Self {
        index.0
    }
}

impl fmt::Display for ValidatorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
