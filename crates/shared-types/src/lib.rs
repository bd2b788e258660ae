//! # Shared Types Crate
//!
//! Primitive consensus coordinates used across the slasher crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Epoch` and `ValidatorIndex` are defined once
//!   here so the addressing layer and its callers cannot mix them up.
//! - **Total Arithmetic**: helpers never panic on a zero divisor.

pub mod entities;

pub use entities::*;
