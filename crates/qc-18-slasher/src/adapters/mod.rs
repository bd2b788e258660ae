//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the outbound store port.

mod memory;

pub use memory::InMemoryKVStore;
