//! Ports module for the Slasher subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::{SpanIndexApi, SpanUpdate};
pub use outbound::{BatchOperation, KeyValueStore};
