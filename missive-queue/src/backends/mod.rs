//! Queue backends
//!
//! - `jetstream`: NATS JetStream stream with a durable pull consumer
//! - `memory`: in-process queue with the same redelivery semantics, for tests

pub mod jetstream;
pub mod memory;

pub use jetstream::JetStreamQueue;
pub use memory::MemoryQueue;
