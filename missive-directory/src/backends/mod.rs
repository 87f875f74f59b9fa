//! Sender directory backends
//!
//! - `postgres`: the `senders` table, used in production
//! - `memory`: a concurrent map, used in tests and local runs

pub mod memory;
pub mod postgres;

pub use memory::MemorySenderDirectory;
pub use postgres::PostgresDirectory;
