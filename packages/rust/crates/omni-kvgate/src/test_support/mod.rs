//! Test-only helpers for integration tests.
//!
//! [`MemoryClient`] is an in-memory `CommandClient` with a command log and
//! failure injection, so gate behavior can be checked without a live server.

mod memory_client;

pub use memory_client::MemoryClient;
