//! Persistence module
//!
//! This module holds the repository contracts and the in-memory store.

pub mod memory;
pub mod repositories;

pub use memory::MemoryStore;
pub use repositories::*;
