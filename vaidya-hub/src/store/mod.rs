//! Persistence adapters
//!
//! Workflows depend only on the traits defined here; the concrete backend
//! is chosen at startup.

pub mod kv;
pub mod remedies;

pub use kv::{KeyValueStore, MemoryKvStore, SqliteKvStore, TypedStore};
pub use remedies::{
    CollectionRemedyRepository, LocalRemedyRepository, RemedyBackend, RemedyRepository,
};
