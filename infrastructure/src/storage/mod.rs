//! Storage adapters for the persistence ports

mod agents;
mod memory;
mod sqlite;

pub use agents::ConfiguredAgents;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
