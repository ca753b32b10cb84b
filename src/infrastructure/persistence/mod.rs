pub mod in_memory_store;
pub mod migrations;
pub mod sqlite_store;

pub use in_memory_store::InMemoryStore;
pub use sqlite_store::SqliteStore;
