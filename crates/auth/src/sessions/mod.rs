//! Session storage implementations.
//!
//! Provides `SessionRepository` implementations for:
//! - SQLite (with `sqlite` feature)
//! - In-memory (tests and throwaway dev servers)

mod inmemory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use inmemory::MemorySessionStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSessionStore;
