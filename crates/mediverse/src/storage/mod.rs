//! Storage backend implementations.
//!
//! Concrete implementations of the repository traits defined in
//! `mediverse_core::storage`. Sessions are stored separately by
//! `mediverse_auth`.

pub mod sqlite;

pub use sqlite::SqliteRepository;
