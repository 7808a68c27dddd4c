//! SQLite storage backend implementation.
//!
//! Implements every repository trait of `mediverse_core::storage` using
//! `rusqlite` for synchronous operations and `tokio-rusqlite` for async wrapping.

mod conversions;
mod error;
mod repository;
mod schema;

pub use repository::SqliteRepository;

#[cfg(test)]
pub(crate) use repository::fixtures;
