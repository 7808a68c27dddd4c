//! Functional core of MediVerse: domain types, validation, pure scheduling
//! rules and the traits the service implements at its edges.

pub mod auth;
pub mod clinic;
pub mod notify;
pub mod storage;
