pub mod accounts;
pub mod admin;
pub mod applications;
pub mod appointments;
pub mod authz;
pub mod chats;
pub mod doctors;
pub mod error;
pub mod flash;
pub mod health;
pub mod multipart;
pub mod pages;
pub mod ratings;
pub mod reports;
pub mod slots;
pub mod views;

pub use error::AppError;
