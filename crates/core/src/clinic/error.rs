use thiserror::Error;

/// A stored or submitted value did not match any variant of a status enum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Form input rejected before it reaches storage.
///
/// The messages are shown to users as flash messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("{0} is not a valid date (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("{0} is not a valid time (expected HH:MM)")]
    InvalidTime(String),
    #[error("{0} must be a whole number")]
    InvalidNumber(&'static str),
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("The date cannot be in the past")]
    DateInPast,
    #[error("Date of birth cannot be in the future")]
    BirthDateInFuture,
    #[error("End time must be after start time")]
    InvalidTimeRange,
    #[error("Medicine line {0} is incomplete (name, dosage, frequency and duration are required)")]
    IncompleteMedicine(usize),
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

/// Requested status change is not allowed from the current status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot change {entity} from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: String,
    pub to: String,
}
