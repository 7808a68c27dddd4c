use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("delivery failed: {0}")]
    Transport(String),
}
