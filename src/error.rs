use crate::domain::deal::DealStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EscrowError>;

#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("deal not found: {0}")]
    NotFound(String),
    #[error("actor {actor} is not allowed to {action}")]
    Unauthorized { actor: i64, action: &'static str },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("deal token already exists: {0}")]
    Conflict(String),
    #[error("deal {token} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        token: String,
        from: DealStatus,
        to: DealStatus,
    },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
