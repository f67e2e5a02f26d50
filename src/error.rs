//! Engine-wide error type. Every recoverable failure surfaced across the HTTP
//! boundary maps to one of these variants; the mapping to status codes lives in
//! `web::ApiError`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("session not found")]
    SessionNotFound,

    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid deal: {0}")]
    InvalidDeal(String),

    #[error("invalid board: {0}")]
    InvalidBoard(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
