//! Errors produced while parsing or constructing shared types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transfer id: {0}")]
    InvalidTransferId(String),
}
