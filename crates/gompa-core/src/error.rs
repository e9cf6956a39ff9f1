//! Error types for Gompa.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Message is required")]
    InvalidInput,

    #[error("{0} is not configured")]
    ProviderUnconfigured(String),

    #[error("{0} is not configured")]
    SearchUnconfigured(String),

    #[error("Search service unavailable")]
    SearchUnavailable,

    #[error("{0}")]
    Provider(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
