//! Gompa Core — configuration and error types.

pub mod config;
pub mod error;

pub use config::{Environment, GenerationSettings, GompaConfig, ProviderSettings, SearchSettings};
pub use error::{Error, Result};
