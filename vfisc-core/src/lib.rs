//! Rust toolkit for MRA e-invoicing (document mapping, the hybrid
//! RSA/AES handshake, and realtime transmission).
//!
//! # Examples
//! ```rust,no_run
//! use vfisc_core::config::Config;
//! use vfisc_core::pipeline::Submitter;
//!
//! # fn main() -> Result<(), vfisc_core::Error> {
//! let config = Config::from_env()?;
//! let submitter = Submitter::new(config)?;
//! # let _ = submitter;
//! # Ok(())
//! # }
//! ```
pub mod api;
pub mod config;
pub mod crypto;
pub mod document;
pub mod mapping;
pub mod pipeline;
pub mod source;

use thiserror::Error;

/// Top-level error wrapper for core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Crypto(#[from] crypto::CryptoError),
    #[error(transparent)]
    Mapping(#[from] mapping::MappingError),
    #[error(transparent)]
    Api(#[from] api::ApiError),
    #[error(transparent)]
    Pipeline(#[from] pipeline::PipelineError),
}
