//! Startup configuration errors.
//!
//! A missing provider key is *not* an error here: the server starts in
//! degraded mode instead. These errors cover configuration that is present
//! but unusable.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid credential entry '{0}': expected 'username:password'")]
    InvalidCredentialEntry(String),

    #[error("Credential table is empty")]
    EmptyCredentialTable,

    #[error("Failed to read persona file {path}: {source}")]
    PersonaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid provider base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
