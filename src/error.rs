//! Unified error handling for the tourcat crate
//!
//! Domain modules return their own error types
//! ([`FetchError`](crate::utils::error::FetchError),
//! [`CatalogError`](crate::utils::error::CatalogError)). This one covers the
//! HTTP server's socket and serving failures.

use std::io;
use thiserror::Error;

/// Unified error type for the tourcat crate
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error with context and its underlying cause
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Create an error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
