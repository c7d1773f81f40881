//! Error types for the ingestion pipeline and catalog queries
//!
//! This module defines custom error types used throughout the application.

use std::time::Duration;
use thiserror::Error;

use crate::models::ResourceKind;

/// Errors that can occur while fetching one upstream resource collection
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Invalid endpoint URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request could not be sent or the connection failed before a response
    #[error("Failed to fetch from {url}: {reason}")]
    Network { url: String, reason: String },

    /// Attempt deadline expired before the response was read
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// Upstream answered with something other than 200
    #[error("API unexpected status: {0}")]
    Status(u16),

    /// Body is not valid JSON for the expected shape
    #[error("JSON decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// Every attempt failed; wraps the last per-attempt error
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetryExhausted {
        operation: &'static str,
        attempts: u32,
        source: Box<FetchError>,
    },

    /// Shutdown fired while an attempt or backoff was in progress
    #[error("{operation} cancelled on attempt {attempt}")]
    Cancelled {
        operation: &'static str,
        attempt: u32,
    },

    /// Fetch task ended without reporting an outcome
    #[error("{operation} task aborted: {reason}")]
    TaskAborted {
        operation: &'static str,
        reason: String,
    },
}

impl FetchError {
    /// Transport-level failure, timeouts included
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout(_))
    }

    /// Last per-attempt error, unwrapping `RetryExhausted`
    pub fn last_attempt(&self) -> &FetchError {
        match self {
            Self::RetryExhausted { source, .. } => source.last_attempt(),
            other => other,
        }
    }
}

/// Errors from catalog lookups and relation processing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No record with the requested id
    #[error("No {kind} found for ID {id}")]
    NotFound { kind: ResourceKind, id: i64 },

    /// Date string is not dd-mm-yyyy
    #[error("Invalid date format: {0:?}")]
    InvalidDate(String),
}
