#![forbid(unsafe_code)]

//! Error types.
//!
//! [`HostError`] is what a [`DocumentHost`](crate::DocumentHost) reports when
//! a single element cannot be read or written. The engine never propagates
//! it; each one becomes a skipped element and a log event.

use thiserror::Error;

/// Failure of one host operation on one element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The element left the document between scan and use.
    #[error("element is detached from the document")]
    Detached,
    /// The host lacks a capability the operation needs.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    /// A call into the host platform threw.
    #[error("host call failed: {0}")]
    Js(String),
}

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
