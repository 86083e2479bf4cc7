//! Error types for the mailbox-poll crate.
//!
//! All errors implement [`std::error::Error`] and provide context about what went wrong.
//! Errors are categorized by their retryability - see [`Error::is_retryable`].
//!
//! Retrieval errors ([`Error::Request`], [`Error::Status`], [`Error::Decode`]) are
//! produced by a single fetch. The poll loop absorbs them and treats the attempt as
//! "no messages yet", so the only error a running poll surfaces is
//! [`Error::WaitTimeout`].

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running a mailbox poll.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// The retrieval endpoint is not a usable absolute http(s) URL.
    #[error("invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint {
        /// The endpoint as supplied.
        endpoint: String,
        /// Why it was rejected.
        message: String,
    },

    /// A subject/body/extraction pattern failed to compile.
    #[error("invalid pattern '{pattern}'")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// An auth header name or value cannot be sent over HTTP.
    #[error("invalid HTTP header: {name}")]
    InvalidHeader {
        /// The header name that was being built.
        name: String,
    },

    /// The HTTP client could not be constructed (TLS backend, proxy, ...).
    #[error("failed to build HTTP client")]
    HttpClient {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Retrieval errors (RETRYABLE - absorbed by the poll loop)
    // ─────────────────────────────────────────────────────────────────────────
    /// The request could not be sent or its body could not be read.
    #[error("request to {endpoint} failed")]
    Request {
        /// The endpoint (without query string).
        endpoint: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success status.
    #[error("unexpected status {status} from {endpoint}")]
    Status {
        /// The endpoint (without query string).
        endpoint: String,
        /// The returned HTTP status.
        status: StatusCode,
    },

    /// The response body was not JSON.
    #[error("undecodable response body from {endpoint}")]
    Decode {
        /// The endpoint (without query string).
        endpoint: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Terminal poll outcomes (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// No matching message arrived before the deadline.
    #[error("no matching message arrived within {timeout:?} ({attempts} attempts)")]
    WaitTimeout {
        /// The deadline that was exceeded.
        timeout: Duration,
        /// Number of retrieval attempts made.
        attempts: u32,
    },

    /// A single lookup found no matching message.
    #[error("no matching message found")]
    NoMatch,
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might succeed on retry.
    ///
    /// The poll loop relies on this split: everything retryable is swallowed and
    /// the next attempt is scheduled.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Request { .. } | Error::Status { .. } | Error::Decode { .. } => true,

            Error::InvalidConfig { .. }
            | Error::InvalidEndpoint { .. }
            | Error::InvalidPattern { .. }
            | Error::InvalidHeader { .. }
            | Error::HttpClient { .. }
            | Error::WaitTimeout { .. }
            | Error::NoMatch => false,
        }
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig { .. }
            | Error::InvalidEndpoint { .. }
            | Error::InvalidPattern { .. }
            | Error::InvalidHeader { .. }
            | Error::HttpClient { .. } => ErrorCategory::Configuration,

            Error::Request { .. } => ErrorCategory::Network,

            Error::Status { .. } => ErrorCategory::Protocol,

            Error::Decode { .. } => ErrorCategory::Parse,

            Error::WaitTimeout { .. } => ErrorCategory::Timeout,

            Error::NoMatch => ErrorCategory::NotFound,
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// Network connectivity errors.
    Network,
    /// Timeout errors.
    Timeout,
    /// Provider answered with an error status.
    Protocol,
    /// Response body parsing errors.
    Parse,
    /// No matching message found.
    NotFound,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::NotFound => write!(f, "not_found"),
        }
    }
}
