//! Error types for the Nimbus resource gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Gateway errors
///
/// Every non-2xx control-plane response and every transport failure maps to
/// exactly one variant; 2xx responses never produce one. `NotFound` covers
/// both a true 404 and a filter lookup whose `resources` list came back
/// empty - callers cannot tell the two apart, by contract.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource does not exist (HTTP 404 or empty filter result)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Credentials rejected after the single refresh-and-retry cycle
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource state conflict (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-2xx API response, raw body kept for diagnostics
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Failure below the HTTP layer (connect, timeout, TLS)
    #[error("Transport error reaching {url}: {reason}")]
    Transport {
        /// Target URL of the failed call
        url: String,
        /// Classified cause
        reason: TransportError,
    },

    /// Response arrived with 2xx but the payload could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Configuration error (unparseable target URL, missing endpoint)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Transport failure classification
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// Dial timeout elapsed before the connection was established
    #[error("connection timed out: {0}")]
    Timeout(String),

    /// TLS handshake or certificate verification failed
    #[error("TLS failure: {0}")]
    Tls(String),

    /// Other I/O failure on an established connection
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True when the error is the uniform not-found signal, regardless of
    /// whether it came from a 404 or an empty-list remap.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
