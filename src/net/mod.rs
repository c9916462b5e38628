//! Transport layer for control-plane calls

mod http;

pub use self::http::HttpExecutor;

use async_trait::async_trait;
use reqwest::Method;

use crate::Result;

/// A fully-formed control-plane request
///
/// `Accept: application/json` is implied on every request; `Content-Type`
/// defaults to JSON whenever a body is present. The authorization header is
/// a plain field so the authenticator can re-decorate a request before a
/// retry without rebuilding it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP verb
    pub method: Method,
    /// Absolute request URL, query included
    pub url: String,
    /// Full `Authorization` header value, if decorated
    pub authorization: Option<String>,
    /// Overrides the JSON default when a body is present
    pub content_type: Option<String>,
    /// Serialized request body
    pub body: Option<String>,
}

impl ApiRequest {
    /// A bodyless GET for the given absolute URL
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            authorization: None,
            content_type: None,
            body: None,
        }
    }
}

/// A decoded-enough response: status plus raw body
///
/// Interpretation of the body (JSON decode, envelope mapping) happens in the
/// gateway, never here.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl ApiResponse {
    /// True for any 2xx status
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the physical call for one request
///
/// Implementations classify failures below the HTTP layer into
/// [`crate::Error::Transport`]; a response that arrived, whatever its
/// status, is returned as `Ok` for the response mapper to judge.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute the request and collect the full response body
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse>;
}
