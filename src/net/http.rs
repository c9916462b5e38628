//! HTTP executor backed by reqwest
//!
//! The client is rebuilt per call: the skip-TLS-validation flag belongs to
//! the current target and targets can change mid-session, so the policy is
//! read fresh every time instead of being baked into a cached client. The
//! dial timeout bounds connection establishment only - body reads of large
//! listings are legitimately slow and get no deadline here.

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, header};
use tracing::debug;

use super::{ApiRequest, ApiResponse, Executor};
use crate::config::TransportPolicy;
use crate::error::TransportError;
use crate::{Error, Result};

/// Transport executor performing real network calls
pub struct HttpExecutor {
    policy: Arc<dyn TransportPolicy>,
}

impl HttpExecutor {
    /// Create an executor reading dial timeout and TLS policy from `policy`
    #[must_use]
    pub fn new(policy: Arc<dyn TransportPolicy>) -> Self {
        Self { policy }
    }

    fn client(&self) -> Result<Client> {
        Client::builder()
            .connect_timeout(self.policy.dial_timeout())
            .danger_accept_invalid_certs(self.policy.skip_ssl_validation())
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let client = self.client()?;

        let mut builder = client
            .request(request.method.clone(), &request.url)
            .header(header::ACCEPT, "application/json");

        if let Some(ref auth) = request.authorization {
            builder = builder.header(header::AUTHORIZATION, auth.clone());
        }

        if let Some(ref body) = request.body {
            let content_type = request
                .content_type
                .as_deref()
                .unwrap_or("application/json");
            builder = builder
                .header(header::CONTENT_TYPE, content_type)
                .body(body.clone());
        }

        debug!(method = %request.method, url = %request.url, "Executing request");

        let response = builder
            .send()
            .await
            .map_err(|e| classify(&request.url, &e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| Error::Transport {
            url: request.url.clone(),
            reason: TransportError::Other(format!("failed to read body: {e}")),
        })?;

        debug!(method = %request.method, url = %request.url, status, "Received response");

        Ok(ApiResponse { status, body })
    }
}

/// Map a reqwest failure onto the transport taxonomy.
///
/// Timeouts and refused connections are plain `Connect`/`Timeout`; a failure
/// during connection establishment whose cause chain mentions TLS keeps a
/// distinguishable sub-reason so certificate problems are diagnosable.
fn classify(url: &str, err: &reqwest::Error) -> Error {
    let reason = if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        if is_tls_failure(err) {
            TransportError::Tls(err.to_string())
        } else {
            TransportError::Connect(err.to_string())
        }
    } else {
        TransportError::Other(err.to_string())
    };

    Error::Transport {
        url: url.to_string(),
        reason,
    }
}

fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut source: Option<&dyn StdError> = Some(err);
    while let Some(cause) = source {
        let text = cause.to_string().to_lowercase();
        if text.contains("tls") || text.contains("certificate") || text.contains("handshake") {
            return true;
        }
        source = cause.source();
    }
    false
}
