//! Bearer decoration and token refresh
//!
//! The refresher owns the OAuth exchange against the token service. It never
//! loops: the gateway calls [`TokenRefresher::refresh`] at most once per
//! request cycle, and a failed exchange leaves the stored refresh token
//! untouched so the session is not silently logged out.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info};
use url::form_urlencoded;

use crate::config::{GrantType, TokenStore};
use crate::net::{ApiRequest, Executor};
use crate::{Error, Result};

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenGrantResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Attaches bearer credentials and performs the single refresh exchange
pub struct TokenRefresher {
    tokens: Arc<dyn TokenStore>,
    executor: Arc<dyn Executor>,
}

impl TokenRefresher {
    /// Create a refresher over the given token store and executor
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenStore>, executor: Arc<dyn Executor>) -> Self {
        Self { tokens, executor }
    }

    /// Decorate `request` with the current access token.
    ///
    /// Reads the store every time so a retry after refresh picks up the new
    /// token rather than reusing the stale header.
    pub fn decorate(&self, request: &mut ApiRequest) {
        let token = self.tokens.access_token();
        if !token.is_empty() {
            request.authorization = Some(format!("bearer {token}"));
        }
    }

    /// Exchange the refresh token for a new token pair and update the store.
    ///
    /// Under the client-credentials grant there is no refresh token to
    /// rotate; the exchange re-authenticates with the client secret and only
    /// the access token is replaced.
    pub async fn refresh(&self) -> Result<()> {
        let auth_endpoint = self.tokens.authorization_endpoint();
        if auth_endpoint.is_empty() {
            return Err(Error::Config(
                "no authorization endpoint set for this target".to_string(),
            ));
        }

        let grant = self.tokens.uaa_grant_type();
        let body = match grant {
            GrantType::Password => form_urlencoded::Serializer::new(String::new())
                .append_pair("grant_type", "refresh_token")
                .append_pair("refresh_token", &self.tokens.refresh_token())
                .finish(),
            GrantType::ClientCredentials => form_urlencoded::Serializer::new(String::new())
                .append_pair("grant_type", GrantType::ClientCredentials.as_str())
                .finish(),
        };

        let (client_id, client_secret) = self.tokens.uaa_client_credentials();
        let basic = STANDARD.encode(format!("{client_id}:{client_secret}"));

        let request = ApiRequest {
            method: Method::POST,
            url: format!("{}/oauth/token", auth_endpoint.trim_end_matches('/')),
            authorization: Some(format!("Basic {basic}")),
            content_type: Some("application/x-www-form-urlencoded".to_string()),
            body: Some(body),
        };

        debug!(grant = grant.as_str(), "Exchanging credentials for a new access token");

        let response = self.executor.execute(&request).await?;
        if !response.is_success() {
            return Err(Error::Unauthorized(format!(
                "token refresh failed: HTTP {} - {}",
                response.status, response.body
            )));
        }

        let grant_response: TokenGrantResponse = serde_json::from_str(&response.body)
            .map_err(|e| Error::Malformed(format!("token response: {e}")))?;

        match grant {
            GrantType::Password => {
                let refresh = grant_response
                    .refresh_token
                    .unwrap_or_else(|| self.tokens.refresh_token());
                self.tokens.set_token_information(
                    grant_response.access_token,
                    refresh,
                    self.tokens.ssh_oauth_client(),
                );
            }
            GrantType::ClientCredentials => {
                self.tokens.set_access_token(grant_response.access_token);
            }
        }

        info!("Access token refreshed");
        Ok(())
    }
}
