//! Gateway core: authenticated request cycles and response mapping
//!
//! Every resource operation flows through [`ApiGateway::perform`]: decorate
//! with the current bearer token, execute, and map the status. A 401 gets
//! exactly one refresh-and-retry; every other failure propagates unchanged
//! so outages are never masked behind silent retries.

mod auth;
mod paginate;

pub use auth::TokenRefresher;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{CredentialStore, TargetSource};
use crate::envelope::{Page, Resource};
use crate::net::{ApiRequest, ApiResponse, Executor, HttpExecutor};
use crate::{Error, Result};

/// Shared gateway for all resource repositories
pub struct ApiGateway {
    executor: Arc<dyn Executor>,
    refresher: TokenRefresher,
    target: Arc<dyn TargetSource>,
}

impl ApiGateway {
    /// Create a gateway from its collaborators
    #[must_use]
    pub fn new(
        executor: Arc<dyn Executor>,
        refresher: TokenRefresher,
        target: Arc<dyn TargetSource>,
    ) -> Self {
        Self {
            executor,
            refresher,
            target,
        }
    }

    /// Wire up the production gateway over one credential store
    #[must_use]
    pub fn from_store(store: Arc<CredentialStore>) -> Self {
        let executor: Arc<dyn Executor> = Arc::new(HttpExecutor::new(store.clone()));
        let refresher = TokenRefresher::new(store.clone(), executor.clone());
        Self::new(executor, refresher, store)
    }

    /// Control-plane base URL for the current target
    #[must_use]
    pub fn target(&self) -> String {
        self.target.target()
    }

    /// Execute one authenticated request cycle.
    ///
    /// On 401: one refresh exchange, one retry. A failed exchange surfaces
    /// the original 401 unchanged; a second 401 on the retry is final.
    pub async fn perform(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut request = request;
        self.refresher.decorate(&mut request);

        let response = self.executor.execute(&request).await?;
        if response.status != 401 {
            return map_response(response);
        }

        debug!(url = %request.url, "Received 401, attempting token refresh");
        if let Err(e) = self.refresher.refresh().await {
            warn!(error = %e, "Token refresh failed");
            return map_response(response);
        }

        self.refresher.decorate(&mut request);
        let retried = self.executor.execute(&request).await?;
        map_response(retried)
    }

    /// Perform a request whose 2xx body is one `{metadata, entity}` envelope
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Resource<T>> {
        let response = self.perform(request).await?;
        decode_json(&response.body)
    }

    /// Perform a request whose 2xx body is one page of a listing
    pub async fn fetch_page<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Page<T>> {
        let response = self.perform(request).await?;
        decode_json(&response.body)
    }

    /// Lookup-by-filter: first resource of the first page.
    ///
    /// The control-plane reports "no match" as an empty 2xx list; that is
    /// remapped here so callers get the same `NotFound` they would get from
    /// a true 404. `what` names the resource for the error message.
    pub async fn find_first<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        what: &str,
    ) -> Result<Resource<T>> {
        let page: Page<T> = self.fetch_page(request).await?;
        page.resources
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(what.to_string()))
    }

    /// Perform a request where any 2xx response means done, body discarded
    pub async fn accept(&self, request: ApiRequest) -> Result<()> {
        self.perform(request).await.map(|_| ())
    }
}

/// Status-to-error table; 2xx passes through untouched
fn map_response(response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        return Ok(response);
    }
    Err(match response.status {
        401 => Error::Unauthorized(response.body),
        403 => Error::Forbidden(response.body),
        404 => Error::NotFound(response.body),
        409 => Error::Conflict(response.body),
        status => Error::Api {
            status,
            body: response.body,
        },
    })
}

/// Decode a 2xx body; failure is `Malformed`, never a silent empty result
pub(crate) fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    use super::*;
    use crate::config::{CredentialStore, Settings, TargetInformation, TokenStore};
    use crate::net::fake::FakeExecutor;

    #[derive(Debug, Deserialize)]
    struct NamedEntity {
        name: String,
    }

    fn harness() -> (Arc<CredentialStore>, Arc<FakeExecutor>, ApiGateway) {
        let store = Arc::new(CredentialStore::new(Settings::default()));
        store.set_target_information(TargetInformation {
            api_endpoint: "https://api.example.com".to_string(),
            auth_endpoint: "https://login.example.com".to_string(),
            ..TargetInformation::default()
        });
        store.set_token_information(
            "stale-access".to_string(),
            "the-refresh".to_string(),
            String::new(),
        );

        let executor = Arc::new(FakeExecutor::new());
        let refresher = TokenRefresher::new(store.clone(), executor.clone());
        let gateway = ApiGateway::new(executor.clone(), refresher, store.clone());
        (store, executor, gateway)
    }

    #[tokio::test]
    async fn refresh_and_retry_on_401() {
        let (store, executor, gateway) = harness();
        executor.push_response(401, r#"{"code":1000}"#);
        executor.push_response(
            200,
            r#"{"access_token":"fresh-access","refresh_token":"fresh-refresh"}"#,
        );
        executor.push_response(200, r#"{"metadata":{"guid":"g"},"entity":{"name":"n"}}"#);

        let resource: Resource<NamedEntity> = gateway
            .fetch(ApiRequest::get("https://api.example.com/v2/organizations/g"))
            .await
            .unwrap();
        assert_eq!(resource.entity.name, "n");

        let requests = executor.requests();
        // Two to the resource endpoint, one to the token endpoint, in order.
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].url, "https://api.example.com/v2/organizations/g");
        assert_eq!(requests[0].authorization.as_deref(), Some("bearer stale-access"));
        assert_eq!(requests[1].url, "https://login.example.com/oauth/token");
        assert_eq!(requests[2].url, "https://api.example.com/v2/organizations/g");
        // The store was updated before the retry was issued.
        assert_eq!(requests[2].authorization.as_deref(), Some("bearer fresh-access"));
        assert_eq!(store.access_token(), "fresh-access");
    }

    #[tokio::test]
    async fn failed_refresh_surfaces_the_original_401() {
        let (store, executor, gateway) = harness();
        executor.push_response(401, "original-401-body");
        executor.push_response(400, r#"{"error":"invalid_token"}"#);

        let err = gateway
            .accept(ApiRequest::get("https://api.example.com/v2/routes"))
            .await
            .unwrap_err();

        match err {
            Error::Unauthorized(body) => assert_eq!(body, "original-401-body"),
            other => panic!("expected Unauthorized, got {other:?}"),
        }
        // Stale refresh token left untouched - no silent logout.
        assert_eq!(store.refresh_token(), "the-refresh");
        assert_eq!(executor.call_count(), 2);
    }

    #[tokio::test]
    async fn second_401_is_final() {
        let (_store, executor, gateway) = harness();
        executor.push_response(401, "first");
        executor.push_response(200, r#"{"access_token":"fresh"}"#);
        executor.push_response(401, "still-unauthorized");

        let err = gateway
            .accept(ApiRequest::get("https://api.example.com/v2/routes"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Unauthorized(_)));
        // No second refresh, no third resource attempt.
        assert_eq!(executor.call_count(), 3);
    }

    #[tokio::test]
    async fn status_table_maps_to_typed_errors() {
        let cases = [
            (403, "Forbidden"),
            (404, "NotFound"),
            (409, "Conflict"),
            (502, "Api"),
        ];
        for (status, expected) in cases {
            let (_store, executor, gateway) = harness();
            executor.push_response(status, "body");
            let err = gateway
                .accept(ApiRequest::get("https://api.example.com/v2/routes"))
                .await
                .unwrap_err();
            let matched = match (&err, expected) {
                (Error::Forbidden(_), "Forbidden")
                | (Error::NotFound(_), "NotFound")
                | (Error::Conflict(_), "Conflict")
                | (Error::Api { .. }, "Api") => true,
                _ => false,
            };
            assert!(matched, "status {status}: unexpected {err:?}");
        }
    }

    #[tokio::test]
    async fn empty_list_lookup_is_not_found() {
        let (_store, executor, gateway) = harness();
        executor.push_response(200, r#"{ "resources": [] }"#);

        let err = gateway
            .find_first::<NamedEntity>(
                ApiRequest::get("https://api.example.com/v2/routes?q=host%3Ax"),
                "route",
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn malformed_2xx_body_is_malformed_not_empty() {
        let (_store, executor, gateway) = harness();
        executor.push_response(200, "<html>gateway timeout</html>");

        let err = gateway
            .fetch_page::<NamedEntity>(ApiRequest::get("https://api.example.com/v2/routes"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Malformed(_)));
    }

    #[tokio::test]
    async fn transport_errors_propagate_without_retry() {
        let (_store, executor, gateway) = harness();
        executor.push_error(Error::Transport {
            url: "https://api.example.com/v2/routes".to_string(),
            reason: crate::error::TransportError::Connect("refused".to_string()),
        });

        let err = gateway
            .accept(ApiRequest::get("https://api.example.com/v2/routes"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(executor.call_count(), 1);
    }
}
