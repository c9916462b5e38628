//! End-to-end gateway tests over a real HTTP transport
//!
//! These run the full stack (request builder, reqwest executor, token
//! refresh, pagination) against a local mock control-plane.

use std::sync::Arc;

use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nimbus_api::config::{CredentialStore, Settings, TargetInformation, TokenStore};
use nimbus_api::error::TransportError;
use nimbus_api::gateway::ApiGateway;
use nimbus_api::net::ApiRequest;
use nimbus_api::repo::{OrganizationRepository, RouteRepository};
use nimbus_api::Error;

fn store_for(server: &MockServer) -> Arc<CredentialStore> {
    let store = Arc::new(CredentialStore::new(Settings::default()));
    store.set_target_information(TargetInformation {
        api_endpoint: server.uri(),
        auth_endpoint: server.uri(),
        ..TargetInformation::default()
    });
    store.set_token_information(
        "stale-access".to_string(),
        "the-refresh-token".to_string(),
        String::new(),
    );
    store
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_the_request_retried() {
    let server = MockServer::start().await;

    // First call with the stale token is rejected.
    Mock::given(method("GET"))
        .and(path("/v2/organizations"))
        .and(header("authorization", "bearer stale-access"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"code":1000}"#))
        .expect(1)
        .mount(&server)
        .await;

    // The refresh exchange authenticates with the default client.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header("authorization", "Basic Y2Y6"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=the-refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"access_token":"fresh-access","refresh_token":"fresh-refresh","token_type":"bearer"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    // The retry carries the fresh token.
    Mock::given(method("GET"))
        .and(path("/v2/organizations"))
        .and(header("authorization", "bearer fresh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{ "resources": [
                { "metadata": { "guid": "org1-guid" }, "entity": { "name": "Org1" } }
            ]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let gateway = Arc::new(ApiGateway::from_store(store.clone()));
    let repo = OrganizationRepository::new(gateway);

    let org = repo.find_by_name("Org1").await.unwrap();
    assert_eq!(org.guid(), "org1-guid");

    // Both tokens were rotated in the store.
    assert_eq!(store.access_token(), "fresh-access");
    assert_eq!(store.refresh_token(), "fresh-refresh");
}

#[tokio::test]
async fn listing_follows_the_cursor_across_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/spaces/my-space-guid/routes"))
        .and(query_param("inline-relations-depth", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "next_url": "/v2/spaces/my-space-guid/routes?inline-relations-depth=1&page=2",
                "resources": [
                    { "metadata": { "guid": "route-1-guid" }, "entity": { "host": "route-1" } }
                ]
            }"#,
        ))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/spaces/my-space-guid/routes"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{ "resources": [
                { "metadata": { "guid": "route-2-guid" }, "entity": { "host": "route-2" } }
            ]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.set_organization_information("my-org-guid", "my-org");
    store.set_space_information("my-space-guid", "my-space");
    let gateway = Arc::new(ApiGateway::from_store(store.clone()));
    let repo = RouteRepository::new(gateway, store);

    let mut hosts = Vec::new();
    repo.list(|route| {
        hosts.push(route.entity.host.clone());
        true
    })
    .await
    .unwrap();

    assert_eq!(hosts, vec!["route-1", "route-2"]);
}

#[tokio::test]
async fn lookup_with_an_empty_result_list_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/organizations"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{ "resources": [] }"#))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let gateway = Arc::new(ApiGateway::from_store(store));
    let repo = OrganizationRepository::new(gateway);

    let err = repo.find_by_name("no-such-org").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn reservation_endpoint_answers_with_status_not_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/routes/reserved/domain/taken-domain/host/my-host"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/routes/reserved/domain/free-domain/host/my-host"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let gateway = Arc::new(ApiGateway::from_store(store.clone()));
    let repo = RouteRepository::new(gateway, store);

    assert!(repo.check_reserved("my-host", "taken-domain", "").await.unwrap());
    assert!(!repo.check_reserved("my-host", "free-domain", "").await.unwrap());
}

#[tokio::test]
async fn refused_connection_classifies_as_a_transport_error() {
    // Bind then drop to obtain a port with nothing listening.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let store = Arc::new(CredentialStore::new(Settings::default()));
    store.set_target_information(TargetInformation {
        api_endpoint: format!("http://127.0.0.1:{port}"),
        auth_endpoint: format!("http://127.0.0.1:{port}"),
        ..TargetInformation::default()
    });
    let gateway = ApiGateway::from_store(store);

    let err = gateway
        .accept(ApiRequest::get(format!("http://127.0.0.1:{port}/v2/info")))
        .await
        .unwrap_err();

    match err {
        Error::Transport { reason, .. } => {
            assert!(matches!(reason, TransportError::Connect(_)), "got {reason:?}");
        }
        other => panic!("expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_bodies_pass_through_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/organizations/g"))
        .respond_with(
            ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"),
        )
        .mount(&server)
        .await;

    let store = store_for(&server);
    let gateway = ApiGateway::from_store(store);

    let err = gateway
        .accept(ApiRequest::get(format!("{}/v2/organizations/g", server.uri())))
        .await
        .unwrap_err();

    match err {
        Error::Api { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "<html>bad gateway</html>");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}
