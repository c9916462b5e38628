//! Route repository
//!
//! Routes are looked up by filter (`q=host:...;domain_guid:...`) where an
//! empty result means `NotFound`, but reservation checks use the dedicated
//! `/v2/routes/reserved/...` endpoint which answers 204/404 instead. Both
//! conventions are deliberate control-plane behavior and both are kept.

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;

use crate::config::CredentialStore;
use crate::envelope::Resource;
use crate::gateway::ApiGateway;
use crate::repo::applications::ApplicationEntity;
use crate::repo::service_instances::ServiceInstanceEntity;
use crate::request::RequestBuilder;
use crate::{Error, Result};

/// Domain entity nested inside a route envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainEntity {
    /// Domain name, e.g. `example.com`
    #[serde(default)]
    pub name: String,
}

/// Space entity nested inside a route envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpaceEntity {
    /// Space name
    #[serde(default)]
    pub name: String,
}

/// Route entity fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteEntity {
    /// Host part; empty is legal and distinct from absent
    #[serde(default)]
    pub host: String,
    /// Path part, empty when the route has none
    #[serde(default)]
    pub path: String,
    /// TCP port for router-group routes
    #[serde(default)]
    pub port: Option<u32>,
    /// Owning domain (inline relation)
    #[serde(default)]
    pub domain: Option<Resource<DomainEntity>>,
    /// Owning space (inline relation)
    #[serde(default)]
    pub space: Option<Resource<SpaceEntity>>,
    /// Bound route service, if any (inline relation)
    #[serde(default)]
    pub service_instance: Option<Resource<ServiceInstanceEntity>>,
    /// Applications the route is mapped to (inline relation)
    #[serde(default)]
    pub apps: Vec<Resource<ApplicationEntity>>,
}

/// Repository for the routes collection
pub struct RouteRepository {
    gateway: Arc<ApiGateway>,
    store: Arc<CredentialStore>,
}

impl RouteRepository {
    /// Create a repository over the shared gateway and store
    #[must_use]
    pub fn new(gateway: Arc<ApiGateway>, store: Arc<CredentialStore>) -> Self {
        Self { gateway, store }
    }

    /// Visit every route in the targeted space
    pub async fn list<F>(&self, visit: F) -> Result<()>
    where
        F: FnMut(Resource<RouteEntity>) -> bool,
    {
        let space = self
            .store
            .space_fields()
            .ok_or_else(|| Error::Config("no space targeted".to_string()))?;
        let request = RequestBuilder::new(
            Method::GET,
            self.gateway.target(),
            format!("/v2/spaces/{}/routes", space.guid),
        )
        .query("inline-relations-depth", 1)
        .build()?;
        self.gateway.list_paginated(request, visit).await
    }

    /// Visit every route across all spaces of the targeted organization
    pub async fn list_all<F>(&self, visit: F) -> Result<()>
    where
        F: FnMut(Resource<RouteEntity>) -> bool,
    {
        let org = self
            .store
            .organization_fields()
            .ok_or_else(|| Error::Config("no organization targeted".to_string()))?;
        let request = RequestBuilder::new(Method::GET, self.gateway.target(), "/v2/routes")
            .filter("organization_guid", org.guid)
            .query("inline-relations-depth", 1)
            .build()?;
        self.gateway.list_paginated(request, visit).await
    }

    /// Find one route by host and domain, optionally narrowed by path and
    /// port. An empty path or a `None` port is not part of the filter.
    pub async fn find(
        &self,
        host: &str,
        domain_guid: &str,
        path: &str,
        port: Option<u32>,
    ) -> Result<Resource<RouteEntity>> {
        let mut builder = RequestBuilder::new(Method::GET, self.gateway.target(), "/v2/routes")
            .filter("host", host)
            .filter("domain_guid", domain_guid);
        if !path.is_empty() {
            builder = builder.filter("path", normalize_path(path));
        }
        if let Some(port) = port {
            builder = builder.filter("port", port);
        }
        let request = builder.query("inline-relations-depth", 1).build()?;
        self.gateway.find_first(request, "route").await
    }

    /// Create a route in a space.
    ///
    /// Empty host/path and a `None` port are omitted from the body entirely;
    /// `generate_port` is always present. The control-plane treats an absent
    /// host as "generate one", which is not the same as an empty host.
    pub async fn create_in_space(
        &self,
        host: &str,
        path: &str,
        domain_guid: &str,
        space_guid: &str,
        port: Option<u32>,
        generate_port: bool,
    ) -> Result<Resource<RouteEntity>> {
        let mut builder = RequestBuilder::new(Method::POST, self.gateway.target(), "/v2/routes")
            .query("inline-relations-depth", 1)
            .query("async", true);
        if !host.is_empty() {
            builder = builder.field("host", host);
        }
        if !path.is_empty() {
            builder = builder.field("path", normalize_path(path));
        }
        builder = builder
            .field_opt("port", port)
            .field("domain_guid", domain_guid)
            .field("space_guid", space_guid)
            .field("generate_port", generate_port);
        self.gateway.fetch(builder.build()?).await
    }

    /// Ask the reservation endpoint whether `host`.`domain` (plus optional
    /// path) is taken: 204 means reserved, 404 means free.
    pub async fn check_reserved(
        &self,
        host: &str,
        domain_guid: &str,
        path: &str,
    ) -> Result<bool> {
        let mut builder = RequestBuilder::new(
            Method::GET,
            self.gateway.target(),
            format!("/v2/routes/reserved/domain/{domain_guid}/host/{host}"),
        );
        if !path.is_empty() {
            builder = builder.query("path", normalize_path(path));
        }
        match self.gateway.accept(builder.build()?).await {
            Ok(()) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Map a route to an application
    pub async fn bind(&self, route_guid: &str, app_guid: &str) -> Result<()> {
        let request = RequestBuilder::new(
            Method::PUT,
            self.gateway.target(),
            format!("/v2/apps/{app_guid}/routes/{route_guid}"),
        )
        .build()?;
        self.gateway.accept(request).await
    }

    /// Remove a route mapping from an application
    pub async fn unbind(&self, route_guid: &str, app_guid: &str) -> Result<()> {
        let request = RequestBuilder::new(
            Method::DELETE,
            self.gateway.target(),
            format!("/v2/apps/{app_guid}/routes/{route_guid}"),
        )
        .build()?;
        self.gateway.accept(request).await
    }

    /// Delete a route
    pub async fn delete(&self, route_guid: &str) -> Result<()> {
        let request = RequestBuilder::new(
            Method::DELETE,
            self.gateway.target(),
            format!("/v2/routes/{route_guid}"),
        )
        .build()?;
        self.gateway.accept(request).await
    }
}

/// Filter and body paths always carry a leading slash on the wire
fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
