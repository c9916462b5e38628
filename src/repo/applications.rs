//! Application repository

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;

use crate::config::CredentialStore;
use crate::envelope::Resource;
use crate::gateway::ApiGateway;
use crate::request::RequestBuilder;
use crate::{Error, Result};

/// Application entity fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationEntity {
    /// Application name
    #[serde(default)]
    pub name: String,
    /// Requested state, `STARTED` or `STOPPED`
    #[serde(default)]
    pub state: String,
    /// Number of desired instances
    #[serde(default)]
    pub instances: u32,
    /// Memory limit per instance, in megabytes
    #[serde(default)]
    pub memory: u64,
    /// Owning space guid
    #[serde(default)]
    pub space_guid: String,
}

/// Repository for the applications collection
pub struct ApplicationRepository {
    gateway: Arc<ApiGateway>,
    store: Arc<CredentialStore>,
}

impl ApplicationRepository {
    /// Create a repository over the shared gateway and store
    #[must_use]
    pub fn new(gateway: Arc<ApiGateway>, store: Arc<CredentialStore>) -> Self {
        Self { gateway, store }
    }

    /// Find one application by name in the targeted space
    pub async fn find_by_name(&self, name: &str) -> Result<Resource<ApplicationEntity>> {
        let space = self
            .store
            .space_fields()
            .ok_or_else(|| Error::Config("no space targeted".to_string()))?;
        let request = RequestBuilder::new(
            Method::GET,
            self.gateway.target(),
            format!("/v2/spaces/{}/apps", space.guid),
        )
        .filter("name", name)
        .query("inline-relations-depth", 1)
        .build()?;
        self.gateway.find_first(request, "application").await
    }

    /// Fetch one application by guid
    pub async fn get(&self, guid: &str) -> Result<Resource<ApplicationEntity>> {
        let request = RequestBuilder::new(
            Method::GET,
            self.gateway.target(),
            format!("/v2/apps/{guid}"),
        )
        .build()?;
        self.gateway.fetch(request).await
    }

    /// Delete an application along with its service bindings and routes
    pub async fn delete(&self, guid: &str) -> Result<()> {
        let request = RequestBuilder::new(
            Method::DELETE,
            self.gateway.target(),
            format!("/v2/apps/{guid}"),
        )
        .query("recursive", true)
        .build()?;
        self.gateway.accept(request).await
    }
}
