//! Organization repository

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;

use crate::envelope::Resource;
use crate::gateway::ApiGateway;
use crate::request::RequestBuilder;
use crate::Result;

/// Space summary nested inside an organization envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpaceSummary {
    /// Space name
    #[serde(default)]
    pub name: String,
}

/// Domain summary nested inside an organization envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainSummary {
    /// Domain name
    #[serde(default)]
    pub name: String,
}

/// Organization entity fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationEntity {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Quota definition guid
    #[serde(default)]
    pub quota_definition_guid: String,
    /// Spaces of the organization (inline relation)
    #[serde(default)]
    pub spaces: Vec<Resource<SpaceSummary>>,
    /// Domains visible to the organization (inline relation)
    #[serde(default)]
    pub domains: Vec<Resource<DomainSummary>>,
}

/// Repository for the organizations collection
pub struct OrganizationRepository {
    gateway: Arc<ApiGateway>,
}

impl OrganizationRepository {
    /// Create a repository over the shared gateway
    #[must_use]
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Visit every organization visible to the session
    pub async fn list<F>(&self, visit: F) -> Result<()>
    where
        F: FnMut(Resource<OrganizationEntity>) -> bool,
    {
        let request =
            RequestBuilder::new(Method::GET, self.gateway.target(), "/v2/organizations")
                .query("inline-relations-depth", 1)
                .build()?;
        self.gateway.list_paginated(request, visit).await
    }

    /// Find one organization by exact name
    pub async fn find_by_name(&self, name: &str) -> Result<Resource<OrganizationEntity>> {
        let request =
            RequestBuilder::new(Method::GET, self.gateway.target(), "/v2/organizations")
                .filter("name", name)
                .query("inline-relations-depth", 1)
                .build()?;
        self.gateway.find_first(request, "organization").await
    }

    /// Fetch one organization by guid
    pub async fn get(&self, guid: &str) -> Result<Resource<OrganizationEntity>> {
        let request = RequestBuilder::new(
            Method::GET,
            self.gateway.target(),
            format!("/v2/organizations/{guid}"),
        )
        .build()?;
        self.gateway.fetch(request).await
    }

    /// Delete an organization and everything it contains
    pub async fn delete(&self, guid: &str) -> Result<()> {
        let request = RequestBuilder::new(
            Method::DELETE,
            self.gateway.target(),
            format!("/v2/organizations/{guid}"),
        )
        .query("recursive", true)
        .build()?;
        self.gateway.accept(request).await
    }
}
