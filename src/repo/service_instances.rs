//! Service instance and binding repository
//!
//! Space-scoped lookups include user-provided instances; the listing under
//! `/v2/spaces/{guid}/service_instances` only returns them when asked via
//! `return_user_provided_service_instances=true`.

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;

use crate::config::CredentialStore;
use crate::envelope::Resource;
use crate::gateway::ApiGateway;
use crate::request::RequestBuilder;
use crate::{Error, Result};

/// Service plan nested inside an instance envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicePlanEntity {
    /// Plan name
    #[serde(default)]
    pub name: String,
    /// Guid of the offering the plan belongs to
    #[serde(default)]
    pub service_guid: String,
}

/// Service binding entity fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceBindingEntity {
    /// Bound application guid
    #[serde(default)]
    pub app_guid: String,
}

/// Service instance entity fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceInstanceEntity {
    /// Instance name
    #[serde(default)]
    pub name: String,
    /// Provisioned plan (inline relation, absent for user-provided instances)
    #[serde(default)]
    pub service_plan: Option<Resource<ServicePlanEntity>>,
    /// Bindings to applications (inline relation)
    #[serde(default)]
    pub service_bindings: Vec<Resource<ServiceBindingEntity>>,
}

/// Repository for service instances and their bindings
pub struct ServiceInstanceRepository {
    gateway: Arc<ApiGateway>,
    store: Arc<CredentialStore>,
}

impl ServiceInstanceRepository {
    /// Create a repository over the shared gateway and store
    #[must_use]
    pub fn new(gateway: Arc<ApiGateway>, store: Arc<CredentialStore>) -> Self {
        Self { gateway, store }
    }

    /// Find one instance by name in the targeted space
    pub async fn find_by_name(&self, name: &str) -> Result<Resource<ServiceInstanceEntity>> {
        let space = self
            .store
            .space_fields()
            .ok_or_else(|| Error::Config("no space targeted".to_string()))?;
        let request = RequestBuilder::new(
            Method::GET,
            self.gateway.target(),
            format!("/v2/spaces/{}/service_instances", space.guid),
        )
        .filter("name", name)
        .query("return_user_provided_service_instances", true)
        .query("inline-relations-depth", 1)
        .build()?;
        self.gateway.find_first(request, "service instance").await
    }

    /// Provision a new instance of a plan in a space.
    ///
    /// Provisioning may complete asynchronously; the returned envelope
    /// carries whatever state the broker reported at accept time.
    pub async fn create(
        &self,
        name: &str,
        plan_guid: &str,
        space_guid: &str,
    ) -> Result<Resource<ServiceInstanceEntity>> {
        let request = RequestBuilder::new(
            Method::POST,
            self.gateway.target(),
            "/v2/service_instances",
        )
        .query("accepts_incomplete", true)
        .field("name", name)
        .field("service_plan_guid", plan_guid)
        .field("space_guid", space_guid)
        .build()?;
        self.gateway.fetch(request).await
    }

    /// Bind an instance to an application
    pub async fn bind(&self, instance_guid: &str, app_guid: &str) -> Result<()> {
        let request = RequestBuilder::new(
            Method::POST,
            self.gateway.target(),
            "/v2/service_bindings",
        )
        .field("app_guid", app_guid)
        .field("service_instance_guid", instance_guid)
        .build()?;
        self.gateway.accept(request).await
    }

    /// Delete a binding
    pub async fn unbind(&self, binding_guid: &str) -> Result<()> {
        let request = RequestBuilder::new(
            Method::DELETE,
            self.gateway.target(),
            format!("/v2/service_bindings/{binding_guid}"),
        )
        .build()?;
        self.gateway.accept(request).await
    }

    /// Deprovision an instance
    pub async fn delete(&self, instance_guid: &str) -> Result<()> {
        let request = RequestBuilder::new(
            Method::DELETE,
            self.gateway.target(),
            format!("/v2/service_instances/{instance_guid}"),
        )
        .query("accepts_incomplete", true)
        .build()?;
        self.gateway.accept(request).await
    }
}
