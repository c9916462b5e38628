//! User and organization-role repository
//!
//! Role grants are idempotent PUT/DELETE calls against the role collection
//! under the organization; the control-plane keys each role by its own path
//! segment rather than a role field.

use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;

use crate::envelope::Resource;
use crate::gateway::ApiGateway;
use crate::request::RequestBuilder;
use crate::Result;

/// Organization role a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgRole {
    /// Manages the organization
    OrgManager,
    /// Manages billing for the organization
    BillingManager,
    /// Read-only visibility into the organization
    OrgAuditor,
}

impl OrgRole {
    /// Collection segment under `/v2/organizations/{guid}/`
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::OrgManager => "managers",
            Self::BillingManager => "billing_managers",
            Self::OrgAuditor => "auditors",
        }
    }
}

/// User entity fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserEntity {
    /// Login name
    #[serde(default)]
    pub username: String,
    /// Administrator flag
    #[serde(default)]
    pub admin: bool,
}

/// Repository for users and their organization roles
pub struct UserRepository {
    gateway: Arc<ApiGateway>,
}

impl UserRepository {
    /// Create a repository over the shared gateway
    #[must_use]
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Visit every user holding `role` in the organization
    pub async fn list_in_org_for_role<F>(
        &self,
        org_guid: &str,
        role: OrgRole,
        visit: F,
    ) -> Result<()>
    where
        F: FnMut(Resource<UserEntity>) -> bool,
    {
        let request = RequestBuilder::new(
            Method::GET,
            self.gateway.target(),
            format!("/v2/organizations/{org_guid}/{}", role.path_segment()),
        )
        .build()?;
        self.gateway.list_paginated(request, visit).await
    }

    /// Grant `role` in the organization to the user
    pub async fn set_org_role(&self, user_guid: &str, org_guid: &str, role: OrgRole) -> Result<()> {
        let request = RequestBuilder::new(
            Method::PUT,
            self.gateway.target(),
            format!(
                "/v2/organizations/{org_guid}/{}/{user_guid}",
                role.path_segment()
            ),
        )
        .build()?;
        self.gateway.accept(request).await
    }

    /// Revoke `role` in the organization from the user
    pub async fn unset_org_role(
        &self,
        user_guid: &str,
        org_guid: &str,
        role: OrgRole,
    ) -> Result<()> {
        let request = RequestBuilder::new(
            Method::DELETE,
            self.gateway.target(),
            format!(
                "/v2/organizations/{org_guid}/{}/{user_guid}",
                role.path_segment()
            ),
        )
        .build()?;
        self.gateway.accept(request).await
    }
}
