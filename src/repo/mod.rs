//! Resource repositories
//!
//! Thin, per-collection call sites over the shared [`crate::gateway::ApiGateway`].
//! Each repository follows the same shape: `list` takes a visitor and walks
//! every page, `find` remaps an empty filter result to `NotFound`, and the
//! mutating calls address resources by the guid from their envelope
//! metadata.

pub mod applications;
pub mod organizations;
pub mod routes;
pub mod service_instances;
pub mod users;

pub use applications::{ApplicationEntity, ApplicationRepository};
pub use organizations::{OrganizationEntity, OrganizationRepository};
pub use routes::{DomainEntity, RouteEntity, RouteRepository};
pub use service_instances::{ServiceInstanceEntity, ServiceInstanceRepository};
pub use users::{OrgRole, UserRepository};
