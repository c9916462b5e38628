//! Wire envelopes for control-plane payloads
//!
//! Every v2 resource travels as a `{metadata, entity}` pair; list endpoints
//! wrap an ordered `resources` array together with an optional `next_url`
//! cursor. A page is decoded once, walked, and dropped - it is never held
//! across page fetches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resource metadata common to every envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Stable identity used by all mutating calls
    #[serde(default)]
    pub guid: String,

    /// Canonical resource URL
    #[serde(default)]
    pub url: String,

    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One decoded resource: metadata plus a typed entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource<T> {
    /// Envelope metadata
    pub metadata: Metadata,
    /// Endpoint-specific entity fields
    pub entity: T,
}

impl<T> Resource<T> {
    /// Shorthand for the stable identity
    pub fn guid(&self) -> &str {
        &self.metadata.guid
    }
}

/// One page of a list response
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    /// Cursor to the next page, path-and-query relative to the API endpoint
    #[serde(default)]
    pub next_url: Option<String>,

    /// Resources in response order
    #[serde(default = "Vec::new")]
    pub resources: Vec<Resource<T>>,
}
