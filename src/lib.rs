//! Nimbus API Library
//!
//! Client library for a versioned REST control-plane: authenticated request
//! cycles, OAuth token refresh, cursor pagination and typed resource
//! repositories.
//!
//! # Features
//!
//! - **Single refresh-and-retry**: a 401 triggers exactly one token refresh
//!   and one retry; everything else propagates unchanged
//! - **Cursor pagination**: listings follow `next_url` page by page through
//!   a visitor callback
//! - **Typed envelopes**: every resource arrives as `{metadata, entity}`
//!   with a stable guid
//! - **Structured errors**: `NotFound`, `Unauthorized`, `Forbidden`,
//!   `Conflict` and transport failures are distinct variants, never strings
//!   to parse

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod net;
pub mod repo;
pub mod request;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Control-plane API version this client speaks
pub const API_VERSION: &str = "v2";

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
