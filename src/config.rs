//! Configuration and credential state
//!
//! [`Settings`] carries the tunables the gateway reads but never writes
//! (timeouts, verbosity); it is loaded through figment from an optional YAML
//! file plus `NIMBUS_`-prefixed environment variables. [`CredentialStore`]
//! holds the mutable session state (tokens, target, org/space selection) and
//! is the only shared mutable resource in the gateway: one in-flight command
//! may refresh the token while another reads it, so each logical field group
//! sits behind its own lock.
//!
//! Persistence of credential mutations belongs to the embedding CLI, not to
//! this crate.

use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// OAuth grant the session was established with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Resource-owner password grant; refreshed via the refresh token
    #[default]
    Password,
    /// Client-credentials grant; re-authenticates with the client secret
    ClientCredentials,
}

impl GrantType {
    /// Wire name used in token requests
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::ClientCredentials => "client_credentials",
        }
    }
}

/// Gateway tunables, read-only at runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Connection-establishment timeout in seconds (not the full response read)
    pub dial_timeout_secs: u64,
    /// Interval between long-running job polls, in seconds
    pub polling_interval_secs: u64,
    /// Staging deadline in seconds
    pub staging_timeout_secs: u64,
    /// Startup deadline in seconds
    pub startup_timeout_secs: u64,
    /// Emit request/response detail at debug level
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dial_timeout_secs: 5,
            polling_interval_secs: 3,
            staging_timeout_secs: 15 * 60,
            startup_timeout_secs: 5 * 60,
            verbose: false,
        }
    }
}

impl Settings {
    /// Load settings from an optional YAML file, overridden by `NIMBUS_*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("NIMBUS_"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Dial timeout as a [`Duration`]
    #[must_use]
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.dial_timeout_secs)
    }

    /// Polling interval as a [`Duration`]
    #[must_use]
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    /// Staging deadline as a [`Duration`]
    #[must_use]
    pub fn staging_timeout(&self) -> Duration {
        Duration::from_secs(self.staging_timeout_secs)
    }

    /// Startup deadline as a [`Duration`]
    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

/// Everything the CLI knows about one target, set atomically
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetInformation {
    /// Control-plane base URL
    pub api_endpoint: String,
    /// Control-plane version string
    pub api_version: String,
    /// Token service base URL
    pub auth_endpoint: String,
    /// Log-streaming endpoint
    pub doppler_endpoint: String,
    /// Skip TLS certificate verification for this target
    pub skip_ssl_validation: bool,
    /// Oldest CLI version the target accepts
    pub min_cli_version: String,
    /// Oldest CLI version the target recommends
    pub min_recommended_cli_version: String,
}

/// Selected organization, `{guid, name}` only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationFields {
    /// Stable identity
    pub guid: String,
    /// Display name
    pub name: String,
}

/// Selected space, `{guid, name}` only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceFields {
    /// Stable identity
    pub guid: String,
    /// Display name
    pub name: String,
}

/// Token read/write surface the authenticator needs
///
/// Deliberately narrow: the authenticator gets token state and the token
/// endpoint, nothing else.
pub trait TokenStore: Send + Sync {
    /// Current access token (bare, without the `bearer ` prefix)
    fn access_token(&self) -> String;
    /// Current refresh token
    fn refresh_token(&self) -> String;
    /// Token service base URL
    fn authorization_endpoint(&self) -> String;
    /// UAA client id and secret for the token request's Basic header
    fn uaa_client_credentials(&self) -> (String, String);
    /// Grant the session was established with
    fn uaa_grant_type(&self) -> GrantType;
    /// SSH OAuth client carried alongside the token pair
    fn ssh_oauth_client(&self) -> String;
    /// Replace the access token only
    fn set_access_token(&self, token: String);
    /// Replace the refresh token only
    fn set_refresh_token(&self, token: String);
    /// Replace the whole token group in one write
    fn set_token_information(&self, access: String, refresh: String, ssh_oauth_client: String);
}

/// Transport policy surface the executor needs, read fresh per call
pub trait TransportPolicy: Send + Sync {
    /// Connection-establishment timeout
    fn dial_timeout(&self) -> Duration;
    /// Skip TLS certificate verification
    fn skip_ssl_validation(&self) -> bool;
}

/// Target URL surface the request builder needs
pub trait TargetSource: Send + Sync {
    /// Control-plane base URL
    fn target(&self) -> String;
}

#[derive(Debug, Default)]
struct TokenGroup {
    access_token: String,
    refresh_token: String,
    ssh_oauth_client: String,
    uaa_client_id: String,
    uaa_client_secret: String,
    grant_type: GrantType,
}

#[derive(Debug, Default)]
struct TargetGroup {
    info: TargetInformation,
    organization: Option<OrganizationFields>,
    space: Option<SpaceFields>,
}

/// Shared mutable session state
///
/// Two lock groups: tokens and target. A reader never observes a
/// half-written multi-field update because every multi-field setter holds
/// the group's write lock for the whole update. No validation happens here;
/// that is the authenticator's job.
#[derive(Debug)]
pub struct CredentialStore {
    tokens: RwLock<TokenGroup>,
    target: RwLock<TargetGroup>,
    settings: Settings,
}

/// Default UAA client used when none is configured
const DEFAULT_UAA_CLIENT: &str = "cf";

impl CredentialStore {
    /// Create an empty store with the given settings
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            tokens: RwLock::new(TokenGroup {
                uaa_client_id: DEFAULT_UAA_CLIENT.to_string(),
                ..TokenGroup::default()
            }),
            target: RwLock::new(TargetGroup::default()),
            settings,
        }
    }

    /// Settings the store was created with
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Override the UAA client credentials
    pub fn set_uaa_client_credentials(&self, id: impl Into<String>, secret: impl Into<String>) {
        let mut tokens = self.tokens.write();
        tokens.uaa_client_id = id.into();
        tokens.uaa_client_secret = secret.into();
    }

    /// Record the grant the session was established with
    pub fn set_uaa_grant_type(&self, grant: GrantType) {
        self.tokens.write().grant_type = grant;
    }

    /// Replace the whole target block in one write; partial updates are not
    /// expressible.
    pub fn set_target_information(&self, info: TargetInformation) {
        let mut target = self.target.write();
        target.info = info;
        target.organization = None;
        target.space = None;
    }

    /// Full target information snapshot
    #[must_use]
    pub fn target_information(&self) -> TargetInformation {
        self.target.read().info.clone()
    }

    /// Record the selected organization
    pub fn set_organization_information(&self, guid: impl Into<String>, name: impl Into<String>) {
        self.target.write().organization = Some(OrganizationFields {
            guid: guid.into(),
            name: name.into(),
        });
    }

    /// Record the selected space
    pub fn set_space_information(&self, guid: impl Into<String>, name: impl Into<String>) {
        self.target.write().space = Some(SpaceFields {
            guid: guid.into(),
            name: name.into(),
        });
    }

    /// Currently selected organization, if any
    #[must_use]
    pub fn organization_fields(&self) -> Option<OrganizationFields> {
        self.target.read().organization.clone()
    }

    /// Currently selected space, if any
    #[must_use]
    pub fn space_fields(&self) -> Option<SpaceFields> {
        self.target.read().space.clone()
    }

    /// Drop both organization and space selection in one write
    pub fn unset_organization_and_space_information(&self) {
        let mut target = self.target.write();
        target.organization = None;
        target.space = None;
    }

    /// Drop the space selection only
    pub fn unset_space_information(&self) {
        self.target.write().space = None;
    }

    /// Emit request/response detail at debug level
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.settings.verbose
    }
}

impl TokenStore for CredentialStore {
    fn access_token(&self) -> String {
        self.tokens.read().access_token.clone()
    }

    fn refresh_token(&self) -> String {
        self.tokens.read().refresh_token.clone()
    }

    fn authorization_endpoint(&self) -> String {
        self.target.read().info.auth_endpoint.clone()
    }

    fn uaa_client_credentials(&self) -> (String, String) {
        let tokens = self.tokens.read();
        (tokens.uaa_client_id.clone(), tokens.uaa_client_secret.clone())
    }

    fn uaa_grant_type(&self) -> GrantType {
        self.tokens.read().grant_type
    }

    fn ssh_oauth_client(&self) -> String {
        self.tokens.read().ssh_oauth_client.clone()
    }

    fn set_access_token(&self, token: String) {
        self.tokens.write().access_token = token;
    }

    fn set_refresh_token(&self, token: String) {
        self.tokens.write().refresh_token = token;
    }

    fn set_token_information(&self, access: String, refresh: String, ssh_oauth_client: String) {
        let mut tokens = self.tokens.write();
        tokens.access_token = access;
        tokens.refresh_token = refresh;
        tokens.ssh_oauth_client = ssh_oauth_client;
    }
}

impl TransportPolicy for CredentialStore {
    fn dial_timeout(&self) -> Duration {
        self.settings.dial_timeout()
    }

    fn skip_ssl_validation(&self) -> bool {
        self.target.read().info.skip_ssl_validation
    }
}

impl TargetSource for CredentialStore {
    fn target(&self) -> String {
        self.target.read().info.api_endpoint.clone()
    }
}
