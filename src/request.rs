//! Request construction
//!
//! Builds [`ApiRequest`]s from a verb, a path, filter clauses, explicit
//! query parameters, and an ordered set of body fields. Two rules matter to
//! the control-plane and are easy to get wrong:
//!
//! - Filter clauses join with `;` inside a single `q` parameter, in declared
//!   order, percent-encoded as one value. `q=host:a;domain_guid:b` and the
//!   reversed clause order are different query strings on the wire.
//! - A body field marked absent is omitted entirely, never emitted as null
//!   or empty. An empty host is a legal value; an absent host means
//!   "generate one".

use std::fmt::Display;

use reqwest::Method;
use serde_json::{Map, Value};
use url::Url;

use crate::net::ApiRequest;
use crate::{Error, Result};

/// Builder for one control-plane request
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    target: String,
    path: String,
    filters: Vec<String>,
    query: Vec<(String, String)>,
    fields: Map<String, Value>,
}

impl RequestBuilder {
    /// Start a request against `path` under the target base URL.
    ///
    /// The verb is a [`Method`], so an invalid verb is unrepresentable
    /// rather than a runtime error.
    #[must_use]
    pub fn new(method: Method, target: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            path: path.into(),
            filters: Vec::new(),
            query: Vec::new(),
            fields: Map::new(),
        }
    }

    /// Append a `key:value` filter clause to the `q` parameter
    #[must_use]
    pub fn filter(mut self, key: &str, value: impl Display) -> Self {
        self.filters.push(format!("{key}:{value}"));
        self
    }

    /// Append an explicit query parameter
    #[must_use]
    pub fn query(mut self, key: &str, value: impl Display) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Mark a body field present with the given value.
    ///
    /// Field order in the serialized body follows call order. Not calling
    /// this for a field is the only way to make it absent.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Mark a body field present only when `value` is `Some`
    #[must_use]
    pub fn field_opt(self, name: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    /// Assemble the request.
    ///
    /// Fails only on caller programming errors: an unparseable target URL.
    pub fn build(self) -> Result<ApiRequest> {
        let base = Url::parse(&self.target)
            .map_err(|e| Error::Config(format!("invalid target URL {}: {e}", self.target)))?;
        let mut url = base
            .join(&self.path)
            .map_err(|e| Error::Config(format!("invalid request path {}: {e}", self.path)))?;

        if !self.filters.is_empty() || !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            if !self.filters.is_empty() {
                pairs.append_pair("q", &self.filters.join(";"));
            }
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        let body = if self.fields.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&self.fields)
                    .map_err(|e| Error::Internal(format!("failed to serialize body: {e}")))?,
            )
        };

        Ok(ApiRequest {
            method: self.method,
            url: url.to_string(),
            authorization: None,
            content_type: body.as_ref().map(|_| "application/json".to_string()),
            body,
        })
    }
}
