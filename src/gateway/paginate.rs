//! Cursor pagination
//!
//! Pages are fetched strictly one at a time: each page's URL is only known
//! after decoding the previous one, so there is nothing to fetch
//! speculatively. The visitor owns accumulation; an error mid-listing aborts
//! the loop without rolling back resources already delivered.

use serde::de::DeserializeOwned;
use url::Url;

use super::{ApiGateway, decode_json};
use crate::envelope::{Page, Resource};
use crate::net::ApiRequest;
use crate::{Error, Result};

impl ApiGateway {
    /// Enumerate every resource of a listing, page by page.
    ///
    /// `visit` is called once per resource in response order. Returning
    /// `false` stops enumeration immediately - no further pages are
    /// fetched. Otherwise the loop follows `next_url` verbatim (it already
    /// encodes the original filters) until a page carries none. Pagination
    /// is driven solely by the cursor: a page with an empty `resources`
    /// array but a `next_url` still advances.
    pub async fn list_paginated<T, F>(&self, first: ApiRequest, mut visit: F) -> Result<()>
    where
        T: DeserializeOwned,
        F: FnMut(Resource<T>) -> bool,
    {
        let mut request = first;
        loop {
            let response = self.perform(request).await?;
            let page: Page<T> = decode_json(&response.body)?;

            for resource in page.resources {
                if !visit(resource) {
                    return Ok(());
                }
            }

            match page.next_url {
                Some(next) => request = ApiRequest::get(self.resolve_cursor(&next)?),
                None => return Ok(()),
            }
        }
    }

    /// Resolve a cursor (path-and-query, occasionally absolute) against the
    /// current target.
    fn resolve_cursor(&self, next_url: &str) -> Result<String> {
        let base = self.target();
        let resolved = Url::parse(&base)
            .and_then(|base| base.join(next_url))
            .map_err(|e| Error::Config(format!("invalid next_url {next_url}: {e}")))?;
        Ok(resolved.to_string())
    }
}
