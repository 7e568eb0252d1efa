//! Record store access: the hosted NocoDB table holding claimed handles.

use log::debug;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::cache::{request_key, Clock, ResponseCache};
use crate::config::{ClaimConfig, CACHE_MAX_ENTRIES, CACHE_TTL_MS};
use crate::error::StoreError;
use crate::Claim;

const API_KEY_HEADER: &str = "xc-token";

/// Columns of the claims table that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Handle,
    Email,
}

impl Field {
    pub fn column(self) -> &'static str {
        match self {
            Field::Handle => "Handle",
            Field::Email => "Email",
        }
    }
}

/// Exact-match filter on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: Field,
    pub value: String,
}

impl FieldFilter {
    pub fn eq(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// NocoDB `where` clause, e.g. `(Handle,eq,operator)`.
    pub fn to_where_clause(&self) -> String {
        format!("({},eq,{})", self.field.column(), self.value)
    }
}

/// Read/write operations the claim workflow needs from the record store.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Count records, optionally restricted to an exact-match filter.
    async fn count(&self, filter: Option<&FieldFilter>) -> Result<u64, StoreError>;

    /// Append a new claim record.
    async fn create(&self, claim: &Claim) -> Result<(), StoreError>;
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// Request options that take part in the cache key.
#[derive(Serialize)]
struct RequestOptions<'a> {
    method: &'a str,
    table: &'a str,
}

/// NocoDB v2 REST client. Count reads go through a [`ResponseCache`].
pub struct NocoDbStore {
    client: Client,
    base_url: String,
    table_id: String,
    api_key: String,
    cache: ResponseCache<u64>,
}

impl NocoDbStore {
    pub fn new(config: &ClaimConfig, clock: impl Clock + 'static) -> Self {
        Self {
            client: Client::new(),
            base_url: config.record_store_url.trim_end_matches('/').to_string(),
            table_id: config.table_id.clone(),
            api_key: config.api_key.clone(),
            cache: ResponseCache::new(CACHE_TTL_MS, CACHE_MAX_ENTRIES, clock),
        }
    }

    fn records_url(&self) -> String {
        format!("{}/api/v2/tables/{}/records", self.base_url, self.table_id)
    }

    /// Full count URL, with the `where` parameter URL-encoded when filtered.
    pub fn count_url(&self, filter: Option<&FieldFilter>) -> Result<Url, StoreError> {
        let base = format!("{}/count", self.records_url());
        let parsed = match filter {
            Some(f) => Url::parse_with_params(&base, &[("where", f.to_where_clause())]),
            None => Url::parse(&base),
        };
        parsed.map_err(|e| StoreError::Url(e.to_string()))
    }

    async fn fetch_count(&self, url: Url) -> Result<u64, StoreError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        let body: CountResponse = response.json().await?;
        Ok(body.count)
    }
}

impl RecordStore for NocoDbStore {
    async fn count(&self, filter: Option<&FieldFilter>) -> Result<u64, StoreError> {
        let url = self.count_url(filter)?;
        let key = request_key(
            url.as_str(),
            &RequestOptions {
                method: "GET",
                table: &self.table_id,
            },
        );
        self.cache
            .get_or_fetch(&key, || self.fetch_count(url))
            .await
    }

    async fn create(&self, claim: &Claim) -> Result<(), StoreError> {
        let url = self.records_url();
        debug!("POST {} handle={}", url, claim.handle);
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(claim)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(())
    }
}
