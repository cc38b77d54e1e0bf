use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::auth::{AuthParams, Credentials};
use super::error::MarvelError;
use super::types::{Character, DataContainer, DataWrapper, Series};
use crate::traits::CatalogService;

pub const DEFAULT_BASE_URL: &str = "https://gateway.marvel.com/v1/public";

/// Largest `limit` the catalog accepts for one page.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Marvel public API v1 client.
pub struct MarvelClient {
    credentials: Credentials,
    base_url: Url,
    http: Client,
}

impl MarvelClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: parse_base(DEFAULT_BASE_URL).expect("default base URL is valid"),
            http: Client::new(),
        }
    }

    /// Point the client at a different API root (mirrors, local proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, MarvelError> {
        self.base_url = parse_base(base_url)?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Resolve `endpoint` against the API root.
    fn endpoint_url(&self, endpoint: &str) -> Result<Url, MarvelError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| MarvelError::Config(format!("invalid endpoint {endpoint:?}: {e}")))
    }

    /// Check the HTTP response for errors, reporting status and reason phrase.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, MarvelError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status();
            tracing::warn!(status = status.as_u16(), "Marvel API error");
            Err(MarvelError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            })
        }
    }

    /// Issue one signed GET and return the `data` field of the response.
    ///
    /// Auth parameters are generated fresh for every call and placed ahead of
    /// the caller's parameters in the query string.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<DataContainer<T>, MarvelError> {
        let auth = AuthParams::generate(&self.credentials)?;
        let url = self.endpoint_url(endpoint)?;

        let mut query: Vec<(&str, String)> = auth.query_pairs().to_vec();
        query.extend(params.iter().cloned());

        tracing::debug!(%url, params = params.len(), "Marvel API request");

        let resp = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .inspect_err(|e| tracing::warn!("Marvel API transport error: {e}"))?;

        let resp = Self::check_response(resp).await?;
        let body: DataWrapper<T> = resp.json().await.map_err(|e| {
            tracing::warn!("Marvel API response did not parse: {e}");
            MarvelError::Parse(e.to_string())
        })?;

        Ok(body.data)
    }
}

fn parse_base(base_url: &str) -> Result<Url, MarvelError> {
    // Url::join replaces the last segment unless the base ends with '/'.
    let normalized = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalized)
        .map_err(|e| MarvelError::Config(format!("invalid base URL {base_url:?}: {e}")))
}

impl CatalogService for MarvelClient {
    type Error = MarvelError;

    async fn series_page(&self, offset: u32, limit: u32) -> Result<DataContainer<Series>, MarvelError> {
        self.request(
            "series",
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn series_detail(&self, id: u64) -> Result<DataContainer<Series>, MarvelError> {
        self.request(&format!("series/{id}"), &[]).await
    }

    async fn search_series(&self, prefix: &str, limit: u32) -> Result<DataContainer<Series>, MarvelError> {
        self.request(
            "series",
            &[
                ("titleStartsWith", prefix.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn character_at(&self, offset: u32) -> Result<DataContainer<Character>, MarvelError> {
        self.request(
            "characters",
            &[("limit", "1".to_string()), ("offset", offset.to_string())],
        )
        .await
    }
}
