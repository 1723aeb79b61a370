use crate::config::TmdbConfig;
use crate::error::{FetcherError, Result};
use crate::models::{PersonDetails, PersonSummary, PopularPeoplePage};
use reqwest::{Client, Response};
use tracing::{debug, info};

/// Source of people to load
#[async_trait::async_trait]
pub trait PersonSource: Send + Sync {
    /// Fetch one page of the popular people listing.
    ///
    /// Any failure here is fatal for the run ([`FetcherError::Fetch`]).
    async fn popular_people(&self, page: u32) -> Result<Vec<PersonSummary>>;

    /// Fetch full details for one person.
    ///
    /// Failures are per-person ([`FetcherError::DetailFetch`]).
    async fn person_details(&self, person_id: i64) -> Result<PersonDetails>;
}

/// TMDb REST client
pub struct TmdbClient {
    client: Client,
    api_base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a new client. No timeout is configured beyond reqwest's default.
    pub fn new(config: &TmdbConfig, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("people-fetcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetcherError::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn popular_url(&self) -> String {
        format!("{}/person/popular", self.api_base_url)
    }

    fn person_url(&self, person_id: i64) -> String {
        format!("{}/person/{}", self.api_base_url, person_id)
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> reqwest::Result<Response> {
        debug!("GET {} {:?}", url, query);
        self.client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
    }
}

#[async_trait::async_trait]
impl PersonSource for TmdbClient {
    async fn popular_people(&self, page: u32) -> Result<Vec<PersonSummary>> {
        let url = self.popular_url();
        info!("Fetching popular people page {} from: {}", page, url);

        let response = self
            .get(&url, &[("page", page.to_string())])
            .await
            .map_err(|e| FetcherError::fetch(format!("request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(FetcherError::fetch(format!("status {}", response.status())));
        }

        let listing: PopularPeoplePage = response.json().await.map_err(|e| {
            FetcherError::fetch(format!("invalid listing JSON: {}", e.without_url()))
        })?;

        info!(
            "Fetched {} people (page {} of {})",
            listing.results.len(),
            listing.page.unwrap_or(page),
            listing.total_pages.map_or_else(|| "?".to_string(), |n| n.to_string())
        );
        Ok(listing.results)
    }

    async fn person_details(&self, person_id: i64) -> Result<PersonDetails> {
        let url = self.person_url(person_id);

        let response = self.get(&url, &[]).await.map_err(|e| {
            FetcherError::detail_fetch(person_id, format!("request failed: {}", e.without_url()))
        })?;

        if !response.status().is_success() {
            return Err(FetcherError::detail_fetch(
                person_id,
                format!("status {}", response.status()),
            ));
        }

        response.json().await.map_err(|e| {
            FetcherError::detail_fetch(person_id, format!("invalid JSON: {}", e.without_url()))
        })
    }
}
