//! Random quote API client.

use std::time::Duration;

use super::{build_client, trim_base_url};
use crate::models::{Quote, QuoteWire};

pub const DEFAULT_QUOTES_API_URL: &str = "https://quoteslate.vercel.app";

/// Filters for a random quote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RandomQuery {
    pub max_length: Option<u32>,
    pub tags: Vec<String>,
    pub authors: Vec<String>,
}

impl RandomQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    /// Query string parameters. Empty filters are left out.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(max) = self.max_length {
            params.push(("maxLength", max.to_string()));
        }

        let tags = join_non_empty(&self.tags);
        if !tags.is_empty() {
            params.push(("tags", tags));
        }
        let authors = join_non_empty(&self.authors);
        if !authors.is_empty() {
            params.push(("authors", authors));
        }
        params
    }
}

fn join_non_empty(values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Errors from the random quote API.
#[derive(Debug)]
pub enum QuoteApiError {
    /// Transport failure
    HttpError(String),
    /// Non-2xx response
    Status(u16),
    /// Body was not a quote
    Decode(String),
}

impl std::fmt::Display for QuoteApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteApiError::HttpError(e) => write!(f, "HTTP error: {}", e),
            QuoteApiError::Status(404) => write!(f, "No quote matches those filters"),
            QuoteApiError::Status(code) => write!(f, "Quote API returned status {}", code),
            QuoteApiError::Decode(e) => write!(f, "Unexpected quote API response: {}", e),
        }
    }
}

impl std::error::Error for QuoteApiError {}

pub struct QuoteApi {
    base_url: String,
    client: reqwest::Client,
}

impl QuoteApi {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: trim_base_url(base_url),
            client: build_client(timeout),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/quotes/random", self.base_url)
    }

    /// Fetches one random quote matching the filters.
    pub async fn random(&self, query: &RandomQuery) -> Result<Quote, QuoteApiError> {
        tracing::debug!(?query, "fetching random quote");

        let response = self
            .client
            .get(self.endpoint())
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| QuoteApiError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QuoteApiError::Status(response.status().as_u16()));
        }

        let wire: QuoteWire = response
            .json()
            .await
            .map_err(|e| QuoteApiError::Decode(e.to_string()))?;
        Ok(wire.into())
    }
}
