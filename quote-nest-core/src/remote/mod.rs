//! HTTP clients for the QuoteNest server and the public quote API.
//!
//! - [`HttpAuth`]: email/password auth against `quotenest-server`
//! - [`HttpStore`]: [`DocumentStore`](crate::store::DocumentStore) over the server's REST API
//! - [`QuoteApi`]: random quotes from the public API
//!
//! Request and response bodies shared with the server live in [`wire`].

mod auth;
mod quotes;
mod store;
pub mod wire;

use std::time::Duration;

pub use auth::HttpAuth;
pub use quotes::{QuoteApi, QuoteApiError, RandomQuery, DEFAULT_QUOTES_API_URL};
pub use store::HttpStore;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Builds a client with the given per-request timeout.
pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(err = %e, "failed to build HTTP client, using defaults");
            reqwest::Client::new()
        })
}

pub(crate) fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Reads the `{error, message}` body of a failed response.
pub(crate) async fn read_error(response: reqwest::Response) -> wire::ErrorBody {
    let status = response.status();
    match response.json::<wire::ErrorBody>().await {
        Ok(body) => body,
        Err(_) => wire::ErrorBody {
            error: status
                .canonical_reason()
                .unwrap_or("unknown")
                .to_lowercase()
                .replace(' ', "_"),
            message: format!("Server returned status {}", status),
        },
    }
}
