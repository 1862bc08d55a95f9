// src/fetch/mod.rs
// =============================================================================
// The HTTP fetch primitive shared by sitemap discovery and cache probing.
//
// Submodules:
// - http: the real implementation on top of reqwest
//
// Everything else in the crate talks to the network only through the
// `Fetcher` trait, so tests can swap in an in-memory fake.
// =============================================================================

mod http;

pub use http::{FetchError, HttpFetcher};

use async_trait::async_trait;
use std::time::Duration;

use crate::config::Method;

/// One request to send
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub user_agent: String,
    /// Overall deadline for the request, including redirects and body
    pub timeout: Duration,
}

/// What came back from the final hop of a request
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub status: u16,
    /// URL after following redirects
    pub effective_url: String,
    /// Status line followed by `name: value` lines, one per header
    /// occurrence. After redirects, one such block per hop in order,
    /// separated by a blank line.
    pub headers: String,
    /// Response body as text; empty for HEAD requests
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}
