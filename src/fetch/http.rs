// src/fetch/http.rs
// =============================================================================
// reqwest-backed implementation of the Fetcher trait.
//
// Key behavior:
// - One shared Client (connection pooling across all probes)
// - Connect timeout 10s, per-request overall timeout set by the caller
// - Follows up to 5 redirects itself, so the header block holds every hop
// - TLS verification stays on (reqwest default)
// - Transport failures are sorted into a small set of error kinds
// =============================================================================

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, LOCATION, USER_AGENT};
use reqwest::{Client, StatusCode, Version};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

use super::{FetchRequest, FetchResponse, Fetcher};
use crate::config::Method;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 5;

/// Why a request produced no response at all
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("could not resolve hostname: {0}")]
    Dns(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    // Sorts reqwest's error into the kinds above.
    // The message text is the only place DNS and certificate failures show
    // up, so those two are matched on the rendered error chain.
    fn categorize(error: reqwest::Error) -> Self {
        let detail = error_chain(&error);
        let lower = detail.to_lowercase();

        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_redirect() {
            FetchError::TooManyRedirects
        } else if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
            FetchError::Tls(detail)
        } else if error.is_connect() {
            if lower.contains("dns") || lower.contains("resolve") {
                FetchError::Dns(detail)
            } else {
                FetchError::Connect(detail)
            }
        } else {
            FetchError::Other(detail)
        }
    }
}

// reqwest's top-level message is usually just "error sending request";
// the useful part lives in the source chain.
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Fetcher that talks to real servers
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let method = match request.method {
            Method::Head => reqwest::Method::HEAD,
            Method::Get => reqwest::Method::GET,
        };

        let started = Instant::now();
        let mut url = Url::parse(&request.url).map_err(|e| FetchError::Other(e.to_string()))?;
        let mut headers = String::new();
        let mut redirects = 0;

        // Redirects are followed by hand so every hop's headers end up in
        // the block; later hops override earlier ones on lookup.
        let response = loop {
            let remaining = request
                .timeout
                .checked_sub(started.elapsed())
                .filter(|left| !left.is_zero())
                .ok_or(FetchError::Timeout)?;

            let response = self
                .client
                .request(method.clone(), url.clone())
                .header(USER_AGENT, request.user_agent.as_str())
                .header(ACCEPT, "*/*")
                .timeout(remaining)
                .send()
                .await
                .map_err(FetchError::categorize)?;

            if !headers.is_empty() {
                headers.push_str("\r\n");
            }
            headers.push_str(&render_header_block(
                response.version(),
                response.status(),
                response.headers(),
            ));

            let Some(next) = redirect_target(&url, &response) else {
                break response;
            };
            if redirects == MAX_REDIRECTS {
                return Err(FetchError::TooManyRedirects);
            }
            redirects += 1;
            url = next;
        };

        let status = response.status();
        let effective_url = url.to_string();

        // Reading the body keeps the timing comparable to a browser load;
        // for HEAD there is nothing to read.
        let body = match request.method {
            Method::Head => String::new(),
            Method::Get => response.text().await.map_err(FetchError::categorize)?,
        };

        Ok(FetchResponse {
            status: status.as_u16(),
            effective_url,
            headers,
            body,
        })
    }
}

// Where a 3xx response points, resolved against the URL that produced it.
// None for non-redirects and for redirects without a usable Location.
fn redirect_target(current: &Url, response: &reqwest::Response) -> Option<Url> {
    if !response.status().is_redirection() {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

/// Renders a response head the way it looks on the wire:
/// `HTTP/1.1 200 OK` followed by one `name: value` line per header value.
pub fn render_header_block(version: Version, status: StatusCode, headers: &HeaderMap) -> String {
    let mut block = format!(
        "{:?} {} {}\r\n",
        version,
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );

    for (name, value) in headers {
        block.push_str(name.as_str());
        block.push_str(": ");
        block.push_str(&String::from_utf8_lossy(value.as_bytes()));
        block.push_str("\r\n");
    }

    block
}
