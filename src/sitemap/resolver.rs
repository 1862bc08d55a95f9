// src/sitemap/resolver.rs
// =============================================================================
// Finds a site's sitemap and expands it into a flat list of page URLs.
//
// How it works:
// 1. Discovery: try a few well-known sitemap paths with a cheap HEAD request
//    and take the first one that answers with success
// 2. Expansion: breadth-first walk over sitemap documents. A sitemap index
//    adds its children to the queue, a urlset contributes page URLs
// 3. Filtering: keep only URLs on the site's own host (www. or not), and
//    drop duplicates
//
// Failure policy:
// - The top-level sitemap must load and parse, otherwise the run aborts
// - A nested sitemap that fails is skipped with a warning; its siblings
//   are still expanded
// - Every sitemap URL is expanded at most once, and nesting deeper than
//   MAX_SITEMAP_DEPTH is skipped, so a self-referencing index terminates
// =============================================================================

use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use url::Url;

use super::parse::{extract_locs, looks_like_index, parse_sitemap, SitemapDocument};
use crate::config::{Method, SITEMAP_CHECK_TIMEOUT, SITEMAP_FETCH_TIMEOUT};
use crate::error::AuditError;
use crate::fetch::{FetchRequest, Fetcher};
use crate::trace::TraceSink;

/// Paths tried in order during discovery
pub const SITEMAP_CANDIDATES: [&str; 3] = ["wp-sitemap.xml", "sitemap.xml", "sitemap_index.xml"];

/// Deepest sitemap-of-sitemaps nesting that still gets expanded
pub const MAX_SITEMAP_DEPTH: usize = 8;

const SITEMAP_USER_AGENT: &str = concat!("cache-probe/", env!("CARGO_PKG_VERSION"));

// One sitemap document waiting to be expanded
#[derive(Debug, Clone)]
struct SitemapItem {
    url: String,
    depth: usize, // 0 = the top-level sitemap
}

/// A nested sitemap that was left out of the expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSitemap {
    pub url: String,
    pub reason: String,
}

/// Result of a full discovery + expansion
#[derive(Debug, Clone, Serialize)]
pub struct SitemapResolution {
    /// The sitemap discovery settled on
    pub sitemap_url: String,
    /// Deduplicated, same-host page URLs (order is not meaningful)
    pub urls: Vec<String>,
    pub skipped: Vec<SkippedSitemap>,
}

// What one sitemap document turned into
enum Loaded {
    Children(Vec<String>),
    Pages(Vec<String>),
}

enum LoadError {
    Fetch(String),
    Parse(String),
}

pub struct SitemapResolver<'a, F: Fetcher + ?Sized> {
    fetcher: &'a F,
    trace: &'a TraceSink,
    site: Url,
    site_host: String,
}

impl<'a, F: Fetcher + ?Sized> SitemapResolver<'a, F> {
    pub fn new(fetcher: &'a F, trace: &'a TraceSink, site: Url) -> Result<Self, AuditError> {
        let site_host = site
            .host_str()
            .map(normalize_host)
            .ok_or_else(|| AuditError::InvalidSite {
                site: site.to_string(),
                reason: "URL has no host".to_string(),
            })?;

        Ok(Self {
            fetcher,
            trace,
            site,
            site_host,
        })
    }

    /// Discovers the sitemap and expands it
    pub async fn resolve(&self) -> Result<SitemapResolution, AuditError> {
        let sitemap_url = self.discover().await?;
        self.trace.info(format!("Sitemap: {}", sitemap_url));

        let (urls, skipped) = self.expand(&sitemap_url).await?;

        Ok(SitemapResolution {
            sitemap_url,
            urls,
            skipped,
        })
    }

    /// Returns the first candidate sitemap URL that answers with success
    pub async fn discover(&self) -> Result<String, AuditError> {
        let base = self.site.as_str().trim_end_matches('/');

        for candidate in SITEMAP_CANDIDATES {
            let url = format!("{}/{}", base, candidate);
            let request = self.request(&url, Method::Head, SITEMAP_CHECK_TIMEOUT);

            match self.fetcher.fetch(request).await {
                Ok(response) if response.is_success() => return Ok(url),
                Ok(response) => {
                    tracing::debug!("sitemap candidate {} answered HTTP {}", url, response.status)
                }
                Err(e) => tracing::debug!("sitemap candidate {} failed: {}", url, e),
            }
        }

        Err(AuditError::SitemapNotFound(self.site.to_string()))
    }

    /// Expands `sitemap_url` into same-host page URLs, plus the list of
    /// nested sitemaps that had to be skipped
    pub async fn expand(
        &self,
        sitemap_url: &str,
    ) -> Result<(Vec<String>, Vec<SkippedSitemap>), AuditError> {
        let mut queue = VecDeque::new();
        queue.push_back(SitemapItem {
            url: sitemap_url.to_string(),
            depth: 0,
        });

        let mut visited = HashSet::new();
        let mut pages = Vec::new();
        let mut skipped = Vec::new();

        while let Some(item) = queue.pop_front() {
            if !visited.insert(item.url.clone()) {
                self.skip(&mut skipped, &item.url, "already expanded".to_string());
                continue;
            }

            if item.depth > MAX_SITEMAP_DEPTH {
                self.skip(
                    &mut skipped,
                    &item.url,
                    format!("nested deeper than {} levels", MAX_SITEMAP_DEPTH),
                );
                continue;
            }

            match self.load(&item.url).await {
                Ok(Loaded::Children(children)) => {
                    tracing::debug!("sitemap index {} lists {} child(ren)", item.url, children.len());
                    queue.extend(children.into_iter().map(|url| SitemapItem {
                        url,
                        depth: item.depth + 1,
                    }));
                }
                Ok(Loaded::Pages(urls)) => {
                    tracing::debug!("sitemap {} lists {} URL(s)", item.url, urls.len());
                    pages.extend(urls);
                }
                Err(LoadError::Fetch(reason)) | Err(LoadError::Parse(reason)) if item.depth > 0 => {
                    self.skip(&mut skipped, &item.url, reason);
                }
                Err(LoadError::Fetch(reason)) => {
                    return Err(AuditError::SitemapFetchFailed {
                        url: item.url,
                        reason,
                    });
                }
                Err(LoadError::Parse(reason)) => {
                    return Err(AuditError::SitemapParseFailed(format!("{} ({})", item.url, reason)));
                }
            }
        }

        Ok((self.filter_same_site(pages), skipped))
    }

    // Fetches and parses a single sitemap document
    async fn load(&self, url: &str) -> Result<Loaded, LoadError> {
        let request = self.request(url, Method::Get, SITEMAP_FETCH_TIMEOUT);
        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|e| LoadError::Fetch(e.to_string()))?;

        if !response.is_success() {
            return Err(LoadError::Fetch(format!("HTTP {}", response.status)));
        }

        let reason = match parse_sitemap(&response.body) {
            Ok(SitemapDocument::Index(children)) => return Ok(Loaded::Children(children)),
            Ok(SitemapDocument::UrlSet(urls)) => return Ok(Loaded::Pages(urls)),
            Ok(SitemapDocument::Unrecognized) => "no <sitemap> or <url> entries".to_string(),
            Err(malformed) => malformed.0,
        };

        // Structured parsing gave nothing usable; scan for <loc> spans instead
        let locs = extract_locs(&response.body);
        if locs.is_empty() {
            return Err(LoadError::Parse(reason));
        }

        tracing::debug!("sitemap {} parsed by <loc> fallback ({})", url, reason);
        if looks_like_index(&response.body) {
            Ok(Loaded::Children(locs))
        } else {
            Ok(Loaded::Pages(locs))
        }
    }

    fn request(&self, url: &str, method: Method, timeout: std::time::Duration) -> FetchRequest {
        FetchRequest {
            url: url.to_string(),
            method,
            user_agent: SITEMAP_USER_AGENT.to_string(),
            timeout,
        }
    }

    fn skip(&self, skipped: &mut Vec<SkippedSitemap>, url: &str, reason: String) {
        self.trace
            .warn(format!("skipping nested sitemap ({}): {}", reason, url));
        skipped.push(SkippedSitemap {
            url: url.to_string(),
            reason,
        });
    }

    fn filter_same_site(&self, urls: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        urls.into_iter()
            .filter(|url| is_same_site(&self.site_host, url))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

// Lowercases and strips a leading "www."
fn normalize_host(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// True when `url` lives on `site_host` (already normalized).
/// `www.example.com` and `example.com` count as the same host; URLs
/// without a parsable host never match.
pub fn is_same_site(site_host: &str, url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(normalize_host))
        .is_some_and(|host| host == site_host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HttpFetcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn urlset(locs: &[String]) -> String {
        let entries: String = locs
            .iter()
            .map(|loc| format!("<url><loc>{}</loc></url>", loc))
            .collect();
        format!(r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#, entries)
    }

    fn sitemap_index(locs: &[String]) -> String {
        let entries: String = locs
            .iter()
            .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
            .collect();
        format!(r#"<?xml version="1.0"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#, entries)
    }

    async fn serve(server: &MockServer, route: &str, status: u16, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    fn site(server: &MockServer) -> Url {
        Url::parse(&server.uri()).unwrap()
    }

    #[test]
    fn test_same_site_treats_www_as_equivalent() {
        let host = normalize_host("example.com");
        assert!(is_same_site(&host, "https://www.example.com/a"));
        assert!(is_same_site(&host, "https://example.com/b"));
        assert!(is_same_site(&host, "http://EXAMPLE.com/c"));
        assert!(!is_same_site(&host, "https://other.com/b"));
        assert!(!is_same_site(&host, "https://shop.example.com/"));
        assert!(!is_same_site(&host, "/relative/path"));

        let host = normalize_host("www.example.com");
        assert!(is_same_site(&host, "https://example.com/a"));
    }

    #[tokio::test]
    async fn test_discover_takes_first_successful_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/sitemap_index.xml"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let found = resolver.discover().await.unwrap();
        assert_eq!(found, format!("{}/sitemap.xml", server.uri()));
    }

    #[tokio::test]
    async fn test_discover_fails_when_no_candidate_exists() {
        let server = MockServer::start().await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let err = resolver.discover().await.unwrap_err();
        assert!(matches!(err, AuditError::SitemapNotFound(_)));
    }

    #[tokio::test]
    async fn test_urlset_is_filtered_and_deduplicated() {
        let server = MockServer::start().await;
        let uri = server.uri();
        serve(
            &server,
            "/sitemap.xml",
            200,
            urlset(&[
                format!("{}/a", uri),
                format!("{}/b", uri),
                format!("{}/a", uri),
                "https://other.com/b".to_string(),
            ]),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let (mut urls, skipped) = resolver.expand(&format!("{}/sitemap.xml", uri)).await.unwrap();
        urls.sort();
        assert_eq!(urls, vec![format!("{}/a", uri), format!("{}/b", uri)]);
        assert!(skipped.is_empty());
    }

    #[tokio::test]
    async fn test_failed_nested_sitemap_is_skipped() {
        let server = MockServer::start().await;
        let uri = server.uri();
        serve(
            &server,
            "/sitemap_index.xml",
            200,
            sitemap_index(&[format!("{}/broken.xml", uri), format!("{}/pages.xml", uri)]),
        )
        .await;
        serve(&server, "/broken.xml", 500, "oops".to_string()).await;
        serve(
            &server,
            "/pages.xml",
            200,
            urlset(&[format!("{}/one", uri), format!("{}/two", uri)]),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let (mut urls, skipped) = resolver
            .expand(&format!("{}/sitemap_index.xml", uri))
            .await
            .unwrap();
        urls.sort();

        assert_eq!(urls, vec![format!("{}/one", uri), format!("{}/two", uri)]);
        assert_eq!(
            skipped,
            vec![SkippedSitemap {
                url: format!("{}/broken.xml", uri),
                reason: "HTTP 500".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_top_level_fetch_failure_is_fatal() {
        let server = MockServer::start().await;
        serve(&server, "/sitemap.xml", 503, String::new()).await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let err = resolver
            .expand(&format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::SitemapFetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_malformed_sitemap_falls_back_to_loc_scan() {
        let server = MockServer::start().await;
        let uri = server.uri();
        let body = format!(
            "<b>Warning</b>: headers already sent<urlset><url><loc>{}/x</loc></url><url><loc>{}/y</loc>",
            uri, uri
        );
        serve(&server, "/sitemap.xml", 200, body).await;
        serve(&server, "/empty.xml", 200, "<html><body>nothing here".to_string()).await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let (mut urls, _) = resolver.expand(&format!("{}/sitemap.xml", uri)).await.unwrap();
        urls.sort();
        assert_eq!(urls, vec![format!("{}/x", uri), format!("{}/y", uri)]);

        let err = resolver
            .expand(&format!("{}/empty.xml", uri))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::SitemapParseFailed(_)));
    }

    #[tokio::test]
    async fn test_self_referencing_index_terminates() {
        let server = MockServer::start().await;
        let uri = server.uri();
        serve(
            &server,
            "/sitemap.xml",
            200,
            sitemap_index(&[format!("{}/sitemap.xml", uri), format!("{}/pages.xml", uri)]),
        )
        .await;
        serve(&server, "/pages.xml", 200, urlset(&[format!("{}/only", uri)])).await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let (urls, skipped) = resolver.expand(&format!("{}/sitemap.xml", uri)).await.unwrap();
        assert_eq!(urls, vec![format!("{}/only", uri)]);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].reason, "already expanded");
    }

    #[tokio::test]
    async fn test_resolve_runs_discovery_then_expansion() {
        let server = MockServer::start().await;
        let uri = server.uri();
        Mock::given(method("HEAD"))
            .and(path("/wp-sitemap.xml"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        serve(&server, "/wp-sitemap.xml", 200, urlset(&[format!("{}/p", uri)])).await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let resolution = resolver.resolve().await.unwrap();
        assert_eq!(resolution.sitemap_url, format!("{}/wp-sitemap.xml", uri));
        assert_eq!(resolution.urls, vec![format!("{}/p", uri)]);
    }

    #[tokio::test]
    async fn test_malformed_index_still_expands_children() {
        let server = MockServer::start().await;
        let uri = server.uri();
        let body = format!(
            "<b>Warning</b>: headers already sent\n{}",
            sitemap_index(&[format!("{}/post-sitemap.xml", uri)])
        );
        serve(&server, "/wp-sitemap.xml", 200, body).await;
        serve(
            &server,
            "/post-sitemap.xml",
            200,
            urlset(&[format!("{}/hello-world/", uri)]),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let (urls, skipped) = resolver
            .expand(&format!("{}/wp-sitemap.xml", uri))
            .await
            .unwrap();
        assert_eq!(urls, vec![format!("{}/hello-world/", uri)]);
        assert!(skipped.is_empty());
    }

    #[tokio::test]
    async fn test_nesting_past_depth_limit_is_skipped() {
        let server = MockServer::start().await;
        let uri = server.uri();

        // level0 -> level1 -> ... -> level9, plus a urlset beside level1
        serve(
            &server,
            "/level0.xml",
            200,
            sitemap_index(&[format!("{}/level1.xml", uri), format!("{}/pages.xml", uri)]),
        )
        .await;
        for level in 1..=MAX_SITEMAP_DEPTH {
            serve(
                &server,
                &format!("/level{}.xml", level),
                200,
                sitemap_index(&[format!("{}/level{}.xml", uri, level + 1)]),
            )
            .await;
        }
        serve(&server, "/pages.xml", 200, urlset(&[format!("{}/kept", uri)])).await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let (urls, skipped) = resolver.expand(&format!("{}/level0.xml", uri)).await.unwrap();
        assert_eq!(urls, vec![format!("{}/kept", uri)]);
        assert_eq!(
            skipped,
            vec![SkippedSitemap {
                url: format!("{}/level{}.xml", uri, MAX_SITEMAP_DEPTH + 1),
                reason: "nested deeper than 8 levels".to_string(),
            }]
        );

        // The sitemap past the limit is never requested
        let requested: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert!(!requested.contains(&format!("/level{}.xml", MAX_SITEMAP_DEPTH + 1)));
    }

    #[tokio::test]
    async fn test_unparsable_nested_sitemap_is_skipped() {
        let server = MockServer::start().await;
        let uri = server.uri();
        serve(
            &server,
            "/sitemap_index.xml",
            200,
            sitemap_index(&[format!("{}/garbage.xml", uri), format!("{}/pages.xml", uri)]),
        )
        .await;
        serve(&server, "/garbage.xml", 200, "<html><body>maintenance".to_string()).await;
        serve(&server, "/pages.xml", 200, urlset(&[format!("{}/one", uri)])).await;

        let fetcher = HttpFetcher::new().unwrap();
        let trace = TraceSink::disabled();
        let resolver = SitemapResolver::new(&fetcher, &trace, site(&server)).unwrap();

        let (urls, skipped) = resolver
            .expand(&format!("{}/sitemap_index.xml", uri))
            .await
            .unwrap();
        assert_eq!(urls, vec![format!("{}/one", uri)]);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].url, format!("{}/garbage.xml", uri));
        assert!(!skipped[0].reason.is_empty());
    }
}
