// src/error.rs
// =============================================================================
// Errors that abort an audit run before (or instead of) probing.
//
// Anything in here unwinds to main(), gets printed to stderr, and ends the
// process with a nonzero exit code. Per-request failures are NOT in here:
// those are recorded inside each ProbeResult and never stop the run
// (see fetch::FetchError).
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// The --site value could not be turned into a usable URL
    #[error("invalid site URL '{site}': {reason}")]
    InvalidSite { site: String, reason: String },

    /// None of the well-known sitemap paths answered with success
    #[error("could not find sitemap for site: {0}")]
    SitemapNotFound(String),

    /// The top-level sitemap could not be downloaded
    #[error("failed to fetch sitemap: {url} ({reason})")]
    SitemapFetchFailed { url: String, reason: String },

    /// The top-level sitemap was neither valid XML nor had any <loc> spans
    #[error("failed to parse sitemap XML: {0}")]
    SitemapParseFailed(String),

    /// Discovery worked, but nothing on the site's host was left
    #[error("no URLs found in sitemap")]
    NoUrlsDiscovered,

    #[error("sampling produced no URLs")]
    EmptySample,

    /// Trace log or report file could not be opened/written
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl AuditError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AuditError::Io {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failing_resource() {
        let err = AuditError::SitemapFetchFailed {
            url: "https://example.com/sitemap.xml".to_string(),
            reason: "HTTP 503".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch sitemap: https://example.com/sitemap.xml (HTTP 503)"
        );

        let err = AuditError::SitemapNotFound("https://example.com".to_string());
        assert!(err.to_string().contains("https://example.com"));
    }
}
