// src/config.rs
// =============================================================================
// The run configuration: everything the audit engine needs to know, built
// once from the command line and never changed afterwards.
//
// The small enums here double as clap value types (ValueEnum), so the CLI
// and the engine share one definition of "desktop", "head", "woocommerce"...
// =============================================================================

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::AuditError;

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

/// Transport timeouts. Probes get the long one; sitemap discovery uses the
/// short existence check and a longer full fetch.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(20);
pub const SITEMAP_CHECK_TIMEOUT: Duration = Duration::from_secs(10);
pub const SITEMAP_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP method used for the probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Body-less request, only headers come back
    Head,
    Get,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Get => "GET",
        }
    }
}

/// A device profile the same URL is probed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Desktop,
    Mobile,
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Desktop => "desktop",
            Variant::Mobile => "mobile",
        }
    }

    pub fn user_agent(&self) -> &'static str {
        match self {
            Variant::Desktop => DESKTOP_USER_AGENT,
            Variant::Mobile => MOBILE_USER_AGENT,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which variants the run probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantSelection {
    Desktop,
    Mobile,
    Both,
}

impl VariantSelection {
    /// The selected variants, desktop first
    pub fn variants(&self) -> Vec<Variant> {
        match self {
            VariantSelection::Desktop => vec![Variant::Desktop],
            VariantSelection::Mobile => vec![Variant::Mobile],
            VariantSelection::Both => vec![Variant::Desktop, Variant::Mobile],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VariantSelection::Desktop => "desktop",
            VariantSelection::Mobile => "mobile",
            VariantSelection::Both => "both",
        }
    }
}

/// Which URLs are allowed to bypass the cache without counting as a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoCacheMode {
    /// Every URL is expected to be cacheable
    #[value(name = "none")]
    #[serde(rename = "none")]
    Disabled,
    /// Cart, checkout, account and admin/API pages of a WooCommerce shop
    Woocommerce,
}

impl NoCacheMode {
    pub fn name(&self) -> &'static str {
        match self {
            NoCacheMode::Disabled => "none",
            NoCacheMode::Woocommerce => "woocommerce",
        }
    }
}

/// Immutable settings for one audit run
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// Normalized site base URL: scheme-prefixed, no trailing slash
    pub site: String,
    pub method: Method,
    pub limit: usize,
    pub variant: VariantSelection,
    pub passes: u32,
    pub concurrency: usize,
    pub delay_ms: u64,
    /// Always resolved: either user-supplied or derived from the start time
    pub seed: String,
    pub expect_nocache: NoCacheMode,
    pub verbose: bool,
    pub trace: bool,
}

impl RunConfig {
    /// Parses the site into a Url, rejecting anything without a host
    pub fn site_url(&self) -> Result<Url, AuditError> {
        let url = Url::parse(&self.site).map_err(|e| AuditError::InvalidSite {
            site: self.site.clone(),
            reason: e.to_string(),
        })?;

        if url.host_str().is_none() {
            return Err(AuditError::InvalidSite {
                site: self.site.clone(),
                reason: "URL has no host".to_string(),
            });
        }

        Ok(url)
    }

    pub fn variants(&self) -> Vec<Variant> {
        self.variant.variants()
    }
}

#[cfg(test)]
pub(crate) fn test_config(site: &str) -> RunConfig {
    RunConfig {
        site: site.to_string(),
        method: Method::Get,
        limit: 10,
        variant: VariantSelection::Both,
        passes: 2,
        concurrency: 1,
        delay_ms: 0,
        seed: "test".to_string(),
        expect_nocache: NoCacheMode::Disabled,
        verbose: false,
        trace: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_selects_desktop_then_mobile() {
        assert_eq!(
            VariantSelection::Both.variants(),
            vec![Variant::Desktop, Variant::Mobile]
        );
        assert_eq!(VariantSelection::Mobile.variants(), vec![Variant::Mobile]);
    }

    #[test]
    fn test_variant_user_agents_differ() {
        assert!(Variant::Mobile.user_agent().contains("iPhone"));
        assert!(Variant::Desktop.user_agent().contains("Windows"));
    }

    #[test]
    fn test_site_url_requires_host() {
        assert!(test_config("https://example.com").site_url().is_ok());
        assert!(test_config("not a url").site_url().is_err());
        assert!(test_config("data:text/plain,hello").site_url().is_err());
    }
}
