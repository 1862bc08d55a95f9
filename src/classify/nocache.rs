// src/classify/nocache.rs
// =============================================================================
// Which URLs are allowed to skip the cache.
//
// A shop's cart or checkout page answering "no-cache" is correct behavior,
// not a problem. Under the woocommerce mode those pages are tallied
// separately by the aggregator instead of counting against the site.
// =============================================================================

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::config::NoCacheMode;

// Cart, checkout and account pages (English and Polish slugs)
static SHOP_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(cart|koszyk|checkout|do-kasy|my-account|moje-konto)(/|$)")
        .expect("shop page pattern is valid")
});

static ADMIN_OR_API: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/wp-admin/|/wp-json/|wp-login\.php$").expect("admin pattern is valid")
});

static SHOP_ACTION_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|&)(add-to-cart|wc-ajax)=").expect("query pattern is valid")
});

/// True when `url` is expected to bypass the cache under `mode`
pub fn is_expected_nocache(url: &str, mode: NoCacheMode) -> bool {
    match mode {
        NoCacheMode::Disabled => false,
        NoCacheMode::Woocommerce => is_woocommerce_dynamic(url),
    }
}

fn is_woocommerce_dynamic(url: &str) -> bool {
    let (path, query) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.path().to_string(),
            parsed.query().unwrap_or("").to_string(),
        ),
        // Not a URL we can split; match the patterns against the raw text
        Err(_) => match url.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (url.to_string(), String::new()),
        },
    };

    SHOP_PAGE.is_match(&path) || ADMIN_OR_API.is_match(&path) || SHOP_ACTION_QUERY.is_match(&query)
}
