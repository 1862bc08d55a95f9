// src/classify/headers.rs
// =============================================================================
// Turns a raw response header block into a cache verdict.
//
// Cache plugins and CDNs all report their state differently:
// - LiteSpeed:         X-LiteSpeed-Cache: hit | miss | no-cache
// - LiteSpeed control: X-LiteSpeed-Cache-Control: public,max-age=604800
// - QUIC.cloud CDN:    X-Qc-Cache: HIT | MISS
// - Cloudflare:        CF-Cache-Status: HIT | DYNAMIC | ...
//
// classify() checks them in a fixed precedence order and reduces the result
// to a short status string plus a coarse CacheClass for reporting.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Coarse bucket a cache status falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheClass {
    Hit,
    Miss,
    Bypass,
    Na,
}

impl CacheClass {
    /// Derives the class from a cache status string.
    ///
    /// Substring checks, case-insensitive, first match wins:
    /// hit, miss, bypass/no-cache, public+max-age, qc:hit, qc:miss.
    pub fn from_status(status: &str) -> Self {
        let status = status.to_lowercase();

        if status.contains("hit") {
            CacheClass::Hit
        } else if status.contains("miss") {
            CacheClass::Miss
        } else if status.contains("bypass") || status.contains("no-cache") {
            CacheClass::Bypass
        } else if is_public_max_age(&status) {
            CacheClass::Hit
        } else if status.contains("qc:hit") {
            CacheClass::Hit
        } else if status.contains("qc:miss") {
            CacheClass::Miss
        } else {
            CacheClass::Na
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheClass::Hit => "hit",
            CacheClass::Miss => "miss",
            CacheClass::Bypass => "bypass",
            CacheClass::Na => "na",
        }
    }
}

/// Everything the report wants to know about one response's headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub cache_status: String,
    pub cache_class: CacheClass,
    /// A CDN edge answered from its own cache, so the origin's cache state
    /// for this request is unknown
    pub origin_unverifiable: bool,
    pub server: Option<String>,
    pub cf_cache_status: Option<String>,
    pub vary: Option<String>,
    pub x_litespeed_cache_control: Option<String>,
    pub cache_control: Option<String>,
    pub age: Option<String>,
}

/// Looks up a header in a raw block.
///
/// Name matching is case-insensitive and anchored at the start of a line up
/// to the first colon. When a name repeats, the last occurrence wins.
/// Empty values count as absent.
pub fn header_value(raw: &str, name: &str) -> Option<String> {
    raw.lines()
        .filter_map(|line| {
            let (line_name, value) = line.split_once(':')?;
            // Continuation lines and status lines never start with a header name
            if line_name.starts_with(char::is_whitespace) {
                return None;
            }
            if !line_name.trim_end().eq_ignore_ascii_case(name) {
                return None;
            }
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .last()
}

/// Extracts the cache status from a raw header block.
///
/// Precedence (first match wins):
/// 1. X-LiteSpeed-Cache, lowercased
/// 2. X-LiteSpeed-Cache-Control when it says public + max-age
/// 3. Cache-Control when it says public + max-age
/// 4. X-Qc-Cache, as "qc:<value>"
/// 5. "n/a"
pub fn cache_status(raw: &str) -> String {
    if let Some(value) = header_value(raw, "x-litespeed-cache") {
        return value.to_lowercase();
    }

    for name in ["x-litespeed-cache-control", "cache-control"] {
        if let Some(value) = header_value(raw, name) {
            let value = value.to_lowercase();
            if is_public_max_age(&value) {
                return value;
            }
        }
    }

    if let Some(value) = header_value(raw, "x-qc-cache") {
        return format!("qc:{}", value.to_lowercase());
    }

    "n/a".to_string()
}

/// Full classification of one header block
pub fn classify(raw: &str) -> Classification {
    let cache_status = cache_status(raw);
    let cache_class = CacheClass::from_status(&cache_status);

    let cf_cache_status = header_value(raw, "cf-cache-status");
    let origin_unverifiable = cf_cache_status
        .as_deref()
        .map(|v| v.to_lowercase().contains("hit"))
        .unwrap_or(false);

    Classification {
        cache_status,
        cache_class,
        origin_unverifiable,
        server: header_value(raw, "server"),
        cf_cache_status,
        vary: header_value(raw, "vary"),
        x_litespeed_cache_control: header_value(raw, "x-litespeed-cache-control"),
        cache_control: header_value(raw, "cache-control"),
        age: header_value(raw, "age"),
    }
}

// Expects an already-lowercased value
fn is_public_max_age(value: &str) -> bool {
    value.contains("public") && value.contains("max-age")
}
