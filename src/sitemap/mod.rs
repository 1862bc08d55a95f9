// src/sitemap/mod.rs
// =============================================================================
// Sitemap discovery and expansion.
//
// Submodules:
// - parse: turns one sitemap document into child sitemaps or page URLs
// - resolver: finds the sitemap, walks nested indexes, filters by host
// =============================================================================

mod parse;
mod resolver;

pub use resolver::{SitemapResolver, SkippedSitemap};
