// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the CLI structure is a plain struct and clap
// generates the parser from the #[arg(...)] attributes. Enum-valued flags
// (--variant, --method, --expect-nocache) reuse the ValueEnum types from
// config.rs so invalid values are rejected before we ever run.
//
// Rust concepts:
// - Derive macros: Parser generates all the parsing code
// - value_parser ranges: `--passes 0` is rejected by clap itself
// - Option<T>: flags without a default value
// =============================================================================

use chrono::{DateTime, Local};
use clap::Parser;
use std::path::PathBuf;

use crate::config::{Method, NoCacheMode, RunConfig, VariantSelection};

#[derive(Parser, Debug)]
#[command(
    name = "cache-probe",
    version,
    about = "Audits how a website's page cache behaves under repeated requests",
    long_about = "cache-probe discovers a site's sitemap, samples URLs from it, requests each one \
                  several times per device profile and classifies the cache headers it gets back. \
                  The result is an HTML report plus a trace log."
)]
pub struct Cli {
    /// Site to audit (e.g., https://example.com or example.com)
    #[arg(long)]
    pub site: String,

    /// Number of URLs to sample from the sitemap
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: u64,

    /// Device profile(s) to request with
    #[arg(long, value_enum, default_value_t = VariantSelection::Both)]
    pub variant: VariantSelection,

    /// HTTP method used for probes
    #[arg(long, value_enum, default_value_t = Method::Get)]
    pub method: Method,

    /// Requests per URL and variant; later passes show whether the cache warmed up
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub passes: u32,

    /// Maximum number of requests in flight
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: u64,

    /// Pause before each request, plus up to 30% random jitter
    #[arg(long, default_value_t = 500)]
    pub delay_ms: u64,

    /// Seed for URL sampling (defaults to the current Unix timestamp)
    #[arg(long)]
    pub seed: Option<String>,

    /// URL patterns that are expected to bypass the cache
    #[arg(long, value_enum, default_value_t = NoCacheMode::Disabled)]
    pub expect_nocache: NoCacheMode,

    /// HTML report path (default: cache-probe-<timestamp>.html)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Trace log path (default: cache-probe-<timestamp>.log)
    #[arg(long)]
    pub trace_log: Option<PathBuf>,

    /// Print results and summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Log one line per completed request
    #[arg(long)]
    pub verbose: bool,

    /// Log request details and selected response headers
    #[arg(long)]
    pub trace: bool,

    /// Exit with code 1 when any public URL has a cache problem
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    /// Freezes the parsed flags into the run configuration. `now` supplies
    /// the seed when none was given.
    pub fn to_run_config(&self, now: DateTime<Local>) -> RunConfig {
        RunConfig {
            site: normalize_site(&self.site),
            method: self.method,
            limit: self.limit as usize,
            variant: self.variant,
            passes: self.passes,
            concurrency: self.concurrency as usize,
            delay_ms: self.delay_ms,
            seed: self
                .seed
                .clone()
                .unwrap_or_else(|| now.timestamp().to_string()),
            expect_nocache: self.expect_nocache,
            verbose: self.verbose,
            trace: self.trace,
        }
    }

    pub fn report_path(&self, now: DateTime<Local>) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_path(now, "html"))
    }

    pub fn trace_log_path(&self, now: DateTime<Local>) -> PathBuf {
        self.trace_log
            .clone()
            .unwrap_or_else(|| default_path(now, "log"))
    }
}

fn default_path(now: DateTime<Local>, extension: &str) -> PathBuf {
    PathBuf::from(format!(
        "cache-probe-{}.{}",
        now.format("%Y-%m-%d_%H-%M-%S"),
        extension
    ))
}

/// Strips trailing slashes and adds https:// when no scheme was given
pub fn normalize_site(site: &str) -> String {
    let site = site.trim().trim_end_matches('/');
    let lower = site.to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        site.to_string()
    } else {
        format!("https://{}", site.trim_start_matches('/'))
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why u64 for --limit and --concurrency?
//    - clap's ranged value parsers work on u64/i64/u32...; usize has none,
//      so we parse a u64 and convert once in to_run_config()
//
// 2. Why pass `now` in instead of calling Local::now() inside?
//    - The seed and both default file names should share one timestamp
//    - Tests can pass a fixed time and get predictable output
// -----------------------------------------------------------------------------
