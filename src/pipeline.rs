// src/pipeline.rs
// =============================================================================
// One full audit run, start to finish:
//
//   discover sitemap → expand → sample → build queue → probe → summarize
//
// Anything that fails before probing starts is fatal and comes back as an
// AuditError. Once probing starts nothing is fatal: failed requests are
// just error results.
// =============================================================================

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RunConfig;
use crate::error::AuditError;
use crate::fetch::Fetcher;
use crate::probe::{build_queue, ProbeResult, ProbeScheduler, ProgressUpdate, SchedulerOptions};
use crate::report::{summarize, AuditSummary};
use crate::sample::sample_urls;
use crate::sitemap::{SitemapResolver, SkippedSitemap};
use crate::trace::TraceSink;

/// Everything a run produced; serialized as-is for `--json`
#[derive(Debug, Serialize)]
pub struct AuditOutcome {
    pub config: RunConfig,
    #[serde(rename = "sitemap")]
    pub sitemap_url: String,
    /// Number of same-site URLs found in the sitemap
    pub discovered: usize,
    pub skipped_sitemaps: Vec<SkippedSitemap>,
    pub sample: Vec<String>,
    /// Sorted by task id, i.e. queue order
    pub results: Vec<ProbeResult>,
    pub summary: AuditSummary,
    pub elapsed_ms: u64,
}

pub async fn run_audit<F: Fetcher + 'static>(
    config: &RunConfig,
    fetcher: Arc<F>,
    sink: &TraceSink,
) -> Result<AuditOutcome, AuditError> {
    let started = Instant::now();

    let site = config.site_url()?;
    let resolver = SitemapResolver::new(fetcher.as_ref(), sink, site)?;
    let resolution = resolver.resolve().await?;

    if resolution.urls.is_empty() {
        return Err(AuditError::NoUrlsDiscovered);
    }

    let sample = sample_urls(&resolution.urls, config.limit, &config.seed);
    if sample.is_empty() {
        return Err(AuditError::EmptySample);
    }

    let queue = build_queue(&sample, &config.variants(), config.passes);
    let request_count = queue.len();

    sink.info(format!(
        "URLs sampled: {} (from sitemap: {}). Requests: {} ({}, {} passes).",
        sample.len(),
        resolution.urls.len(),
        request_count,
        config.variant.name(),
        config.passes
    ));

    let scheduler = ProbeScheduler::new(fetcher, sink, SchedulerOptions::from_config(config));
    let mut log_progress = |u: ProgressUpdate| {
        sink.info(format!("Progress: {}/{} ({}%)", u.processed, u.total, u.percent));
    };
    let mut results = scheduler.run(queue, &mut log_progress).await;
    results.sort_by_key(|r| r.task_id);

    let summary = summarize(&results, &sample, config.passes, config.expect_nocache);

    let elapsed = started.elapsed();
    sink.info(format!("⏱ Execution time: {}", format_elapsed(elapsed)));
    sink.info(format!(
        "⚡ Average time per request: {:.2}ms",
        elapsed.as_secs_f64() * 1000.0 / request_count as f64
    ));

    Ok(AuditOutcome {
        config: config.clone(),
        sitemap_url: resolution.sitemap_url,
        discovered: resolution.urls.len(),
        skipped_sitemaps: resolution.skipped,
        sample,
        results,
        summary,
        elapsed_ms: elapsed.as_millis() as u64,
    })
}

// "1m 5.25s (65.25 seconds total)"
fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let minutes = (total / 60.0).floor();
    let seconds = total - minutes * 60.0;
    format!("{}m {:.2}s ({:.2} seconds total)", minutes as u64, seconds, total)
}
