// src/probe/scheduler.rs
// =============================================================================
// Runs the probe queue against the target site.
//
// Two modes:
// - Sequential (concurrency = 1): one request at a time, in queue order
// - Concurrent (concurrency > 1): a sliding window of in-flight requests.
//   The first `concurrency` tasks are launched up front; every time one
//   completes, its result is recorded and the next queued task is launched
//   in its place. No fixed batches: completions and refills are continuous.
//
// Politeness: before every launch we sleep for delay_ms plus a random
// jitter of up to 30% of delay_ms, so the target never sees a tight burst.
//
// Guarantees:
// - Never more than `concurrency` requests started but not yet drained
// - Every task yields exactly one ProbeResult; failures are recorded,
//   never retried
// - Results, progress and log lines are produced only here, in the single
//   loop that drains completions, so no locking is needed around them
//
// Rust concepts:
// - tokio::spawn: each request runs as its own task so its timing is not
//   distorted by the scheduler sleeping between launches
// - FuturesUnordered: a set of futures that yields whichever finishes first
// =============================================================================

use futures::stream::{FuturesUnordered, StreamExt};
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::progress::{ProgressObserver, ProgressTracker};
use super::result::ProbeResult;
use super::task::ProbeTask;
use crate::config::{Method, RunConfig, PROBE_TIMEOUT};
use crate::fetch::{FetchRequest, Fetcher};
use crate::trace::TraceSink;

// Header names worth echoing into the trace log
const TRACED_HEADERS: [&str; 9] = [
    "server",
    "cf-cache-status",
    "x-litespeed-cache",
    "x-litespeed-cache-control",
    "cache-control",
    "vary",
    "age",
    "location",
    "content-type",
];

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub method: Method,
    pub concurrency: usize,
    pub delay_ms: u64,
    pub timeout: Duration,
    /// Only used to print "Pass 1/2" in verbose lines
    pub passes: u32,
    pub verbose: bool,
    pub trace: bool,
}

impl SchedulerOptions {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            method: config.method,
            concurrency: config.concurrency.max(1),
            delay_ms: config.delay_ms,
            timeout: PROBE_TIMEOUT,
            passes: config.passes,
            verbose: config.verbose,
            trace: config.trace,
        }
    }
}

// A finished probe plus the raw headers, kept only for trace output
struct ProbeOutcome {
    result: ProbeResult,
    raw_headers: Option<String>,
}

pub struct ProbeScheduler<'a, F: Fetcher + 'static> {
    fetcher: Arc<F>,
    trace: &'a TraceSink,
    options: SchedulerOptions,
}

impl<'a, F: Fetcher + 'static> ProbeScheduler<'a, F> {
    pub fn new(fetcher: Arc<F>, trace: &'a TraceSink, options: SchedulerOptions) -> Self {
        Self {
            fetcher,
            trace,
            options,
        }
    }

    /// Executes every task exactly once and returns one result per task.
    /// Result order is completion order, which only matches queue order in
    /// sequential mode.
    pub async fn run(
        &self,
        queue: Vec<ProbeTask>,
        observer: &mut dyn ProgressObserver,
    ) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(queue.len());
        let mut tracker = ProgressTracker::new(queue.len());

        if self.options.concurrency <= 1 {
            for task in queue {
                self.pace().await;
                let request = self.request_for(&task);
                let outcome = probe_once(self.fetcher.as_ref(), task, request).await;
                self.complete(outcome, &mut results, &mut tracker, observer);
            }
            return results;
        }

        let initial = self.options.concurrency.min(queue.len());
        let mut pending = queue.into_iter();
        let mut in_flight = FuturesUnordered::new();

        for task in pending.by_ref().take(initial) {
            self.pace().await;
            in_flight.push(self.launch(task));
        }

        while let Some(outcome) = in_flight.next().await {
            self.complete(outcome, &mut results, &mut tracker, observer);

            if let Some(task) = pending.next() {
                self.pace().await;
                in_flight.push(self.launch(task));
            }
        }

        results
    }

    // Spawns the request and returns a future for its outcome. A panicking
    // request task still produces an error result for its ProbeTask.
    fn launch(&self, task: ProbeTask) -> impl Future<Output = ProbeOutcome> {
        let fetcher = Arc::clone(&self.fetcher);
        let request = self.request_for(&task);
        let fallback = task.clone();

        let handle = tokio::spawn(async move { probe_once(fetcher.as_ref(), task, request).await });

        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => ProbeOutcome {
                    result: ProbeResult::from_error(&fallback, 0, format!("probe task failed: {}", e)),
                    raw_headers: None,
                },
            }
        }
    }

    async fn pace(&self) {
        if let Some(delay) = jittered_delay(self.options.delay_ms) {
            tokio::time::sleep(delay).await;
        }
    }

    fn request_for(&self, task: &ProbeTask) -> FetchRequest {
        FetchRequest {
            url: task.url.clone(),
            method: self.options.method,
            user_agent: task.variant.user_agent().to_string(),
            timeout: self.options.timeout,
        }
    }

    // Single drain point for finished probes
    fn complete(
        &self,
        outcome: ProbeOutcome,
        results: &mut Vec<ProbeResult>,
        tracker: &mut ProgressTracker,
        observer: &mut dyn ProgressObserver,
    ) {
        let ProbeOutcome {
            result,
            raw_headers,
        } = outcome;

        if self.options.verbose {
            self.log_verbose(&result);
        }
        if self.options.trace {
            self.log_trace(&result, raw_headers.as_deref());
        }

        results.push(result);

        if let Some(update) = tracker.advance() {
            observer.on_progress(update);
        }
    }

    fn log_verbose(&self, result: &ProbeResult) {
        let cf_note = if result.origin_unverifiable {
            " [CF-HIT: origin unverifiable]"
        } else {
            ""
        };

        self.trace.info(format!(
            "[{}] Pass {}/{}: {} | HTTP {} | {} | {}ms{}",
            result.variant.name().to_uppercase(),
            result.pass,
            self.options.passes,
            result.url,
            result.http_status.unwrap_or(0),
            result.cache_status,
            result.elapsed_ms,
            cf_note
        ));
    }

    fn log_trace(&self, result: &ProbeResult, raw_headers: Option<&str>) {
        self.trace.info(format!(
            ">> {} {} [{}] UA=\"{}\"",
            self.options.method.as_str(),
            result.url,
            result.variant.name().to_uppercase(),
            shorten(result.variant.user_agent(), 80)
        ));

        if let Some(effective) = &result.effective_url {
            self.trace.info(format!("<< Effective-URL: {}", effective));
        }
        if let Some(error) = &result.error {
            self.trace.info(format!("<< Error: {}", error));
        }
        if let Some(raw) = raw_headers {
            for line in traced_header_lines(raw) {
                self.trace.info(format!("<< {}", line));
            }
        }
    }
}

async fn probe_once<F: Fetcher + ?Sized>(
    fetcher: &F,
    task: ProbeTask,
    request: FetchRequest,
) -> ProbeOutcome {
    let start = Instant::now();
    let fetched = fetcher.fetch(request).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match fetched {
        Ok(response) => ProbeOutcome {
            result: ProbeResult::from_response(&task, elapsed_ms, &response),
            raw_headers: Some(response.headers),
        },
        Err(e) => ProbeOutcome {
            result: ProbeResult::from_error(&task, elapsed_ms, &e),
            raw_headers: None,
        },
    }
}

/// delay_ms plus uniform jitter in [0, floor(delay_ms * 0.3)];
/// None when delays are disabled
pub fn jittered_delay(delay_ms: u64) -> Option<Duration> {
    if delay_ms == 0 {
        return None;
    }
    // floor(delay_ms * 0.3) without overflowing on huge delays
    let max_jitter = delay_ms / 10 * 3 + (delay_ms % 10) * 3 / 10;
    let jitter = rand::thread_rng().gen_range(0..=max_jitter);
    Some(Duration::from_millis(delay_ms.saturating_add(jitter)))
}

// Status lines plus the header lines listed in TRACED_HEADERS
fn traced_header_lines(raw: &str) -> Vec<&str> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            if line.starts_with("HTTP/") {
                return true;
            }
            match line.split_once(':') {
                Some((name, _)) => {
                    let name = name.trim();
                    TRACED_HEADERS.iter().any(|keep| keep.eq_ignore_ascii_case(name))
                }
                None => false,
            }
        })
        .collect()
}

fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max - 3).collect();
    format!("{}...", cut)
}
