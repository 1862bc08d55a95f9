// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing) and open the trace log file
// 3. Run the audit pipeline (sitemap → sample → probe → summarize)
// 4. Write the HTML report and print the results
// 5. Exit with proper code (0 = done, 1 = cache problems with --strict,
//    2 = error)
//
// Rust concepts used:
// - async/await: the probes are network requests run concurrently
// - Result<T, E> and `?`: any fatal error bubbles up to main()
// - Drop: the trace log is flushed when `sink` goes out of scope, on the
//   success path and on every error path alike
// =============================================================================

// Module declarations - tells Rust about our other source files
mod classify; // src/classify/ - cache header classification
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - the immutable run configuration
mod error; // src/error.rs - fatal audit errors
mod fetch; // src/fetch/ - the HTTP primitive
mod pipeline; // src/pipeline.rs - one complete audit run
mod probe; // src/probe/ - queue, scheduler, results
mod report; // src/report/ - summary, HTML and console output
mod sample; // src/sample.rs - seeded URL sampling
mod sitemap; // src/sitemap/ - discovery and expansion
mod trace; // src/trace.rs - the trace log sink

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use error::AuditError;
use fetch::HttpFetcher;
use trace::TraceSink;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = audit completed
//   Ok(1) = audit completed, public URLs have cache problems, --strict set
//   Err   = fatal error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // One timestamp for the seed and both default file names
    let now = Local::now();
    let config = cli.to_run_config(now);
    let report_path = cli.report_path(now);

    let sink = TraceSink::open(cli.trace_log_path(now))?;

    sink.info(format!("Site: {}", config.site));
    if cli.seed.is_none() {
        sink.info(format!("Seed: {} (pass --seed {} to repeat this sample)", config.seed, config.seed));
    }

    let fetcher = Arc::new(HttpFetcher::new().context("failed to build HTTP client")?);

    let outcome = match pipeline::run_audit(&config, fetcher, &sink).await {
        Ok(outcome) => outcome,
        Err(e) => {
            sink.record(&format!("Error: {}", e));
            return Err(e.into());
        }
    };

    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let html = report::render_html(
        &config,
        &outcome.sample,
        &outcome.results,
        &outcome.summary,
        &generated_at,
    );
    std::fs::write(&report_path, html).map_err(|e| {
        AuditError::io(
            format!("failed to write HTML report to {}", report_path.display()),
            e,
        )
    })?;

    sink.info(format!("✓ HTML report saved: {}", report_path.display()));
    if let Some(path) = sink.path() {
        sink.info(format!("✓ Trace log saved: {}", path.display()));
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!();
        print!("{}", report::format_table(&outcome.sample, &outcome.results, &outcome.summary));
        println!();
        if let Some(expected) = report::format_expected(&outcome.sample, config.expect_nocache) {
            println!("{}", expected);
        }
        print!("{}", report::format_summary(&outcome.summary, config.expect_nocache));
    }

    if cli.strict && outcome.summary.public_problems() > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Logs go to stderr so stdout stays clean for --json.
// RUST_LOG overrides the default level.
fn init_logging(verbose: bool) {
    let default = if verbose { "info,cache_probe=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
