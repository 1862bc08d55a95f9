// src/report/console.rs
// =============================================================================
// Human-readable terminal output: a table of final-pass results followed by
// the per-variant summary.
//
// Everything is built into a String so main.rs decides where it goes and
// the tests can look at it.
// =============================================================================

use std::fmt::Write;

use super::summary::{group_results, AuditSummary};
use crate::classify::{is_expected_nocache, CacheClass};
use crate::config::NoCacheMode;
use crate::probe::ProbeResult;

const URL_WIDTH: usize = 60;

pub fn format_table(sample: &[String], results: &[ProbeResult], summary: &AuditSummary) -> String {
    let grouped = group_results(results);
    let mut out = String::new();

    let _ = writeln!(out, "{:<60} {:<8} {:<18} {:<6} {:<8}", "URL", "VARIANT", "STATUS", "HTTP", "TIME");
    let _ = writeln!(out, "{}", "=".repeat(104));

    for url in sample {
        let Some(by_variant) = grouped.get(url.as_str()) else {
            continue;
        };

        for (variant, by_pass) in by_variant {
            let Some(result) = by_pass.get(&summary.passes) else {
                continue;
            };

            let http = result
                .http_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());

            let _ = writeln!(
                out,
                "{:<60} {:<8} {:<18} {:<6} {:<8}",
                truncate_url(url),
                variant.name(),
                format_status(result),
                http,
                format!("{}ms", result.elapsed_ms)
            );
        }
    }

    out
}

pub fn format_summary(summary: &AuditSummary, mode: NoCacheMode) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "📊 Summary (final pass {}):", summary.passes);
    for (variant, s) in &summary.variants {
        let _ = writeln!(out, "   {}:", variant.name().to_uppercase());
        let _ = writeln!(
            out,
            "      hit: {}  miss: {}  bypass: {}  n/a: {}  error: {}",
            s.hit, s.miss, s.bypass, s.na, s.error
        );
        if s.origin_unverifiable > 0 {
            let _ = writeln!(out, "      ⚠ CF-HIT (origin unverifiable): {}", s.origin_unverifiable);
        }
        let _ = writeln!(
            out,
            "      public URLs: {}  public problems: {}",
            s.public_total, s.public_problem
        );
        if mode != NoCacheMode::Disabled {
            let _ = writeln!(
                out,
                "      expected no-cache URLs: {}  errors: {}",
                s.expected_total, s.expected_problem
            );
        }
    }

    out
}

/// Lists the sampled URLs that match the no-cache patterns
pub fn format_expected(sample: &[String], mode: NoCacheMode) -> Option<String> {
    let expected: Vec<&String> = sample.iter().filter(|u| is_expected_nocache(u, mode)).collect();
    if expected.is_empty() {
        return None;
    }

    let mut out = format!("🛒 Expected no-cache URLs ({}):\n", expected.len());
    for url in expected {
        let _ = writeln!(out, "   {}", url);
    }
    Some(out)
}

fn format_status(result: &ProbeResult) -> String {
    if result.is_error() {
        return "❌ error".to_string();
    }

    let icon = match result.cache_class {
        CacheClass::Hit => "✅",
        CacheClass::Miss => "🔵",
        CacheClass::Bypass => "🟠",
        CacheClass::Na => "⚪",
    };
    let mut status = format!("{} {}", icon, result.cache_status);
    if result.origin_unverifiable {
        status.push_str(" ⚠");
    }
    status
}

fn truncate_url(url: &str) -> String {
    if url.chars().count() > URL_WIDTH - 3 {
        let head: String = url.chars().take(URL_WIDTH - 6).collect();
        format!("{}...", head)
    } else {
        url.to_string()
    }
}
