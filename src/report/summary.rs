// src/report/summary.rs
// =============================================================================
// Aggregates the flat result list into per-variant counts.
//
// Only the FINAL pass of each (url, variant) is counted: earlier passes are
// there to warm the cache, so a miss on pass 1 followed by a hit on pass 2
// is the healthy case.
//
// A "public problem" is a URL that should be cacheable (not expected
// no-cache) whose final pass is an error, came from a CDN edge cache
// (origin unverifiable), or is classified na/bypass/miss.
// =============================================================================

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::classify::{is_expected_nocache, CacheClass};
use crate::config::{NoCacheMode, Variant};
use crate::probe::ProbeResult;

/// Results indexed by url → variant → pass number
pub type GroupedResults<'r> = BTreeMap<&'r str, BTreeMap<Variant, BTreeMap<u32, &'r ProbeResult>>>;

pub fn group_results(results: &[ProbeResult]) -> GroupedResults<'_> {
    let mut grouped: GroupedResults<'_> = BTreeMap::new();
    for result in results {
        grouped
            .entry(result.url.as_str())
            .or_default()
            .entry(result.variant)
            .or_default()
            .insert(result.pass, result);
    }
    grouped
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantStats {
    pub hit: usize,
    pub miss: usize,
    pub bypass: usize,
    pub na: usize,
    pub error: usize,
    pub origin_unverifiable: usize,
    /// (url, variant) pairs that have a final-pass result
    pub total: usize,
    pub expected_total: usize,
    /// Final-pass errors on expected no-cache URLs
    pub expected_problem: usize,
    pub public_total: usize,
    pub public_problem: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    pub passes: u32,
    pub variants: BTreeMap<Variant, VariantStats>,
}

impl AuditSummary {
    pub fn public_problems(&self) -> usize {
        self.variants.values().map(|s| s.public_problem).sum()
    }
}

/// Builds the per-variant summary for the sampled URLs
pub fn summarize(
    results: &[ProbeResult],
    sample: &[String],
    passes: u32,
    mode: NoCacheMode,
) -> AuditSummary {
    let grouped = group_results(results);

    let present: BTreeSet<Variant> = results.iter().map(|r| r.variant).collect();
    let mut variants: BTreeMap<Variant, VariantStats> = present
        .iter()
        .map(|&v| (v, VariantStats::default()))
        .collect();

    for url in sample {
        let expected = is_expected_nocache(url, mode);

        for (variant, stats) in variants.iter_mut() {
            if expected {
                stats.expected_total += 1;
            } else {
                stats.public_total += 1;
            }

            let Some(final_pass) = grouped
                .get(url.as_str())
                .and_then(|by_variant| by_variant.get(variant))
                .and_then(|by_pass| by_pass.get(&passes))
            else {
                continue;
            };

            stats.total += 1;

            if final_pass.is_error() {
                stats.error += 1;
                if expected {
                    stats.expected_problem += 1;
                } else {
                    stats.public_problem += 1;
                }
                continue;
            }

            if final_pass.origin_unverifiable {
                stats.origin_unverifiable += 1;
            }

            match final_pass.cache_class {
                CacheClass::Hit => stats.hit += 1,
                CacheClass::Miss => stats.miss += 1,
                CacheClass::Bypass => stats.bypass += 1,
                CacheClass::Na => stats.na += 1,
            }

            if !expected
                && (final_pass.origin_unverifiable || final_pass.cache_class != CacheClass::Hit)
            {
                stats.public_problem += 1;
            }
        }
    }

    AuditSummary { passes, variants }
}
