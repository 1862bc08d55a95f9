// src/sample.rs
// =============================================================================
// Picks a reproducible random subset of the discovered URLs.
//
// Reproducibility:
// - The seed string is hashed with FNV-1a (64 bit) into a u64
// - That u64 seeds rand's StdRng
// - Indices are drawn with gen_range(0..n); repeats are discarded
//
// Same seed + same URL list (same order) + same build => same sample.
// StdRng's algorithm may change between rand releases, so a sample is only
// guaranteed to repeat with the same binary.
// =============================================================================

use fnv::FnvHasher;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::hash::Hasher;

/// Hashes a seed string into the integer seed for the generator
pub fn seed_from_str(seed: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(seed.as_bytes());
    hasher.finish()
}

/// Returns `min(limit, urls.len())` distinct URLs drawn without replacement.
///
/// When every URL fits under the limit, all of them are returned as-is.
pub fn sample_urls(urls: &[String], limit: usize, seed: &str) -> Vec<String> {
    let n = urls.len();
    if n <= limit {
        return urls.to_vec();
    }

    let mut rng = StdRng::seed_from_u64(seed_from_str(seed));
    let mut picked_idx = HashSet::with_capacity(limit);
    let mut picked = Vec::with_capacity(limit);

    // limit < n here, so there are always unpicked indices left to hit
    while picked.len() < limit {
        let idx = rng.gen_range(0..n);
        if picked_idx.insert(idx) {
            picked.push(urls[idx].clone());
        }
    }

    picked
}
