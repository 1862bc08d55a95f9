// src/probe/task.rs
// =============================================================================
// The work queue: one ProbeTask per (URL, variant, pass).
//
// Queue order is url outer, variant middle, pass inner. Progress and trace
// logs follow this order in sequential mode, so it is part of the output
// contract and must not be shuffled.
// =============================================================================

use serde::Serialize;

use crate::config::Variant;

const MAX_PRESIZED_TASKS: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeTask {
    /// Position in the queue, unique per run
    pub id: usize,
    pub url: String,
    pub variant: Variant,
    /// 1-based repetition number for this (url, variant)
    pub pass: u32,
}

/// Builds the url × variant × pass matrix
pub fn build_queue(urls: &[String], variants: &[Variant], passes: u32) -> Vec<ProbeTask> {
    let mut queue = Vec::new();
    let size = task_count(urls.len(), variants.len(), passes);
    if size <= MAX_PRESIZED_TASKS {
        queue.reserve_exact(size);
    }

    for url in urls {
        for &variant in variants {
            for pass in 1..=passes {
                queue.push(ProbeTask {
                    id: queue.len(),
                    url: url.clone(),
                    variant,
                    pass,
                });
            }
        }
    }

    queue
}

// urls × variants × passes, saturating instead of overflowing
fn task_count(urls: usize, variants: usize, passes: u32) -> usize {
    urls.saturating_mul(variants).saturating_mul(passes as usize)
}
