// src/probe/mod.rs
// =============================================================================
// The probing engine.
//
// Submodules:
// - task: the url × variant × pass work queue
// - scheduler: bounded-concurrency, rate-limited execution of the queue
// - result: the record each probe produces
// - progress: threshold-based progress notifications
// =============================================================================

mod progress;
mod result;
mod scheduler;
mod task;

pub use progress::ProgressUpdate;
pub use result::ProbeResult;
pub use scheduler::{ProbeScheduler, SchedulerOptions};
pub use task::{build_queue, ProbeTask};
