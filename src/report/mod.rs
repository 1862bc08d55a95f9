// src/report/mod.rs
// =============================================================================
// Aggregation and rendering of probe results.
//
// - summary.rs: final-pass counts per variant
// - html.rs:    the standalone HTML report
// - console.rs: terminal table and summary
// =============================================================================

mod console;
mod html;
mod summary;

pub use console::{format_expected, format_summary, format_table};
pub use html::render_html;
pub use summary::{summarize, AuditSummary};
