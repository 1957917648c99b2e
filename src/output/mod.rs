//! Output Sink: a single-writer destination for plan/result records, with
//! three encoders (human, buffered JSON array, streamed NDJSON) sharing
//! one record shape so the executor never needs to know which is active.

mod human;
mod json;
mod ndjson;

use std::io::Write;

use crate::plan::{Action, PlanSummary};

pub use human::HumanSink;
pub use json::JsonSink;
pub use ndjson::NdjsonSink;

pub const FORMAT_VERSION: &str = "1";

/// One emitted record: a single repository's planned or completed
/// action, carrying only the fields relevant to that action.
#[derive(Debug, Clone, Default)]
pub struct OperationRecord {
    pub name: String,
    pub path: String,
    pub workspace_root: String,
    pub action: Action,
    pub detail: String,
    pub url: Option<String>,
    pub branch: Option<String>,
    pub remote_branch: Option<String>,
    pub current_rev: Option<String>,
    pub target_rev: Option<String>,
    pub ahead: Option<usize>,
    pub behind: Option<usize>,
    pub dirty: Option<bool>,
    pub error: Option<String>,
}

/// A finalised run summary, emitted exactly once, last.
#[derive(Debug, Clone, Default)]
pub struct SummaryRecord {
    pub total: usize,
    pub clone: usize,
    pub update: usize,
    pub unchanged: usize,
    pub blocked: usize,
    pub errors: usize,
    pub duration_ms: Option<u128>,
}

impl SummaryRecord {
    pub fn from_plan_summary(summary: &PlanSummary, duration_ms: Option<u128>) -> Self {
        use std::sync::atomic::Ordering;
        SummaryRecord {
            total: summary.total(),
            clone: summary.cloned.load(Ordering::Relaxed),
            update: summary.updated.load(Ordering::Relaxed),
            unchanged: summary.unchanged.load(Ordering::Relaxed),
            blocked: summary.blocked.load(Ordering::Relaxed),
            errors: summary.errored.load(Ordering::Relaxed),
            duration_ms,
        }
    }
}

/// Implemented by each encoder. `operation` may be called many times
/// concurrently-in-effect (the executor serialises calls via a mutex, see
/// [`crate::sync::executor`]); `finish` is called exactly once, after
/// which the sink must have flushed everything it buffered.
pub trait Sink {
    fn operation(&mut self, record: &OperationRecord);
    fn summary(&mut self, record: &SummaryRecord);
    fn finish(&mut self, out: &mut dyn Write) -> std::io::Result<()>;
}

pub fn action_name(action: Action) -> &'static str {
    match action {
        Action::Clone => "clone",
        Action::Update => "update",
        Action::Unchanged => "unchanged",
        Action::Blocked => "blocked",
        Action::Error => "error",
    }
}
