use std::io::Write;

use serde::Serialize;

use super::{FORMAT_VERSION, OperationRecord, Sink, SummaryRecord, action_name};

/// Wire shape for one operation record, matching the documented schema
/// field-for-field; optional fields are omitted rather than emitted null.
#[derive(Debug, Serialize)]
pub(super) struct JsonOperation {
    format_version: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
    path: String,
    workspace_root: String,
    action: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_rev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_rev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ahead: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    behind: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dirty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&OperationRecord> for JsonOperation {
    fn from(r: &OperationRecord) -> Self {
        JsonOperation {
            format_version: FORMAT_VERSION,
            kind: "operation",
            name: r.name.clone(),
            path: r.path.clone(),
            workspace_root: r.workspace_root.clone(),
            action: action_name(r.action),
            detail: r.detail.clone(),
            url: r.url.clone(),
            branch: r.branch.clone(),
            remote_branch: r.remote_branch.clone(),
            current_rev: r.current_rev.clone(),
            target_rev: r.target_rev.clone(),
            ahead: r.ahead,
            behind: r.behind,
            dirty: r.dirty,
            error: r.error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct JsonSummary {
    format_version: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    total: usize,
    clone: usize,
    update: usize,
    unchanged: usize,
    blocked: usize,
    errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u128>,
}

impl From<&SummaryRecord> for JsonSummary {
    fn from(r: &SummaryRecord) -> Self {
        JsonSummary {
            format_version: FORMAT_VERSION,
            kind: "summary",
            total: r.total,
            clone: r.clone,
            update: r.update,
            unchanged: r.unchanged,
            blocked: r.blocked,
            errors: r.errors,
            duration_ms: r.duration_ms,
        }
    }
}

/// Buffered array encoder: accumulates every record and emits one JSON
/// array on `finish`, so the array is always syntactically valid even if
/// the run is interrupted before any records were pushed (`[]`).
#[derive(Default)]
pub struct JsonSink {
    values: Vec<serde_json::Value>,
}

impl Sink for JsonSink {
    fn operation(&mut self, record: &OperationRecord) {
        let wire = JsonOperation::from(record);
        if let Ok(value) = serde_json::to_value(wire) {
            self.values.push(value);
        }
    }

    fn summary(&mut self, record: &SummaryRecord) {
        let wire = JsonSummary::from(record);
        if let Ok(value) = serde_json::to_value(wire) {
            self.values.push(value);
        }
    }

    fn finish(&mut self, out: &mut dyn Write) -> std::io::Result<()> {
        let text = serde_json::to_string_pretty(&self.values).unwrap_or_else(|_| "[]".to_string());
        writeln!(out, "{text}")?;
        out.flush()
    }
}
