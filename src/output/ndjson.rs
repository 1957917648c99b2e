use std::io::Write;

use super::{OperationRecord, Sink, SummaryRecord};

/// Streaming-friendly encoder: one compact JSON object per line rather
/// than one top-level array, so a consumer can parse each record as it
/// appears instead of waiting for a closing `]`.
#[derive(Default)]
pub struct NdjsonSink {
    lines: Vec<String>,
}

impl Sink for NdjsonSink {
    fn operation(&mut self, record: &OperationRecord) {
        let wire = super::json::JsonOperation::from(record);
        if let Ok(line) = serde_json::to_string(&wire) {
            self.lines.push(line);
        }
    }

    fn summary(&mut self, record: &SummaryRecord) {
        let wire = super::json::JsonSummary::from(record);
        if let Ok(line) = serde_json::to_string(&wire) {
            self.lines.push(line);
        }
    }

    fn finish(&mut self, out: &mut dyn Write) -> std::io::Result<()> {
        for line in &self.lines {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Action;

    #[test]
    fn emits_one_json_object_per_line() {
        let mut sink = NdjsonSink::default();
        sink.operation(&OperationRecord {
            name: "flask".into(),
            action: Action::Clone,
            detail: "missing".into(),
            ..Default::default()
        });
        sink.summary(&SummaryRecord {
            total: 1,
            clone: 1,
            ..Default::default()
        });
        let mut buf = Vec::new();
        sink.finish(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            let _: serde_json::Value = serde_json::from_str(line).unwrap();
        }
        assert!(lines[0].contains("\"type\":\"operation\""));
        assert!(lines[1].contains("\"type\":\"summary\""));
    }
}
