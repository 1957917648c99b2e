use std::io::Write;

use super::{OperationRecord, Sink, SummaryRecord, action_name};

/// Plain-text encoder: one line per operation, a short tally at the end.
/// No colour handling here; that's layered on by the CLI per `NO_COLOR`/
/// `FORCE_COLOR`, orthogonal to the sink itself.
#[derive(Default)]
pub struct HumanSink {
    lines: Vec<String>,
    summary_line: Option<String>,
}

impl Sink for HumanSink {
    fn operation(&mut self, record: &OperationRecord) {
        self.lines.push(format!(
            "{action:<9} {name}  {detail}",
            action = action_name(record.action),
            name = record.name,
            detail = record.detail,
        ));
    }

    fn summary(&mut self, record: &SummaryRecord) {
        self.summary_line = Some(format!(
            "{total} repositories: {clone} cloned, {update} updated, {unchanged} unchanged, {blocked} blocked, {errors} errored",
            total = record.total,
            clone = record.clone,
            update = record.update,
            unchanged = record.unchanged,
            blocked = record.blocked,
            errors = record.errors,
        ));
    }

    fn finish(&mut self, out: &mut dyn Write) -> std::io::Result<()> {
        for line in &self.lines {
            writeln!(out, "{line}")?;
        }
        if let Some(summary) = &self.summary_line {
            writeln!(out, "{summary}")?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Action;

    #[test]
    fn renders_operations_then_summary() {
        let mut sink = HumanSink::default();
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
        assert!(text.contains("clone"));
        assert!(text.contains("flask"));
        assert!(text.contains("1 cloned"));
    }
}
