//! CSV export of aggregated events.

use std::fs;
use std::io;
use std::path::Path;

use crate::violations::aggregate::AggregatedEvent;

const HEADER: &str = "index,class,first_seen,count,offender,face_path";

/// Render events as CSV, one row per event in emission order.
/// Indices are 1-based.
pub fn render(events: &[AggregatedEvent]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for (i, event) in events.iter().enumerate() {
        let face_path = event
            .representative
            .face_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let fields = [
            (i + 1).to_string(),
            event.class.name().to_string(),
            event
                .first_timestamp
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            event.count.to_string(),
            event.representative.offender_name.clone(),
            face_path,
        ];

        let row: Vec<String> = fields.iter().map(|f| escape(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub fn write(path: &Path, events: &[AggregatedEvent]) -> io::Result<()> {
    fs::write(path, render(events))
}

/// Quote a field containing a separator, quote or newline; embedded
/// quotes are doubled.
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
