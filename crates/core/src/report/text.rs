//! Human-readable summary of aggregated events.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::violations::aggregate::AggregatedEvent;

pub fn render(events: &[AggregatedEvent], generated_at: DateTime<Local>) -> String {
    let mut out = String::new();
    out.push_str("Violation report\n");
    out.push_str(&format!(
        "Generated: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("Events: {}\n", events.len()));

    for (i, event) in events.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!("#{} {}\n", i + 1, event.class.name()));
        out.push_str(&format!(
            "  first seen:  {}\n",
            event.first_timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("  occurrences: {}\n", event.count));
        out.push_str(&format!(
            "  offender:    {}\n",
            event.representative.offender_name
        ));
        if let Some(path) = &event.representative.face_path {
            out.push_str(&format!("  face:        {}\n", path.display()));
        }
    }
    out
}

pub fn write(
    path: &Path,
    events: &[AggregatedEvent],
    generated_at: DateTime<Local>,
) -> io::Result<()> {
    fs::write(path, render(events, generated_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bbox::BBox;
    use crate::violations::class::ViolationClass;
    use crate::violations::record::ViolationRecord;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn event(class: ViolationClass, count: usize) -> AggregatedEvent {
        let timestamp = Local.with_ymd_and_hms(2024, 3, 4, 9, 30, 15).unwrap();
        AggregatedEvent {
            class,
            first_timestamp: timestamp,
            count,
            representative: ViolationRecord::new(class, 0.9, BBox::new(0, 0, 10, 10), timestamp),
        }
    }

    fn generated_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_header_carries_generation_time_and_total() {
        let text = render(&[event(ViolationClass::Phone, 2)], generated_at());
        assert!(text.starts_with("Violation report\n"));
        assert!(text.contains("Generated: 2024-03-04 10:00:00\n"));
        assert!(text.contains("Events: 1\n"));
    }

    #[test]
    fn test_blocks_are_numbered_with_fields() {
        let events = vec![
            event(ViolationClass::Phone, 2),
            event(ViolationClass::Food, 5),
        ];
        let text = render(&events, generated_at());

        assert!(text.contains("#1 phone\n"));
        assert!(text.contains("#2 food\n"));
        assert!(text.contains("first seen:  2024-03-04 09:30:15"));
        assert!(text.contains("occurrences: 5"));
        assert!(text.contains("offender:    Unknown"));
    }

    #[test]
    fn test_face_line_only_when_crop_exists() {
        let plain = render(&[event(ViolationClass::Phone, 1)], generated_at());
        assert!(!plain.contains("face:"));

        let timestamp = Local.with_ymd_and_hms(2024, 3, 4, 9, 30, 15).unwrap();
        let with_face = AggregatedEvent {
            class: ViolationClass::Phone,
            first_timestamp: timestamp,
            count: 1,
            representative: ViolationRecord::new(
                ViolationClass::Phone,
                0.9,
                BBox::new(0, 0, 10, 10),
                timestamp,
            )
            .with_face_path(PathBuf::from("faces/face_20240304_093015.jpg")),
        };
        let text = render(&[with_face], generated_at());
        assert!(text.contains("face:        faces/face_20240304_093015.jpg"));
    }

    #[test]
    fn test_empty_events_render_header_only() {
        let text = render(&[], generated_at());
        assert!(text.contains("Events: 0"));
        assert!(!text.contains('#'));
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.txt");
        write(&path, &[event(ViolationClass::Bottle, 1)], generated_at()).unwrap();
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("#1 bottle"));
    }
}
