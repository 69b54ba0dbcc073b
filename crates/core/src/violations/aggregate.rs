use std::collections::HashMap;

use chrono::{DateTime, Local};
use thiserror::Error;

use super::class::ViolationClass;
use super::record::ViolationRecord;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("aggregation window must be a non-negative finite number of seconds, got {0}")]
    InvalidWindow(f64),
}

/// One continuous occurrence of a violation class, derived from one or
/// more raw records.
#[derive(Clone, Debug)]
pub struct AggregatedEvent {
    pub class: ViolationClass,
    pub first_timestamp: DateTime<Local>,
    pub count: usize,
    /// The opening record of the group; carries the reported offender
    /// name and face crop.
    pub representative: ViolationRecord,
}

/// Groups near-duplicate detections into discrete events.
///
/// Consecutive same-class records merge while the gap between them is at
/// most `window_seconds` (a gap exactly equal to the window still
/// merges). The window slides: it bounds consecutive gaps, not the total
/// span of an event. Records of different classes never merge, and an
/// interleaved class does not break another class's run.
///
/// `records` must be sorted by timestamp ascending; the caller's
/// pipeline appends in decode order, which guarantees this. Events are
/// emitted in the order their opening records appear in the input.
pub fn aggregate(
    records: &[ViolationRecord],
    window_seconds: f64,
) -> Result<Vec<AggregatedEvent>, AggregateError> {
    if !window_seconds.is_finite() || window_seconds < 0.0 {
        return Err(AggregateError::InvalidWindow(window_seconds));
    }

    struct OpenEvent {
        representative: ViolationRecord,
        count: usize,
        last_seen: DateTime<Local>,
        opened_at: usize,
    }

    let mut open: HashMap<ViolationClass, OpenEvent> = HashMap::new();
    let mut finished: Vec<OpenEvent> = Vec::new();

    for (position, record) in records.iter().enumerate() {
        let merged = match open.get_mut(&record.class) {
            Some(event) if gap_seconds(event.last_seen, record.timestamp) <= window_seconds => {
                event.count += 1;
                event.last_seen = record.timestamp;
                true
            }
            _ => false,
        };
        if !merged {
            let fresh = OpenEvent {
                representative: record.clone(),
                count: 1,
                last_seen: record.timestamp,
                opened_at: position,
            };
            if let Some(closed) = open.insert(record.class, fresh) {
                finished.push(closed);
            }
        }
    }

    finished.extend(open.into_values());
    finished.sort_by_key(|event| event.opened_at);

    Ok(finished
        .into_iter()
        .map(|event| {
            let class = event.representative.class;
            let first_timestamp = event.representative.timestamp;
            AggregatedEvent {
                class,
                first_timestamp,
                count: event.count,
                representative: event.representative,
            }
        })
        .collect())
}

fn gap_seconds(earlier: DateTime<Local>, later: DateTime<Local>) -> f64 {
    (later - earlier)
        .num_microseconds()
        .map_or(f64::MAX, |us| us as f64 / 1_000_000.0)
}
