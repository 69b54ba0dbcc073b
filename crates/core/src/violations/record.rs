use std::path::PathBuf;

use chrono::{DateTime, Local};

use super::class::ViolationClass;
use crate::shared::bbox::BBox;

/// Offender name used until face recognition resolves an identity.
pub const UNKNOWN_OFFENDER: &str = "Unknown";

/// One flagged instance: a single violation class in a single frame.
///
/// Records are immutable once stored; identity attribution happens with
/// the builder methods before the record enters the history.
#[derive(Clone, Debug)]
pub struct ViolationRecord {
    pub class: ViolationClass,
    pub confidence: f32,
    pub bbox: BBox,
    pub timestamp: DateTime<Local>,
    pub offender_name: String,
    pub face_path: Option<PathBuf>,
}

impl ViolationRecord {
    pub fn new(
        class: ViolationClass,
        confidence: f32,
        bbox: BBox,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            class,
            confidence,
            bbox,
            timestamp,
            offender_name: UNKNOWN_OFFENDER.to_string(),
            face_path: None,
        }
    }

    pub fn with_offender(mut self, name: impl Into<String>) -> Self {
        self.offender_name = name.into();
        self
    }

    pub fn with_face_path(mut self, path: PathBuf) -> Self {
        self.face_path = Some(path);
        self
    }
}

/// Insertion-ordered record log for one monitoring session.
#[derive(Debug, Default)]
pub struct ViolationHistory {
    records: Vec<ViolationRecord>,
}

impl ViolationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ViolationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ViolationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
