use std::path::PathBuf;

use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::detection::domain::annotator;
use crate::detection::domain::violation_detector::{Detection, ViolationDetector};
use crate::recognition::domain::face_engine::FaceEngine;
use crate::recognition::domain::face_store::FaceStore;
use crate::shared::bbox::BBox;
use crate::shared::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_WINDOW_SECONDS, FACES_SUBDIR, REPORTS_DIR,
};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;
use crate::violations::aggregate::{aggregate, AggregateError, AggregatedEvent};
use crate::violations::record::{ViolationHistory, ViolationRecord};

/// Tunables for a monitoring session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Minimum confidence a detection needs to be recorded.
    pub confidence_threshold: f32,
    /// Maximum gap (seconds) between same-class detections folded into
    /// one aggregated event.
    pub window_seconds: f64,
    /// Directory that receives reports and saved face crops.
    pub reports_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE,
            window_seconds: DEFAULT_WINDOW_SECONDS,
            reports_dir: PathBuf::from(REPORTS_DIR),
        }
    }
}

/// Orchestrates violation monitoring: detection, identity attribution,
/// history bookkeeping and frame annotation.
///
/// A session outlives individual runs; the violation history belongs to
/// the session and is reset when a new run starts.
pub struct MonitorSession {
    detector: Box<dyn ViolationDetector>,
    face_engine: Option<Box<dyn FaceEngine>>,
    face_store: FaceStore,
    image_writer: Box<dyn ImageWriter>,
    history: ViolationHistory,
    config: SessionConfig,
}

impl MonitorSession {
    pub fn new(
        detector: Box<dyn ViolationDetector>,
        image_writer: Box<dyn ImageWriter>,
        config: SessionConfig,
    ) -> Self {
        Self {
            detector,
            face_engine: None,
            face_store: FaceStore::new(),
            image_writer,
            history: ViolationHistory::new(),
            config,
        }
    }

    /// Enables identity attribution. Without an engine every record is
    /// attributed to [`crate::violations::record::UNKNOWN_OFFENDER`].
    pub fn with_face_recognition(mut self, engine: Box<dyn FaceEngine>) -> Self {
        self.face_engine = Some(engine);
        self
    }

    /// Learns a person's face from a photo so later violations can be
    /// attributed by name. Returns `false` when the photo contains no
    /// detectable face.
    pub fn register_known_face(
        &mut self,
        name: &str,
        photo: &Frame,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        let engine = self
            .face_engine
            .as_mut()
            .ok_or("face recognition is not enabled for this session")?;
        let faces = engine.detect_faces(photo)?;

        // the largest face in the photo is taken as the subject
        let Some(subject) = faces.into_iter().max_by_key(|face| face.bbox.area()) else {
            warn!("no face found while registering '{name}'");
            return Ok(false);
        };
        self.face_store.register(name, subject.embedding);
        info!("registered known face '{name}'");
        Ok(true)
    }

    pub fn face_store(&self) -> &FaceStore {
        &self.face_store
    }

    pub fn history(&self) -> &ViolationHistory {
        &self.history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Folds the recorded history into discrete events using the
    /// session's aggregation window.
    pub fn aggregate_history(&self) -> Result<Vec<AggregatedEvent>, AggregateError> {
        aggregate(self.history.records(), self.config.window_seconds)
    }

    /// Begins a run over an opened source, clearing any history left by
    /// a previous run. Frame media time is anchored to the wall clock at
    /// this moment.
    pub fn start_run(&mut self, reader: Box<dyn VideoReader>) -> MonitorRun<'_> {
        self.history.clear();
        info!("monitoring {}", reader.metadata().describe());
        MonitorRun {
            session: self,
            reader,
            started_at: Local::now(),
            frames_processed: 0,
        }
    }
}

/// One frame after processing: annotated pixels plus what was found.
#[derive(Debug)]
pub struct ProcessedFrame {
    pub frame: Frame,
    pub detections: Vec<Detection>,
    pub index: usize,
}

/// Totals for a completed run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: usize,
    pub violation_count: usize,
}

/// An in-progress pass over one source. Pull frames with
/// [`MonitorRun::next_frame`] until it returns `Ok(None)`.
pub struct MonitorRun<'a> {
    session: &'a mut MonitorSession,
    reader: Box<dyn VideoReader>,
    started_at: DateTime<Local>,
    frames_processed: usize,
}

impl MonitorRun<'_> {
    pub fn metadata(&self) -> &VideoMetadata {
        self.reader.metadata()
    }

    /// Processes the next frame: detect, attribute, record, annotate.
    /// `Ok(None)` means the source is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<ProcessedFrame>, Box<dyn std::error::Error>> {
        let Some(mut frame) = self.reader.next_frame()? else {
            return Ok(None);
        };

        let threshold = self.session.config.confidence_threshold;
        let detections = self.session.detector.detect(&frame, threshold)?;

        if !detections.is_empty() {
            let timestamp = self.wall_timestamp(&frame);
            // crop from the clean frame, before boxes are drawn
            let (offender, face_path) = self.attribute(&frame, timestamp)?;

            for detection in &detections {
                let mut record = ViolationRecord::new(
                    detection.class,
                    detection.confidence,
                    detection.bbox,
                    timestamp,
                );
                if let Some(name) = &offender {
                    record = record.with_offender(name.clone());
                }
                if let Some(path) = &face_path {
                    record = record.with_face_path(path.clone());
                }
                self.session.history.push(record);
            }

            annotator::annotate(&mut frame, &detections);
            debug!(
                "frame {}: {} detection(s) recorded",
                frame.index(),
                detections.len()
            );
        }

        self.frames_processed += 1;
        Ok(Some(ProcessedFrame {
            index: frame.index(),
            detections,
            frame,
        }))
    }

    /// Ends the run, releasing the source, and reports totals.
    pub fn finish(self) -> RunSummary {
        let summary = RunSummary {
            frames_processed: self.frames_processed,
            violation_count: self.session.history.len(),
        };
        info!(
            "run finished: {} frame(s), {} violation record(s)",
            summary.frames_processed, summary.violation_count
        );
        summary
    }

    /// Wall-clock time of a frame: run start plus the frame's media
    /// offset.
    fn wall_timestamp(&self, frame: &Frame) -> DateTime<Local> {
        self.started_at + chrono::Duration::milliseconds(frame.timestamp().as_millis() as i64)
    }

    /// Identity attribution for one violation frame. The largest face is
    /// matched against the store and its crop is saved for the report;
    /// every record from this frame shares the result.
    fn attribute(
        &mut self,
        frame: &Frame,
        timestamp: DateTime<Local>,
    ) -> Result<(Option<String>, Option<PathBuf>), Box<dyn std::error::Error>> {
        let Some(engine) = self.session.face_engine.as_mut() else {
            return Ok((None, None));
        };

        let faces = engine.detect_faces(frame)?;
        let Some(best) = faces.into_iter().max_by_key(|face| face.bbox.area()) else {
            return Ok((None, None));
        };

        let offender = self
            .session
            .face_store
            .recognize(&best.embedding)
            .map(str::to_string);

        let (crop, width, height) = square_crop(frame, &best.bbox);
        if width == 0 || height == 0 {
            return Ok((offender, None));
        }

        let path = self
            .session
            .config
            .reports_dir
            .join(FACES_SUBDIR)
            .join(format!("face_{}.jpg", timestamp.format("%Y%m%d_%H%M%S")));
        self.session.image_writer.write(&path, &crop, width, height)?;
        Ok((offender, Some(path)))
    }
}

/// Square crop centered on `bbox`, sized by its longer side and clamped
/// to the frame. Returns RGB bytes with the crop dimensions; a box fully
/// outside the frame yields an empty crop.
fn square_crop(frame: &Frame, bbox: &BBox) -> (Vec<u8>, u32, u32) {
    let frame_w = frame.width() as i32;
    let frame_h = frame.height() as i32;

    let cx = bbox.x1 + bbox.width() / 2;
    let cy = bbox.y1 + bbox.height() / 2;
    let half = bbox.width().max(bbox.height()) / 2;

    let x1 = (cx - half).clamp(0, frame_w) as usize;
    let y1 = (cy - half).clamp(0, frame_h) as usize;
    let x2 = (cx + half).clamp(0, frame_w) as usize;
    let y2 = (cy + half).clamp(0, frame_h) as usize;

    let width = x2.saturating_sub(x1);
    let height = y2.saturating_sub(y1);
    let channels = frame.channels() as usize;

    let src = frame.as_ndarray();
    let mut data = Vec::with_capacity(width * height * channels);
    for row in y1..y2 {
        for col in x1..x2 {
            for channel in 0..channels {
                data.push(src[[row, col, channel]]);
            }
        }
    }
    (data, width as u32, height as u32)
}
