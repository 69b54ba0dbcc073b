//! Decorator that runs the wrapped detector on every Nth frame only and
//! replays the cached detections in between.
//!
//! Violations are slow events on the scale of a frame interval, so
//! re-detecting every frame buys little accuracy for a lot of inference
//! cost. With `skip_interval` = 3 the inner detector runs on frames
//! 0, 3, 6, ... and frames in between reuse the last results.

use crate::detection::domain::violation_detector::{Detection, ViolationDetector};
use crate::shared::frame::Frame;

pub struct SkipFrameDetector {
    inner: Box<dyn ViolationDetector>,
    skip_interval: u32,
    frame_count: u32,
    cached: Vec<Detection>,
}

impl SkipFrameDetector {
    pub fn new(
        inner: Box<dyn ViolationDetector>,
        skip_interval: u32,
    ) -> Result<Self, &'static str> {
        if skip_interval < 1 {
            return Err("skip_interval must be >= 1");
        }
        Ok(Self {
            inner,
            skip_interval,
            frame_count: 0,
            cached: Vec::new(),
        })
    }
}

impl ViolationDetector for SkipFrameDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let run_inner = self.frame_count % self.skip_interval == 0;
        self.frame_count += 1;

        if run_inner {
            self.cached = self.inner.detect(frame, confidence_threshold)?;
        }
        Ok(self.cached.clone())
    }
}
