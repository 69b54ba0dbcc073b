use std::collections::HashMap;
use std::time::Instant;

/// Observer for monitoring-run events.
///
/// Decouples the frame loop from any particular output mechanism, so
/// callers can surface progress without touching orchestration code.
pub trait PipelineLogger: Send {
    /// Reports frame-level progress. `total` may be zero for sources
    /// that do not declare a frame count up front.
    fn progress(&mut self, current: usize, total: usize);

    /// Records how long one processing stage took, in milliseconds.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Logs a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emits an end-of-run summary. Default implementation does nothing.
    fn summary(&self) {}
}

/// Logger that discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger for command-line use: throttled progress lines, per-stage
/// timing accumulation and a throughput summary at completion.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames_seen: usize,
}

impl StdoutPipelineLogger {
    /// `throttle_frames` controls how often progress lines are emitted;
    /// a value of 0 is treated as 1 so every frame reports.
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
        }
    }

    /// Recorded durations for one stage, if any.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(Vec::as_slice)
    }

    /// Builds the summary text, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames_seen == 0 && self.timings.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Run summary ({} frames, {elapsed_s:.1}s):",
            self.frames_seen
        )];

        let mut stages: Vec<&String> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len() as f64;
            lines.push(format!(
                "  {stage:<10} avg {avg_ms:6.1} ms  total {total_ms:8.0} ms"
            ));
        }

        if self.frames_seen > 0 && elapsed_s > 0.0 {
            lines.push(format!(
                "  throughput {:.1} fps",
                self.frames_seen as f64 / elapsed_s
            ));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if current % self.throttle_frames != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("processing: {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("processing: frame {current}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}
