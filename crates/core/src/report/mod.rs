//! Report generation for aggregated violation events.
//!
//! A run produces up to three artifacts: a CSV export, a text summary
//! and a PNG bar chart. File names carry a wall-clock timestamp so
//! repeated runs into the same directory never collide.

pub mod chart;
pub mod csv;
pub mod text;

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use log::info;

use crate::violations::aggregate::AggregatedEvent;

/// Paths of the files produced by one `write_all` invocation.
#[derive(Clone, Debug)]
pub struct ReportPaths {
    pub csv: PathBuf,
    pub text: PathBuf,
    /// `None` when there were no events to chart.
    pub chart: Option<PathBuf>,
}

pub struct ReportBuilder {
    reports_dir: PathBuf,
}

impl ReportBuilder {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Write all report files, named after `generated_at`, creating the
    /// reports directory if needed. Write failures propagate; partial
    /// output is left in place.
    pub fn write_all(
        &self,
        events: &[AggregatedEvent],
        generated_at: DateTime<Local>,
    ) -> Result<ReportPaths, Box<dyn std::error::Error>> {
        fs::create_dir_all(&self.reports_dir)?;

        let stem = format!("violations_{}", generated_at.format("%Y%m%d_%H%M%S"));

        let csv_path = self.reports_dir.join(format!("{stem}.csv"));
        csv::write(&csv_path, events)?;

        let text_path = self.reports_dir.join(format!("{stem}.txt"));
        text::write(&text_path, events, generated_at)?;

        let chart_path = match chart::render(events) {
            Some(image) => {
                let path = self.reports_dir.join(format!("{stem}.png"));
                image.save(&path)?;
                Some(path)
            }
            None => None,
        };

        info!(
            "wrote {} event(s) to {}",
            events.len(),
            self.reports_dir.display()
        );

        Ok(ReportPaths {
            csv: csv_path,
            text: text_path,
            chart: chart_path,
        })
    }
}
