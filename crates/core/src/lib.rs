//! Core engine for the vigil violation monitor.
//!
//! Runs a pretrained detector over video frames to flag violation
//! behaviors (sleeping, phone use, eating, drinking), optionally
//! attributes them to known faces, aggregates the raw detections into
//! discrete events and exports CSV, text and chart reports.

pub mod detection;
pub mod pipeline;
pub mod recognition;
pub mod report;
pub mod shared;
pub mod video;
pub mod violations;
