use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use chrono::Local;
use clap::Parser;

use vigil_core::detection::domain::violation_detector::ViolationDetector;
use vigil_core::detection::infrastructure::onnx_violation_detector::OnnxViolationDetector;
use vigil_core::detection::infrastructure::skip_frame_detector::SkipFrameDetector;
use vigil_core::pipeline::monitor_session::{MonitorSession, SessionConfig};
use vigil_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};
use vigil_core::recognition::infrastructure::onnx_face_engine::OnnxFaceEngine;
use vigil_core::report::ReportBuilder;
use vigil_core::shared::constants::{
    FACE_DETECT_MODEL_NAME, FACE_DETECT_MODEL_URL, FACE_EMBED_MODEL_NAME, FACE_EMBED_MODEL_URL,
    IMAGE_EXTENSIONS,
};
use vigil_core::shared::model_resolver;
use vigil_core::video::domain::image_writer::ImageWriter;
use vigil_core::video::domain::video_reader::VideoReader;
use vigil_core::video::domain::video_writer::VideoWriter;
use vigil_core::video::infrastructure::ffmpeg_reader::FfmpegVideoReader;
use vigil_core::video::infrastructure::ffmpeg_writer::FfmpegVideoWriter;
use vigil_core::video::infrastructure::image_file_reader::{self, ImageFileReader};
use vigil_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Violation monitoring for classroom and exam videos.
#[derive(Parser)]
#[command(name = "vigil")]
struct Cli {
    /// Input video or image file.
    input: PathBuf,

    /// ONNX violation detection model.
    #[arg(long)]
    model: PathBuf,

    /// Annotated output: a video for video input, an image for image input.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f32,

    /// IoU threshold for non-maximum suppression (0.0-1.0).
    #[arg(long, default_value = "0.45")]
    iou: f32,

    /// Aggregation window in seconds: same-class detections closer than
    /// this count as one event.
    #[arg(long, default_value = "2.0")]
    window: f64,

    /// Directory for report files and saved face crops.
    #[arg(long, default_value = "reports")]
    reports_dir: PathBuf,

    /// Run detection every Nth frame (1 = every frame).
    #[arg(long, default_value = "1")]
    skip_frames: u32,

    /// Attribute violations to people via face recognition.
    #[arg(long)]
    recognize_faces: bool,

    /// Register a known face as NAME=IMAGE (repeatable, implies
    /// --recognize-faces).
    #[arg(long, value_name = "NAME=IMAGE")]
    known_face: Vec<String>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    validate(&cli)?;

    let detector = build_detector(&cli)?;
    let config = SessionConfig {
        confidence_threshold: cli.confidence,
        window_seconds: cli.window,
        reports_dir: cli.reports_dir.clone(),
    };

    let mut session = MonitorSession::new(detector, Box::new(ImageFileWriter::new()), config);
    if cli.recognize_faces || !cli.known_face.is_empty() {
        session = session.with_face_recognition(Box::new(build_face_engine()?));
        register_known_faces(&mut session, &cli.known_face)?;
    }

    if is_image(&cli.input) {
        run_image(&mut session, &cli.input, cli.output.as_deref())?;
    } else {
        run_video(&mut session, &cli.input, cli.output.as_deref())?;
    }

    write_reports(&session)
}

fn run_video(
    session: &mut MonitorSession,
    input: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = FfmpegVideoReader::open(input)?;
    let metadata = reader.metadata().clone();
    log::info!("opened {}: {}", input.display(), metadata.describe());

    let mut writer = match output {
        Some(path) => Some(FfmpegVideoWriter::create(path, &metadata)?),
        None => None,
    };

    let mut logger = StdoutPipelineLogger::default();
    let mut run = session.start_run(Box::new(reader));
    loop {
        let started = Instant::now();
        let Some(processed) = run.next_frame()? else {
            break;
        };
        logger.timing("frame", started.elapsed().as_secs_f64() * 1000.0);
        if let Some(writer) = writer.as_mut() {
            writer.write_frame(&processed.frame)?;
        }
        logger.progress(processed.index + 1, metadata.total_frames);
    }
    run.finish();

    if let Some(mut writer) = writer {
        writer.finish()?;
        if let Some(path) = output {
            log::info!("annotated video written to {}", path.display());
        }
    }
    logger.summary();
    Ok(())
}

fn run_image(
    session: &mut MonitorSession,
    input: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = ImageFileReader::open(input)?;
    let mut run = session.start_run(Box::new(reader));
    let processed = run.next_frame()?;
    run.finish();

    if let (Some(path), Some(processed)) = (output, processed.as_ref()) {
        let frame = &processed.frame;
        ImageFileWriter::new().write(path, frame.data(), frame.width(), frame.height())?;
        log::info!("annotated image written to {}", path.display());
    }
    Ok(())
}

fn write_reports(session: &MonitorSession) -> Result<(), Box<dyn std::error::Error>> {
    let events = session.aggregate_history()?;
    log::info!(
        "{} violation record(s) aggregated into {} event(s)",
        session.history().len(),
        events.len()
    );

    let builder = ReportBuilder::new(&session.config().reports_dir);
    let paths = builder.write_all(&events, Local::now())?;
    log::info!("CSV report: {}", paths.csv.display());
    log::info!("text report: {}", paths.text.display());
    if let Some(chart) = &paths.chart {
        log::info!("chart: {}", chart.display());
    }
    Ok(())
}

fn build_detector(cli: &Cli) -> Result<Box<dyn ViolationDetector>, Box<dyn std::error::Error>> {
    log::info!("loading detection model {}", cli.model.display());
    let base: Box<dyn ViolationDetector> =
        Box::new(OnnxViolationDetector::new(&cli.model)?.with_iou_threshold(cli.iou));

    if cli.skip_frames > 1 {
        Ok(Box::new(SkipFrameDetector::new(base, cli.skip_frames)?))
    } else {
        Ok(base)
    }
}

fn build_face_engine() -> Result<OnnxFaceEngine, Box<dyn std::error::Error>> {
    let detector_path = model_resolver::resolve(
        FACE_DETECT_MODEL_NAME,
        FACE_DETECT_MODEL_URL,
        Some(Box::new(download_progress)),
    )?;
    let embedder_path = model_resolver::resolve(
        FACE_EMBED_MODEL_NAME,
        FACE_EMBED_MODEL_URL,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();
    Ok(OnnxFaceEngine::new(&detector_path, &embedder_path)?)
}

fn register_known_faces(
    session: &mut MonitorSession,
    entries: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    for entry in entries {
        let Some((name, photo)) = entry.split_once('=') else {
            return Err(format!("invalid --known-face '{entry}', expected NAME=IMAGE").into());
        };
        if name.is_empty() || photo.is_empty() {
            return Err(format!("invalid --known-face '{entry}', expected NAME=IMAGE").into());
        }

        let photo_path = PathBuf::from(photo);
        let frame = image_file_reader::load_frame(&photo_path)?;
        if !session.register_known_face(name, &frame)? {
            log::warn!("no face found in {}, skipping '{name}'", photo_path.display());
        }
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !cli.model.exists() {
        return Err(format!("Model file not found: {}", cli.model.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.iou) {
        return Err(format!("IoU must be between 0.0 and 1.0, got {}", cli.iou).into());
    }
    if !cli.window.is_finite() || cli.window < 0.0 {
        return Err(format!(
            "Window must be a non-negative number of seconds, got {}",
            cli.window
        )
        .into());
    }
    if cli.skip_frames < 1 {
        return Err("--skip-frames must be at least 1".into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face model... {pct}%");
    } else {
        eprint!("\rDownloading face model... {downloaded} bytes");
    }
}
