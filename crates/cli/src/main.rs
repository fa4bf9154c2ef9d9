mod settings;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use invigilate_core::detection::domain::face_detector::FaceDetector;
use invigilate_core::detection::infrastructure::model_resolver;
use invigilate_core::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use invigilate_core::display::domain::display_sink::DisplaySink;
use invigilate_core::display::infrastructure::log_display_sink::LogDisplaySink;
use invigilate_core::display::infrastructure::snapshot_display_sink::SnapshotDisplaySink;
use invigilate_core::evidence::infrastructure::fs_evidence_store::FsEvidenceStore;
use invigilate_core::pipeline::infrastructure::prefetching_source::{
    PrefetchingSource, DEFAULT_PREFETCH,
};
use invigilate_core::pipeline::session_controller::SessionController;
use invigilate_core::pipeline::session_logger::StdoutSessionLogger;
use invigilate_core::presence::domain::presence_state::PresenceState;
use invigilate_core::session::domain::log_entry::LogEntry;
use invigilate_core::session::domain::session_config::{DisplayMode, SessionConfig};
use invigilate_core::session::domain::session_summary::{EndReason, SessionSummary};
use invigilate_core::session::infrastructure::fs_session_store::FsSessionStore;
use invigilate_core::shared::clock::SystemClock;
use invigilate_core::shared::constants::{DEFAULT_TICK_DELAY, FACE_MODEL_NAME, FACE_MODEL_URL};
use invigilate_core::video::domain::video_source::VideoSource;
use invigilate_core::video::infrastructure::ffmpeg_source::FfmpegSource;
use invigilate_core::video::infrastructure::image_file_writer::ImageFileWriter;

use settings::Settings;

const PREVIEW_JPEG_QUALITY: u8 = 75;

/// Supervises a camera feed and flags sustained absence of a face.
///
/// Unset options fall back to the saved settings file, then to defaults.
#[derive(Parser)]
#[command(name = "invigilate")]
struct Cli {
    /// Camera device, video file or stream URL.
    #[arg(long)]
    source: Option<String>,

    /// Consecutive face-less frames tolerated before ABSENT (recommended 10-80).
    #[arg(long)]
    tolerance: Option<u32>,

    /// Minimum seconds between two evidence snapshots (recommended 3-15).
    #[arg(long)]
    evidence_interval: Option<f64>,

    /// Overlay mode: exam or debug.
    #[arg(long)]
    mode: Option<DisplayMode>,

    /// Directory for session logs and summaries.
    #[arg(long)]
    logs_dir: Option<PathBuf>,

    /// Directory for absence evidence snapshots.
    #[arg(long)]
    evidence_dir: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Write the annotated frame to this image periodically.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Ticks between two preview writes.
    #[arg(long, default_value = "10")]
    preview_every: usize,

    /// Stop automatically after this many seconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Decode frames on a background thread.
    #[arg(long)]
    prefetch: bool,

    /// Delay between ticks in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TICK_DELAY.as_millis() as u64)]
    tick_delay_ms: u64,

    /// Use this ONNX model instead of the cached download.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings back to the settings file.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let auto_stop = validate(&cli)?;

    let settings_path = cli.settings.clone().or_else(Settings::default_path);
    let (settings, config) = resolve_settings(&cli, settings_path.as_deref())?;

    let detector = build_detector(&cli, &settings)?;
    let source = build_source(&cli, &settings);
    let mut displays: Vec<Box<dyn DisplaySink>> = vec![Box::new(LogDisplaySink::new())];
    if let Some(preview) = &cli.preview {
        displays.push(Box::new(SnapshotDisplaySink::new(
            preview.clone(),
            cli.preview_every,
            Box::new(ImageFileWriter::new().with_jpeg_quality(PREVIEW_JPEG_QUALITY)),
        )));
    }

    let mut controller = SessionController::new(
        source,
        detector,
        Box::new(FsEvidenceStore::new(
            settings.evidence_dir.clone(),
            Box::new(ImageFileWriter::new()),
        )),
        Box::new(FsSessionStore::new(settings.logs_dir.clone())),
        displays,
        Box::new(StdoutSessionLogger::default()),
        Box::new(SystemClock),
        Duration::from_millis(cli.tick_delay_ms),
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))?;
    }
    if let Some(limit) = auto_stop {
        let stop = stop.clone();
        std::thread::spawn(move || {
            std::thread::sleep(limit);
            stop.store(true, Ordering::Relaxed);
        });
    }

    let session_id = controller.start(config)?;
    if let Some(meta) = controller.metadata() {
        eprintln!(
            "Session {session_id} running on {} ({}x{}). Press Ctrl-C to stop.",
            meta.location, meta.width, meta.height
        );
    }
    let summary = controller.run(&stop)?;
    print_summary(&summary);

    if let EndReason::SourceFailed { reason } = &summary.end_reason {
        return Err(format!("Session ended early: {reason}").into());
    }
    if !summary.is_clean() {
        log::warn!("Session finished with storage failures; see summary above");
    }
    Ok(())
}

/// Loads the settings file, applies command-line overrides and validates
/// the result. Settings are only written back once they are known good.
fn resolve_settings(
    cli: &Cli,
    settings_path: Option<&Path>,
) -> Result<(Settings, SessionConfig), Box<dyn std::error::Error>> {
    let mut settings = match settings_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    apply_overrides(&mut settings, cli);
    let config = settings.validate()?;

    if cli.save_settings {
        let path = settings_path.ok_or("No config directory for settings")?;
        settings.save(path)?;
        log::info!("Settings saved to {}", path.display());
    }
    Ok((settings, config))
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(source) = &cli.source {
        settings.source = source.clone();
    }
    if let Some(tolerance) = cli.tolerance {
        settings.tolerance = tolerance;
    }
    if let Some(interval) = cli.evidence_interval {
        settings.evidence_interval_secs = interval;
    }
    if let Some(mode) = cli.mode {
        settings.display_mode = mode;
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    if let Some(dir) = &cli.logs_dir {
        settings.logs_dir = dir.clone();
    }
    if let Some(dir) = &cli.evidence_dir {
        settings.evidence_dir = dir.clone();
    }
}

fn build_detector(
    cli: &Cli,
    settings: &Settings,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {FACE_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        FACE_MODEL_NAME,
        FACE_MODEL_URL,
        cli.model.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    Ok(Box::new(OnnxFaceDetector::new(
        &model_path,
        settings.confidence,
    )?))
}

fn build_source(cli: &Cli, settings: &Settings) -> Box<dyn VideoSource> {
    let source: Box<dyn VideoSource> = Box::new(FfmpegSource::new(settings.source.clone()));
    if cli.prefetch {
        Box::new(PrefetchingSource::new(source, DEFAULT_PREFETCH))
    } else {
        source
    }
}

/// Checks flags that do not live in the settings file. Returns the
/// auto-stop delay, if any.
fn validate(cli: &Cli) -> Result<Option<Duration>, Box<dyn std::error::Error>> {
    if cli.preview_every == 0 {
        return Err("--preview-every must be at least 1".into());
    }
    Ok(cli.duration.map(duration_from_secs).transpose()?)
}

fn duration_from_secs(secs: f64) -> Result<Duration, String> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("Duration must be a positive number of seconds, got {secs}"));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("Duration of {secs} seconds is too large"))
}

fn print_summary(summary: &SessionSummary) {
    println!();
    println!("Session {}", summary.session_id);
    println!(
        "  Duration:  {}s",
        (summary.ended_at - summary.started_at).num_seconds()
    );
    match &summary.log_file {
        Some(path) => println!("  Log file:  {}", path.display()),
        None => println!("  Log file:  not saved"),
    }
    println!("  Entries:   {}", summary.entry_count);
    for status in PresenceState::ALL {
        println!("    {:<10} {}", status.as_str(), summary.count(status));
    }
    println!("  Evidence:  {}", summary.evidence.len());
    for artifact in &summary.evidence {
        println!("    {}", artifact.path.display());
    }
    if summary.detector_failures > 0 {
        println!("  Degraded frames: {}", summary.detector_failures);
    }
    for failure in &summary.storage_failures {
        println!("  Storage failure: {failure}");
    }

    if !summary.tail.is_empty() {
        println!();
        println!("Last {} entries:", summary.tail.len());
        println!("  {}", LogEntry::CSV_HEADER);
        for entry in &summary.tail {
            println!("  {}", entry.to_csv_row());
        }
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
