use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::display::domain::display_sink::{DisplaySink, TickView};
use crate::display::domain::frame_annotator::FrameAnnotator;
use crate::evidence::domain::evidence_capturer::EvidenceCapturer;
use crate::evidence::domain::evidence_store::{EvidenceArtifact, EvidenceStore};
use crate::pipeline::session_logger::SessionLogger;
use crate::presence::domain::presence_state::PresenceState;
use crate::presence::domain::presence_tracker::PresenceTracker;
use crate::session::domain::session_config::{ConfigError, SessionConfig};
use crate::session::domain::session_recorder::{RecorderError, SessionRecorder};
use crate::session::domain::session_store::SessionStore;
use crate::session::domain::session_summary::{EndReason, SessionId, SessionSummary};
use crate::shared::clock::Clock;
use crate::shared::constants::SUMMARY_TAIL_ROWS;
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_source::{SourceError, VideoSource};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("invalid session configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("video source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),
    #[error("a session is already running")]
    AlreadyRunning,
    #[error("no session is running")]
    NotRunning,
    #[error(transparent)]
    Recorder(#[from] RecorderError),
}

/// Result of one classified tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub frame_index: usize,
    pub status: PresenceState,
    pub detection_count: usize,
    pub absence_counter: u32,
    pub evidence: Option<EvidenceArtifact>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The frame was classified and logged.
    Recorded(TickRecord),
    /// Detection failed; nothing was classified, captured or logged.
    Degraded { frame_index: usize, reason: String },
    /// The source failed or ran dry; the session is over.
    Ended(SessionSummary),
}

/// Everything owned by one running session. Dropped when it ends, so a new
/// session always starts from an empty log and fresh counters.
struct ActiveSession {
    id: SessionId,
    config: SessionConfig,
    started_at: DateTime<Local>,
    tracker: PresenceTracker,
    capturer: EvidenceCapturer,
    recorder: SessionRecorder,
    evidence: Vec<EvidenceArtifact>,
    detector_failures: usize,
    storage_failures: Vec<String>,
}

impl ActiveSession {
    fn new(config: SessionConfig, min_interval: Duration, started_at: DateTime<Local>) -> Self {
        Self {
            id: SessionId::from_start(&started_at),
            tracker: PresenceTracker::new(config.tolerance),
            capturer: EvidenceCapturer::new(min_interval),
            recorder: SessionRecorder::new(),
            config,
            started_at,
            evidence: Vec::new(),
            detector_failures: 0,
            storage_failures: Vec::new(),
        }
    }

    fn view(&self, frame_index: usize, status: Option<PresenceState>, count: usize) -> TickView {
        TickView {
            frame_index,
            status,
            detection_count: count,
            absence_counter: self.tracker.absence_counter(),
            tolerance: self.tracker.tolerance(),
            evidence_saved: false,
            mode: self.config.display_mode,
        }
    }
}

/// Drives a supervision session: IDLE until [`start`](Self::start), then one
/// read → detect → classify → capture → record → display pass per
/// [`tick`](Self::tick), back to IDLE on [`stop`](Self::stop) or source loss.
///
/// Ticks run strictly one after another on the caller's thread, so the
/// tracker sees detections in frame-arrival order.
pub struct SessionController {
    source: Box<dyn VideoSource>,
    detector: Box<dyn FaceDetector>,
    evidence_store: Box<dyn EvidenceStore>,
    session_store: Box<dyn SessionStore>,
    displays: Vec<Box<dyn DisplaySink>>,
    annotator: FrameAnnotator,
    logger: Box<dyn SessionLogger>,
    clock: Box<dyn Clock>,
    tick_delay: Duration,
    metadata: Option<VideoMetadata>,
    session: Option<ActiveSession>,
}

impl SessionController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn VideoSource>,
        detector: Box<dyn FaceDetector>,
        evidence_store: Box<dyn EvidenceStore>,
        session_store: Box<dyn SessionStore>,
        displays: Vec<Box<dyn DisplaySink>>,
        logger: Box<dyn SessionLogger>,
        clock: Box<dyn Clock>,
        tick_delay: Duration,
    ) -> Self {
        Self {
            source,
            detector,
            evidence_store,
            session_store,
            displays,
            annotator: FrameAnnotator::default(),
            logger,
            clock,
            tick_delay,
            metadata: None,
            session: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|s| &s.id)
    }

    /// Properties of the source opened by the current or last session.
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    /// IDLE → RUNNING. The configuration is validated before the source is
    /// touched; a rejected configuration leaves the controller idle.
    pub fn start(&mut self, config: SessionConfig) -> Result<SessionId, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyRunning);
        }
        config.validate()?;
        let min_interval = config.evidence_interval()?;

        let metadata = self.source.open().map_err(SessionError::SourceUnavailable)?;
        log::info!(
            "Source {} opened: {}x{} @ {:.1} fps ({})",
            metadata.location,
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.codec
        );
        self.metadata = Some(metadata);

        let session = ActiveSession::new(config, min_interval, self.clock.now().wall);
        let id = session.id.clone();
        self.logger.begin_session();
        self.logger.info(&format!(
            "Session {id} started (tolerance {}, evidence every {}s, {} mode)",
            session.config.tolerance,
            session.config.evidence_interval_secs,
            session.config.display_mode
        ));
        self.session = Some(session);
        Ok(id)
    }

    /// Processes one frame. A source failure ends the session and returns
    /// [`TickOutcome::Ended`] with the finished summary.
    pub fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        if self.session.is_none() {
            return Err(SessionError::NotRunning);
        }

        let t = Instant::now();
        let frame = match self.source.read() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Video source lost: {e}");
                let summary = self.finish(EndReason::SourceFailed {
                    reason: e.to_string(),
                })?;
                return Ok(TickOutcome::Ended(summary));
            }
        };
        self.logger.timing("read", elapsed_ms(t));
        let now = self.clock.now();

        let Some(session) = self.session.as_mut() else {
            return Err(SessionError::NotRunning);
        };

        let t = Instant::now();
        let regions = match self.detector.detect(&frame) {
            Ok(regions) => regions,
            Err(e) => {
                log::warn!("Detection failed on frame {}: {e}", frame.index());
                session.detector_failures += 1;
                let view = session.view(frame.index(), None, 0);
                present_all(&mut self.displays, &self.annotator, &frame, &[], &view);
                self.logger.tick(frame.index());
                return Ok(TickOutcome::Degraded {
                    frame_index: frame.index(),
                    reason: e.to_string(),
                });
            }
        };
        self.logger.timing("detect", elapsed_ms(t));

        let count = regions.len();
        let status = session.tracker.classify(count);

        let t = Instant::now();
        let evidence = match session.capturer.maybe_capture(
            &frame,
            status,
            &now,
            self.evidence_store.as_ref(),
        ) {
            Ok(artifact) => artifact,
            Err(e) => {
                log::warn!("Evidence not saved: {e}");
                session.storage_failures.push(e.to_string());
                None
            }
        };
        if let Some(artifact) = &evidence {
            session.evidence.push(artifact.clone());
        }
        self.logger.timing("capture", elapsed_ms(t));

        let t = Instant::now();
        session.recorder.record(now.wall, status, count)?;
        self.logger.timing("record", elapsed_ms(t));

        let mut view = session.view(frame.index(), Some(status), count);
        view.evidence_saved = evidence.is_some();
        let t = Instant::now();
        present_all(&mut self.displays, &self.annotator, &frame, &regions, &view);
        self.logger.timing("display", elapsed_ms(t));

        self.logger.metric("detections", count as f64);
        self.logger.metric("absence_counter", view.absence_counter as f64);
        self.logger.tick(frame.index());

        Ok(TickOutcome::Recorded(TickRecord {
            frame_index: frame.index(),
            status,
            detection_count: count,
            absence_counter: view.absence_counter,
            evidence,
        }))
    }

    /// RUNNING → IDLE on operator request.
    pub fn stop(&mut self) -> Result<SessionSummary, SessionError> {
        if self.session.is_none() {
            return Err(SessionError::NotRunning);
        }
        self.finish(EndReason::Stopped)
    }

    /// Ticks until `stop` is raised or the source ends, sleeping the
    /// configured delay between ticks. The flag is checked before each tick.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<SessionSummary, SessionError> {
        if self.session.is_none() {
            return Err(SessionError::NotRunning);
        }
        loop {
            if stop.load(Ordering::Relaxed) {
                return self.stop();
            }
            if let TickOutcome::Ended(summary) = self.tick()? {
                return Ok(summary);
            }
            if !self.tick_delay.is_zero() {
                std::thread::sleep(self.tick_delay);
            }
        }
    }

    fn finish(&mut self, end_reason: EndReason) -> Result<SessionSummary, SessionError> {
        let mut session = self.session.take().ok_or(SessionError::NotRunning)?;
        self.source.release();

        let log = session.recorder.finalize()?;
        let ended_at = self.clock.now().wall;
        let mut storage_failures = std::mem::take(&mut session.storage_failures);

        let log_file = match self.session_store.persist_log(&session.id, &log) {
            Ok(path) => {
                log::info!("Session log written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::error!("Session log not saved: {e}");
                storage_failures.push(e.to_string());
                None
            }
        };

        let mut summary = SessionSummary {
            session_id: session.id,
            config: session.config,
            started_at: session.started_at,
            ended_at,
            end_reason,
            log_file,
            entry_count: log.len(),
            status_counts: log.status_counts(),
            tail: log.tail(SUMMARY_TAIL_ROWS).to_vec(),
            evidence: session.evidence,
            detector_failures: session.detector_failures,
            storage_failures,
        };

        if let Err(e) = self.session_store.persist_summary(&summary) {
            log::error!("Session summary not saved: {e}");
            summary.storage_failures.push(e.to_string());
        }

        self.logger.info(&format!(
            "Session {} ended: {} entries, {} evidence captures",
            summary.session_id,
            summary.entry_count,
            summary.evidence.len()
        ));
        self.logger.summary();
        Ok(summary)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.session.is_some() {
            log::warn!("Session controller dropped while running; releasing source");
            self.source.release();
        }
    }
}

fn present_all(
    displays: &mut [Box<dyn DisplaySink>],
    annotator: &FrameAnnotator,
    frame: &Frame,
    regions: &[Region],
    view: &TickView,
) {
    if displays.is_empty() {
        return;
    }
    let mut annotated = frame.clone();
    annotator.annotate(&mut annotated, regions, view);
    for display in displays.iter_mut() {
        display.present(&annotated, view);
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
