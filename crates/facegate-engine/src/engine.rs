//! Scan loop and the identify/register flows.
//!
//! Single-threaded and blocking by design: each iteration blocks on a
//! camera frame, runs detection inline, and feeds the result into the
//! scan-state machine. Cancellation is polled once per iteration via
//! the observer; an in-flight detector call is not interrupted.

use crate::config::Config;
use crate::result::{Operation, OperationResult};
use chrono::Utc;
use facegate_core::{
    crop_face, matcher::normalize_face, DetectError, FaceBox, FaceDetector, MatchOutcome, Matcher,
    ReferenceFace, RegionError, ScanConfig, ScanProgress, ScanSession, ScanStep, TemplateMatcher,
};
use facegate_hw::{CameraError, FrameSource};
use facegate_store::{self as store, Registry, StoreError};
use image::GrayImage;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("detector error: {0}")]
    Detector(#[from] DetectError),
    #[error("candidate region error: {0}")]
    Region(#[from] RegionError),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Accepted candidate: the face box and its pixel crop, extracted from
/// the frame that satisfied the stability condition.
pub struct Candidate {
    pub face: FaceBox,
    pub pixels: GrayImage,
}

/// Terminal outcome of one scan attempt.
pub enum ScanOutcome {
    Accepted(Candidate),
    TimedOut,
    Cancelled,
}

/// Hook for progress rendering and cancellation, polled once per frame.
/// The default implementation renders nothing and never cancels.
pub trait ScanObserver {
    fn on_progress(&mut self, _progress: &ScanProgress) {}
    fn cancelled(&self) -> bool {
        false
    }
}

/// Observer that does nothing.
pub struct NullObserver;

impl ScanObserver for NullObserver {}

/// Drive one scan attempt to a terminal outcome.
///
/// Camera read failures and detector failures are terminal for the
/// attempt and propagate as errors; dark frames count as zero-detection
/// observations and keep the scan running toward its timeout.
pub fn run_scan(
    source: &mut dyn FrameSource,
    detector: &mut dyn FaceDetector,
    config: ScanConfig,
    observer: &mut dyn ScanObserver,
) -> Result<ScanOutcome, EngineError> {
    let mut session = ScanSession::new(config);
    session.begin(Instant::now());

    loop {
        if observer.cancelled() {
            tracing::info!("scan cancelled");
            return Ok(ScanOutcome::Cancelled);
        }

        let frame = source.next_frame()?;
        let faces = if frame.is_dark() {
            tracing::trace!(seq = frame.sequence, "dark frame, skipping detection");
            Vec::new()
        } else {
            detector.detect(&frame.data, frame.width, frame.height)?
        };

        match session.observe(&faces, frame.width, frame.height, Instant::now()) {
            ScanStep::Searching(progress) => observer.on_progress(&progress),
            ScanStep::TimedOut => return Ok(ScanOutcome::TimedOut),
            ScanStep::Complete => {
                let Some(face) = session.take_candidate() else {
                    // A completed session always holds a candidate.
                    continue;
                };
                let pixels = crop_face(&frame.data, frame.width, frame.height, &face)?;
                tracing::info!(
                    x = face.x,
                    y = face.y,
                    width = face.width,
                    height = face.height,
                    "candidate accepted"
                );
                return Ok(ScanOutcome::Accepted(Candidate { face, pixels }));
            }
        }
    }
}

/// Identification and registration flows over one camera, detector, and
/// registry. All outcomes convert to [`OperationResult`] here; callers
/// never see raw errors.
pub struct Engine {
    config: Config,
    detector: Box<dyn FaceDetector>,
    registry: Registry,
    matcher: TemplateMatcher,
}

impl Engine {
    pub fn new(config: Config, detector: Box<dyn FaceDetector>, registry: Registry) -> Self {
        Self { config, detector, registry, matcher: TemplateMatcher }
    }

    /// Scan for a stable face and match it against the enabled gallery.
    pub fn identify(
        &mut self,
        source: &mut dyn FrameSource,
        observer: &mut dyn ScanObserver,
    ) -> OperationResult {
        match self.try_identify(source, observer) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "identification failed");
                OperationResult::failure(Operation::Identify, format!("identification failed: {e}"))
            }
        }
    }

    /// Scan for a stable face and register it under the given identity.
    pub fn register(
        &mut self,
        source: &mut dyn FrameSource,
        observer: &mut dyn ScanObserver,
        identity: &str,
    ) -> OperationResult {
        let identity = identity.trim();
        if identity.is_empty() {
            return OperationResult::failure(Operation::Register, "identity label required");
        }
        match self.try_register(source, observer, identity) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, identity, "registration failed");
                OperationResult::failure(Operation::Register, format!("registration failed: {e}"))
            }
        }
    }

    fn try_identify(
        &mut self,
        source: &mut dyn FrameSource,
        observer: &mut dyn ScanObserver,
    ) -> Result<OperationResult, EngineError> {
        let gallery = self.load_gallery()?;
        tracing::debug!(entries = gallery.len(), "gallery loaded");

        let candidate = match run_scan(
            source,
            self.detector.as_mut(),
            self.config.identify_scan(),
            observer,
        )? {
            ScanOutcome::Accepted(candidate) => candidate,
            ScanOutcome::TimedOut => {
                return Ok(OperationResult::failure(
                    Operation::Identify,
                    "scan timed out: no face detected",
                ))
            }
            ScanOutcome::Cancelled => {
                return Ok(OperationResult::failure(Operation::Identify, "scan cancelled"))
            }
        };

        let outcome: MatchOutcome =
            self.matcher
                .compare(&candidate.pixels, &gallery, self.config.similarity_threshold);

        if outcome.matched {
            // entry_id is always present on a positive match.
            if let Some(entry_id) = outcome.entry_id {
                self.registry.touch_last_matched(entry_id, Utc::now())?;
            }
            let identity = outcome.identity.unwrap_or_default();
            tracing::info!(identity = %identity, score = outcome.score, "identified");
            Ok(OperationResult::success(
                Operation::Identify,
                identity.clone(),
                outcome.score,
                format!("identified as {identity}"),
            ))
        } else {
            tracing::info!(score = outcome.score, "face not recognized");
            Ok(OperationResult::not_recognized(
                Operation::Identify,
                outcome.score,
                "face detected but not recognized",
            ))
        }
    }

    fn try_register(
        &mut self,
        source: &mut dyn FrameSource,
        observer: &mut dyn ScanObserver,
        identity: &str,
    ) -> Result<OperationResult, EngineError> {
        let candidate = match run_scan(
            source,
            self.detector.as_mut(),
            self.config.register_scan(),
            observer,
        )? {
            ScanOutcome::Accepted(candidate) => candidate,
            ScanOutcome::TimedOut => {
                return Ok(OperationResult::failure(
                    Operation::Register,
                    "scan timed out: no face detected",
                ))
            }
            ScanOutcome::Cancelled => {
                return Ok(OperationResult::failure(Operation::Register, "scan cancelled"))
            }
        };

        // Image first, row second: a failed image write must leave the
        // registry untouched for this identity.
        let reference = normalize_face(&candidate.pixels);
        let image_path = store::save_reference(&self.config.images_dir, &reference)?;

        let (entry, replaced) = match self.registry.upsert(identity, &image_path, Utc::now()) {
            Ok(result) => result,
            Err(e) => {
                // Don't leave an orphan image behind either.
                store::remove_reference(&image_path);
                return Err(e.into());
            }
        };

        if let Some(stale) = replaced {
            store::remove_reference(&stale);
        }

        tracing::info!(identity = %entry.identity, path = %entry.image_path.display(), "registered");
        Ok(OperationResult::success(
            Operation::Register,
            entry.identity.clone(),
            1.0,
            format!("registered {}", entry.identity),
        ))
    }

    /// Load enabled gallery entries and their reference images.
    /// Entries whose image fails to load are skipped with a warning.
    fn load_gallery(&self) -> Result<Vec<ReferenceFace>, EngineError> {
        let mut gallery = Vec::new();
        for entry in self.registry.list_enabled()? {
            match store::load_reference(&entry.image_path) {
                Ok(img) => gallery.push(ReferenceFace::new(entry.id, &entry.identity, &img)),
                Err(e) => tracing::warn!(
                    identity = %entry.identity,
                    path = %entry.image_path.display(),
                    error = %e,
                    "skipping gallery entry with unreadable reference image"
                ),
            }
        }
        Ok(gallery)
    }

    /// Direct registry access for gallery management (list/remove).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
