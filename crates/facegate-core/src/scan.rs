//! Scan-state machine.
//!
//! Pure transition logic: the session consumes per-frame detection
//! results plus a clock and decides when a face is stable enough to
//! accept. Capture, detection, and rendering all live elsewhere; this
//! type never touches a camera or a terminal, which is what makes the
//! acceptance rules testable frame by frame.
//!
//! Phases: `Idle -> Scanning -> Complete`. A candidate is accepted once
//! the same single face has been seen inside the target zone for
//! `stability_frames` consecutive frames. Zero faces, multiple faces,
//! or a face outside the zone reset the counter without leaving
//! `Scanning`. Exceeding the timeout aborts back to `Idle`.

use crate::types::FaceBox;
use std::time::{Duration, Instant};

/// Centered circular region a face must sit inside to count as stable.
///
/// The original operator-facing flow drew this as the scan circle; here
/// it is only a containment predicate on the face-box center.
#[derive(Debug, Clone)]
pub struct TargetZone {
    /// Circle radius as a fraction of the smaller frame dimension.
    pub radius_fraction: f32,
}

impl Default for TargetZone {
    fn default() -> Self {
        Self { radius_fraction: 0.35 }
    }
}

impl TargetZone {
    /// True if the face center lies inside the zone for a frame of the
    /// given dimensions.
    pub fn contains(&self, face: &FaceBox, frame_width: u32, frame_height: u32) -> bool {
        let cx = frame_width as f32 / 2.0;
        let cy = frame_height as f32 / 2.0;
        let radius = self.radius_fraction * frame_width.min(frame_height) as f32;

        let (fx, fy) = face.center();
        let dx = fx - cx;
        let dy = fy - cy;
        dx * dx + dy * dy <= radius * radius
    }
}

/// Acceptance rules for one scan attempt.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Consecutive single-face-in-zone frames required to accept.
    pub stability_frames: u32,
    /// Maximum scan duration before aborting back to `Idle`.
    pub timeout: Duration,
    pub zone: TargetZone,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            stability_frames: 5,
            timeout: Duration::from_secs(10),
            zone: TargetZone::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scanning,
    Complete,
}

/// Progress snapshot handed to rendering adapters. Presentation only;
/// nothing in here feeds back into the transition logic.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub consecutive: u32,
    pub required: u32,
    pub elapsed: Duration,
    pub timeout: Duration,
}

impl ScanProgress {
    /// Time left before the scan aborts.
    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.elapsed)
    }
}

/// Outcome of feeding one frame's detections into the session.
#[derive(Debug, Clone)]
pub enum ScanStep {
    /// Still scanning; counter state attached for progress display.
    Searching(ScanProgress),
    /// Stability reached; the candidate is ready via `take_candidate`.
    Complete,
    /// Timeout exceeded; the session has reset to `Idle`.
    TimedOut,
}

/// Mutable state for one identification/registration attempt.
pub struct ScanSession {
    config: ScanConfig,
    phase: ScanPhase,
    started_at: Option<Instant>,
    consecutive: u32,
    candidate: Option<FaceBox>,
}

impl ScanSession {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            phase: ScanPhase::Idle,
            started_at: None,
            consecutive: 0,
            candidate: None,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Start (or restart) a scan attempt at the given instant.
    /// Any previously accepted candidate is discarded.
    pub fn begin(&mut self, now: Instant) {
        self.phase = ScanPhase::Scanning;
        self.started_at = Some(now);
        self.consecutive = 0;
        self.candidate = None;
    }

    /// Feed one frame's detections into the session.
    ///
    /// Only meaningful while `Scanning`: a completed session keeps
    /// reporting `Complete` until the candidate is consumed, and an
    /// idle session reports zero progress.
    pub fn observe(
        &mut self,
        faces: &[FaceBox],
        frame_width: u32,
        frame_height: u32,
        now: Instant,
    ) -> ScanStep {
        match self.phase {
            ScanPhase::Complete => return ScanStep::Complete,
            ScanPhase::Idle => return ScanStep::Searching(self.progress(Duration::ZERO)),
            ScanPhase::Scanning => {}
        }

        let elapsed = self
            .started_at
            .map(|t| now.duration_since(t))
            .unwrap_or(Duration::ZERO);

        if elapsed >= self.config.timeout {
            tracing::debug!(?elapsed, "scan timed out");
            self.reset();
            return ScanStep::TimedOut;
        }

        // Exactly one face inside the zone advances the counter;
        // anything else resets it without leaving Scanning.
        match faces {
            [face] if self.config.zone.contains(face, frame_width, frame_height) => {
                self.consecutive += 1;
                if self.consecutive >= self.config.stability_frames {
                    self.candidate = Some(face.clone());
                    self.phase = ScanPhase::Complete;
                    tracing::debug!(frames = self.consecutive, "candidate accepted");
                    return ScanStep::Complete;
                }
            }
            _ => self.consecutive = 0,
        }

        ScanStep::Searching(self.progress(elapsed))
    }

    /// Consume the accepted candidate region. Returns `None` unless the
    /// session is `Complete`; consuming resets the session to `Idle`.
    pub fn take_candidate(&mut self) -> Option<FaceBox> {
        if self.phase != ScanPhase::Complete {
            return None;
        }
        let candidate = self.candidate.take();
        self.reset();
        candidate
    }

    /// Abort the attempt and return to `Idle`, discarding all state.
    pub fn reset(&mut self) {
        self.phase = ScanPhase::Idle;
        self.started_at = None;
        self.consecutive = 0;
        self.candidate = None;
    }

    fn progress(&self, elapsed: Duration) -> ScanProgress {
        ScanProgress {
            consecutive: self.consecutive,
            required: self.config.stability_frames,
            elapsed,
            timeout: self.config.timeout,
        }
    }
}
