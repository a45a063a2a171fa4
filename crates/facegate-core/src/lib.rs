//! facegate-core — Face detection and matching engine.
//!
//! Wraps the SeetaFace cascade classifier for detection, runs a pure
//! scan-state machine over per-frame detections, and matches accepted
//! face crops against a gallery by normalized cross-correlation.

pub mod detect;
pub mod matcher;
pub mod region;
pub mod scan;
pub mod types;

pub use detect::{CascadeDetector, DetectError, FaceDetector};
pub use matcher::{MatchOutcome, Matcher, ReferenceFace, TemplateMatcher, NORMALIZED_FACE_SIZE};
pub use region::{crop_face, RegionError};
pub use scan::{ScanConfig, ScanPhase, ScanProgress, ScanSession, ScanStep, TargetZone};
pub use types::FaceBox;

use std::path::PathBuf;

/// Default directory for the SeetaFace detection model
/// (`/usr/share/facegate/models`, overridable via `FACEGATE_MODEL_PATH`).
pub fn default_model_dir() -> PathBuf {
    PathBuf::from("/usr/share/facegate/models")
}
