//! Face detection via the SeetaFace funnel-structured cascade.
//!
//! The classifier itself is an external collaborator (the `rustface`
//! crate); this module only adapts it to the [`FaceDetector`] seam the
//! scan loop is written against.

use crate::types::FaceBox;
use rustface::ImageData;
use std::path::Path;
use thiserror::Error;

// Cascade tuning. The window step and pyramid factor trade recall for
// per-frame latency; these values keep a 640x480 frame under ~50 ms on
// typical laptop CPUs.
const MIN_FACE_SIZE: u32 = 40;
const SCORE_THRESHOLD: f64 = 2.0;
const PYRAMID_SCALE_FACTOR: f32 = 0.8;
const SLIDE_WINDOW_STEP: u32 = 4;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("model file not found: {0} (download the SeetaFace frontal model and point FACEGATE_MODEL_PATH at it)")]
    ModelNotFound(String),
    #[error("failed to load cascade model: {0}")]
    ModelLoad(String),
    #[error("frame buffer too short: expected {expected} bytes, got {actual}")]
    BadFrame { expected: usize, actual: usize },
}

/// Seam between the scan loop and the concrete detector.
///
/// Implementations take a grayscale frame buffer and return zero or
/// more face boxes. Tests drive the loop with scripted implementations.
pub trait FaceDetector {
    fn detect(&mut self, frame: &[u8], width: u32, height: u32) -> Result<Vec<FaceBox>, DetectError>;
}

/// SeetaFace cascade detector.
pub struct CascadeDetector {
    inner: Box<dyn rustface::Detector>,
}

impl std::fmt::Debug for CascadeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeDetector").finish_non_exhaustive()
    }
}

impl CascadeDetector {
    /// Load the cascade model from the given path.
    pub fn load(model_path: &str) -> Result<Self, DetectError> {
        if !Path::new(model_path).exists() {
            return Err(DetectError::ModelNotFound(model_path.to_string()));
        }

        let mut inner = rustface::create_detector(model_path)
            .map_err(|e| DetectError::ModelLoad(format!("{model_path}: {e}")))?;

        inner.set_min_face_size(MIN_FACE_SIZE);
        inner.set_score_thresh(SCORE_THRESHOLD);
        inner.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        inner.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        tracing::info!(path = model_path, "loaded SeetaFace cascade model");

        Ok(Self { inner })
    }
}

impl FaceDetector for CascadeDetector {
    /// Detect faces in a grayscale frame, returning boxes sorted by score.
    fn detect(&mut self, frame: &[u8], width: u32, height: u32) -> Result<Vec<FaceBox>, DetectError> {
        let expected = (width * height) as usize;
        if frame.len() < expected {
            return Err(DetectError::BadFrame { expected, actual: frame.len() });
        }

        let mut image = ImageData::new(&frame[..expected], width, height);
        let found = self.inner.detect(&mut image);

        let mut faces: Vec<FaceBox> = found
            .iter()
            .map(|info| {
                let bbox = info.bbox();
                FaceBox {
                    x: bbox.x() as f32,
                    y: bbox.y() as f32,
                    width: bbox.width() as f32,
                    height: bbox.height() as f32,
                    confidence: info.score() as f32,
                }
            })
            .collect();

        faces.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::trace!(count = faces.len(), "cascade pass complete");
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_model() {
        let err = CascadeDetector::load("/nonexistent/seeta.bin").unwrap_err();
        assert!(matches!(err, DetectError::ModelNotFound(_)));
    }
}
