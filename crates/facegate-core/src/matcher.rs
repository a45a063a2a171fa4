//! Gallery matching by normalized cross-correlation.
//!
//! Candidate and reference crops are normalized to a fixed square size
//! and scored pairwise with the `imageproc` template-matching primitive.
//! The metric is deliberately behind the [`Matcher`] trait: the contract
//! is one score per gallery entry compared against a threshold, not NCC
//! itself.

use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::template_matching::{match_template, MatchTemplateMethod};
use serde::Serialize;

/// Side length both crops are resized to before scoring.
pub const NORMALIZED_FACE_SIZE: u32 = 128;

/// A gallery entry loaded for matching: identity plus its normalized
/// reference crop.
#[derive(Debug, Clone)]
pub struct ReferenceFace {
    pub entry_id: i64,
    pub identity: String,
    pub pixels: GrayImage,
}

impl ReferenceFace {
    pub fn new(entry_id: i64, identity: impl Into<String>, image: &GrayImage) -> Self {
        Self {
            entry_id,
            identity: identity.into(),
            pixels: normalize_face(image),
        }
    }
}

/// Result of comparing one candidate against the full gallery.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub matched: bool,
    /// Similarity of the best entry, in [0, 1]. Zero for an empty gallery.
    pub score: f32,
    pub identity: Option<String>,
    pub entry_id: Option<i64>,
}

impl MatchOutcome {
    fn no_match(score: f32) -> Self {
        Self { matched: false, score, identity: None, entry_id: None }
    }
}

/// Strategy for comparing a candidate crop against the gallery.
pub trait Matcher {
    fn compare(&self, probe: &GrayImage, gallery: &[ReferenceFace], threshold: f32) -> MatchOutcome;
}

/// Normalized cross-correlation matcher.
pub struct TemplateMatcher;

impl Matcher for TemplateMatcher {
    fn compare(&self, probe: &GrayImage, gallery: &[ReferenceFace], threshold: f32) -> MatchOutcome {
        // Empty gallery short-circuits before any scoring.
        if gallery.is_empty() {
            return MatchOutcome::no_match(0.0);
        }

        let probe = normalize_face(probe);

        let mut best_score = f32::NEG_INFINITY;
        let mut best_idx: Option<usize> = None;

        for (i, reference) in gallery.iter().enumerate() {
            let score = ncc(&probe, &reference.pixels);
            tracing::trace!(identity = %reference.identity, score, "scored gallery entry");
            if score > best_score {
                best_score = score;
                best_idx = Some(i);
            }
        }

        match best_idx {
            Some(idx) if best_score >= threshold => MatchOutcome {
                matched: true,
                score: best_score,
                identity: Some(gallery[idx].identity.clone()),
                entry_id: Some(gallery[idx].entry_id),
            },
            _ => MatchOutcome::no_match(best_score.max(0.0)),
        }
    }
}

/// Resize a crop to the canonical matching size. Already-normalized
/// images pass through untouched.
pub fn normalize_face(image: &GrayImage) -> GrayImage {
    if image.width() == NORMALIZED_FACE_SIZE && image.height() == NORMALIZED_FACE_SIZE {
        return image.clone();
    }
    imageops::resize(image, NORMALIZED_FACE_SIZE, NORMALIZED_FACE_SIZE, FilterType::Triangle)
}

/// Normalized cross-correlation of two equally sized crops.
///
/// With equal dimensions the correlation surface is a single value.
/// All-zero inputs make the denominator vanish; that case scores 0.
fn ncc(probe: &GrayImage, reference: &GrayImage) -> f32 {
    let surface = match_template(probe, reference, MatchTemplateMethod::CrossCorrelationNormalized);
    let score = surface.get_pixel(0, 0)[0];
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn textured(seed: u32) -> GrayImage {
        GrayImage::from_fn(NORMALIZED_FACE_SIZE, NORMALIZED_FACE_SIZE, |x, y| {
            Luma([((x * 7 + y * 13 + seed) % 251) as u8])
        })
    }

    fn left_bright() -> GrayImage {
        GrayImage::from_fn(NORMALIZED_FACE_SIZE, NORMALIZED_FACE_SIZE, |x, _| {
            Luma([if x < NORMALIZED_FACE_SIZE / 2 { 255 } else { 0 }])
        })
    }

    fn right_bright() -> GrayImage {
        GrayImage::from_fn(NORMALIZED_FACE_SIZE, NORMALIZED_FACE_SIZE, |x, _| {
            Luma([if x >= NORMALIZED_FACE_SIZE / 2 { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_identical_images_score_near_one() {
        let img = textured(0);
        let gallery = vec![ReferenceFace::new(1, "alice", &img)];
        let outcome = TemplateMatcher.compare(&img, &gallery, 0.6);
        assert!(outcome.matched);
        assert!(outcome.score > 0.99, "score {}", outcome.score);
        assert_eq!(outcome.identity.as_deref(), Some("alice"));
        assert_eq!(outcome.entry_id, Some(1));
    }

    #[test]
    fn test_best_entry_wins() {
        let probe = textured(0);
        let gallery = vec![
            ReferenceFace::new(1, "decoy", &left_bright()),
            ReferenceFace::new(2, "match", &textured(0)),
        ];
        let outcome = TemplateMatcher.compare(&probe, &gallery, 0.6);
        assert!(outcome.matched);
        assert_eq!(outcome.identity.as_deref(), Some("match"));
    }

    #[test]
    fn test_below_threshold_is_negative_with_score() {
        // Disjoint bright halves: correlation collapses to ~0.
        let outcome = TemplateMatcher.compare(
            &left_bright(),
            &[ReferenceFace::new(1, "bob", &right_bright())],
            0.6,
        );
        assert!(!outcome.matched);
        assert!(outcome.score < 0.6, "score {}", outcome.score);
        assert!(outcome.identity.is_none());
    }

    #[test]
    fn test_empty_gallery_no_match() {
        let outcome = TemplateMatcher.compare(&textured(0), &[], 0.6);
        assert!(!outcome.matched);
        assert_eq!(outcome.score, 0.0);
        assert!(outcome.identity.is_none());
    }

    #[test]
    fn test_compare_is_idempotent() {
        let probe = textured(3);
        let gallery = vec![
            ReferenceFace::new(1, "a", &textured(3)),
            ReferenceFace::new(2, "b", &textured(90)),
        ];
        let first = TemplateMatcher.compare(&probe, &gallery, 0.6);
        let second = TemplateMatcher.compare(&probe, &gallery, 0.6);
        assert_eq!(first.matched, second.matched);
        assert_eq!(first.score, second.score);
        assert_eq!(first.identity, second.identity);
    }

    #[test]
    fn test_all_zero_images_score_zero() {
        let black = GrayImage::new(NORMALIZED_FACE_SIZE, NORMALIZED_FACE_SIZE);
        let outcome =
            TemplateMatcher.compare(&black, &[ReferenceFace::new(1, "a", &black)], 0.6);
        assert!(!outcome.matched);
        assert_eq!(outcome.score, 0.0);
    }

    #[test]
    fn test_reference_normalized_on_construction() {
        let small = imageops::resize(&textured(0), 40, 40, FilterType::Triangle);
        let reference = ReferenceFace::new(1, "a", &small);
        assert_eq!(reference.pixels.width(), NORMALIZED_FACE_SIZE);
        assert_eq!(reference.pixels.height(), NORMALIZED_FACE_SIZE);
    }
}
