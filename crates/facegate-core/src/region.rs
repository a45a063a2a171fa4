//! Candidate-region extraction: crop a face box out of a grayscale frame.

use crate::types::FaceBox;
use image::GrayImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("face region has zero area after clamping to the frame")]
    ZeroArea,
    #[error("frame buffer too short: expected {expected} bytes, got {actual}")]
    BadFrame { expected: usize, actual: usize },
}

/// Crop the face region out of a grayscale frame buffer.
///
/// The box is clamped to the frame bounds first; a box that clamps to
/// zero width or height is an error, never an empty image.
pub fn crop_face(
    frame: &[u8],
    width: u32,
    height: u32,
    face: &FaceBox,
) -> Result<GrayImage, RegionError> {
    let expected = (width * height) as usize;
    if frame.len() < expected {
        return Err(RegionError::BadFrame { expected, actual: frame.len() });
    }

    let x0 = face.x.max(0.0).round() as u32;
    let y0 = face.y.max(0.0).round() as u32;
    let x1 = ((face.x + face.width).round() as i64).clamp(0, width as i64) as u32;
    let y1 = ((face.y + face.height).round() as i64).clamp(0, height as i64) as u32;

    if x1 <= x0 || y1 <= y0 || x0 >= width || y0 >= height {
        return Err(RegionError::ZeroArea);
    }

    let crop_w = x1 - x0;
    let crop_h = y1 - y0;
    let mut out = Vec::with_capacity((crop_w * crop_h) as usize);
    for y in y0..y1 {
        let row = (y * width + x0) as usize;
        out.extend_from_slice(&frame[row..row + crop_w as usize]);
    }

    // Dimensions match the buffer length by construction.
    GrayImage::from_raw(crop_w, crop_h, out).ok_or(RegionError::ZeroArea)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(w: u32, h: u32) -> Vec<u8> {
        (0..(w * h)).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_crop_interior() {
        let frame = gradient_frame(10, 10);
        let face = FaceBox { x: 2.0, y: 3.0, width: 4.0, height: 5.0, confidence: 1.0 };
        let crop = crop_face(&frame, 10, 10, &face).unwrap();
        assert_eq!((crop.width(), crop.height()), (4, 5));
        // Top-left pixel of the crop is frame[(3, 2)]
        assert_eq!(crop.get_pixel(0, 0)[0], frame[3 * 10 + 2]);
    }

    #[test]
    fn test_crop_clamped_to_frame() {
        let frame = gradient_frame(10, 10);
        let face = FaceBox { x: 7.0, y: -2.0, width: 8.0, height: 6.0, confidence: 1.0 };
        let crop = crop_face(&frame, 10, 10, &face).unwrap();
        assert_eq!((crop.width(), crop.height()), (3, 4));
    }

    #[test]
    fn test_crop_zero_area() {
        let frame = gradient_frame(10, 10);
        let face = FaceBox { x: 3.0, y: 3.0, width: 0.0, height: 5.0, confidence: 1.0 };
        assert!(matches!(
            crop_face(&frame, 10, 10, &face),
            Err(RegionError::ZeroArea)
        ));
    }

    #[test]
    fn test_crop_fully_outside() {
        let frame = gradient_frame(10, 10);
        let face = FaceBox { x: 50.0, y: 50.0, width: 5.0, height: 5.0, confidence: 1.0 };
        assert!(matches!(
            crop_face(&frame, 10, 10, &face),
            Err(RegionError::ZeroArea)
        ));
    }

    #[test]
    fn test_crop_short_buffer() {
        let frame = vec![0u8; 10];
        let face = FaceBox { x: 0.0, y: 0.0, width: 5.0, height: 5.0, confidence: 1.0 };
        assert!(matches!(
            crop_face(&frame, 10, 10, &face),
            Err(RegionError::BadFrame { .. })
        ));
    }
}
