//! Frame type and pixel-format conversion.

use thiserror::Error;

/// Fraction of pixels in the darkest histogram bucket above which a
/// frame is considered dark (lens covered, emitter off, lid closing).
const DARK_PIXEL_THRESHOLD: u8 = 32;
const DARK_FRACTION: f32 = 0.95;

/// A captured grayscale camera frame.
///
/// Owned by the scan loop for the duration of one iteration; frames are
/// never persisted.
#[derive(Clone)]
pub struct Frame {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Driver-assigned capture sequence number.
    pub sequence: u32,
}

impl Frame {
    /// True if nearly all pixels sit in the darkest bucket. Dark frames
    /// carry no usable face signal and count as zero-detection frames.
    pub fn is_dark(&self) -> bool {
        if self.data.is_empty() {
            return true;
        }
        let dark = self.data.iter().filter(|&&p| p < DARK_PIXEL_THRESHOLD).count();
        (dark as f32 / self.data.len() as f32) > DARK_FRACTION
    }

    /// Average pixel brightness (0.0–255.0), for diagnostics output.
    pub fn avg_brightness(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&b| b as f32).sum::<f32>() / self.data.len() as f32
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid YUYV length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Extract the Y channel from packed YUYV (4:2:2) data.
///
/// Two pixels per 4 bytes: [Y0, U, Y1, V]; luminance is every even byte.
pub fn yuyv_to_grayscale(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength { expected, actual: yuyv.len() });
    }
    Ok(yuyv[..expected].iter().step_by(2).copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(data: Vec<u8>, width: u32, height: u32) -> Frame {
        Frame { data, width, height, sequence: 0 }
    }

    #[test]
    fn test_yuyv_extracts_even_bytes() {
        // 2x2 frame packs into 8 bytes: [Y0 U Y1 V] per pixel pair.
        let yuyv: Vec<u8> = vec![10, 0, 20, 0, 30, 0, 40, 0];
        let gray = yuyv_to_grayscale(&yuyv, 2, 2).unwrap();
        assert_eq!(gray, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_yuyv_rejects_short_buffer() {
        let err = yuyv_to_grayscale(&[1, 2, 3], 2, 2).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { expected: 8, actual: 3 }));
    }

    #[test]
    fn test_dark_frame_detection() {
        assert!(frame_with(vec![0; 400], 20, 20).is_dark());
        assert!(!frame_with(vec![120; 400], 20, 20).is_dark());
        assert!(frame_with(vec![], 0, 0).is_dark());
    }

    #[test]
    fn test_dark_frame_borderline() {
        // 96% dark pixels: dark. 94%: not dark.
        let mut mostly_dark = vec![5u8; 960];
        mostly_dark.extend(vec![140u8; 40]);
        assert!(frame_with(mostly_dark, 100, 10).is_dark());

        let mut mostly_ok = vec![5u8; 940];
        mostly_ok.extend(vec![140u8; 60]);
        assert!(!frame_with(mostly_ok, 100, 10).is_dark());
    }

    #[test]
    fn test_avg_brightness() {
        let f = frame_with(vec![100, 200], 2, 1);
        assert!((f.avg_brightness() - 150.0).abs() < 1e-6);
    }
}
