//! Reference-image files.
//!
//! Each registration writes a fresh PNG under the images directory; the
//! registry row then points at it. Writing the image first is what lets
//! a failed write abort registration without touching the registry.

use crate::StoreError;
use image::GrayImage;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Write a reference crop to a new uniquely named PNG.
///
/// A fresh filename per registration means a re-registration never
/// overwrites the old file in place; the registry upsert reports the
/// replaced path and [`remove_reference`] cleans it up afterwards.
pub fn save_reference(images_dir: &Path, face: &GrayImage) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(images_dir)?;
    let path = images_dir.join(format!("{}.png", Uuid::new_v4()));
    face.save(&path)?;
    tracing::debug!(path = %path.display(), "reference image written");
    Ok(path)
}

/// Load a reference image as grayscale.
pub fn load_reference(path: &Path) -> Result<GrayImage, StoreError> {
    let img = image::open(path)?;
    Ok(img.into_luma8())
}

/// Best-effort removal of a stale reference image. A leftover file is
/// logged, never an error.
pub fn remove_reference(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove stale reference image");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("facegate-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_face() -> GrayImage {
        GrayImage::from_fn(32, 32, |x, y| Luma([((x + y) % 256) as u8]))
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = temp_dir();
        let face = sample_face();

        let path = save_reference(&dir, &face).unwrap();
        assert!(path.exists());

        let loaded = load_reference(&path).unwrap();
        assert_eq!(loaded.dimensions(), face.dimensions());
        assert_eq!(loaded.as_raw(), face.as_raw());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_each_save_gets_a_fresh_path() {
        let dir = temp_dir();
        let face = sample_face();
        let first = save_reference(&dir, &face).unwrap();
        let second = save_reference(&dir, &face).unwrap();
        assert_ne!(first, second);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_save_into_unwritable_dir_fails() {
        // A path that cannot be a directory: a regular file in the way.
        let dir = temp_dir();
        let blocker = dir.join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let result = save_reference(&blocker, &sample_face());
        assert!(result.is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_remove_reference_is_quiet_for_missing() {
        remove_reference(Path::new("/nonexistent/facegate-ref.png"));
    }
}
