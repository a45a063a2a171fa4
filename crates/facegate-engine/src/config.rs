use facegate_core::{ScanConfig, TargetZone};
use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration, loaded from `FACEGATE_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Path to the SeetaFace cascade model file.
    pub model_path: PathBuf,
    /// Path to the SQLite gallery database.
    pub db_path: PathBuf,
    /// Directory holding reference images.
    pub images_dir: PathBuf,
    /// Minimum similarity score for a positive match.
    pub similarity_threshold: f32,
    /// Consecutive in-zone single-face frames required to accept.
    pub stability_frames: u32,
    /// Scan window for identification.
    pub identify_timeout: Duration,
    /// Scan window for registration (longer: the user is positioning).
    pub register_timeout: Duration,
    /// Frames discarded after camera open for AGC/AE stabilization.
    pub warmup_frames: usize,
    /// Target-zone radius as a fraction of the smaller frame dimension.
    pub zone_radius_fraction: f32,
}

impl Config {
    /// Load configuration from the environment with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("facegate");

        let model_path = std::env::var("FACEGATE_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| facegate_core::default_model_dir().join("seeta_fd_frontal_v1.0.bin"));

        let db_path = std::env::var("FACEGATE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("gallery.db"));

        let images_dir = std::env::var("FACEGATE_IMAGES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("references"));

        Self {
            camera_device: std::env::var("FACEGATE_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            model_path,
            db_path,
            images_dir,
            similarity_threshold: env_f32("FACEGATE_SIMILARITY_THRESHOLD", 0.6),
            stability_frames: env_u32("FACEGATE_STABILITY_FRAMES", 5),
            identify_timeout: Duration::from_secs(env_u64("FACEGATE_IDENTIFY_TIMEOUT_SECS", 10)),
            register_timeout: Duration::from_secs(env_u64("FACEGATE_REGISTER_TIMEOUT_SECS", 30)),
            warmup_frames: env_usize("FACEGATE_WARMUP_FRAMES", 4),
            zone_radius_fraction: env_f32("FACEGATE_ZONE_RADIUS_FRACTION", 0.35),
        }
    }

    /// Scan acceptance rules for an identification attempt.
    pub fn identify_scan(&self) -> ScanConfig {
        self.scan_with_timeout(self.identify_timeout)
    }

    /// Scan acceptance rules for a registration attempt.
    pub fn register_scan(&self) -> ScanConfig {
        self.scan_with_timeout(self.register_timeout)
    }

    fn scan_with_timeout(&self, timeout: Duration) -> ScanConfig {
        ScanConfig {
            stability_frames: self.stability_frames,
            timeout,
            zone: TargetZone { radius_fraction: self.zone_radius_fraction },
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
