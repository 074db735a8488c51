use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use voice::CooldownPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable settings, built once at startup and passed by reference into
/// the controller and perceptors.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cadence: CadenceConfig,
    pub cooldowns: CooldownConfig,
    pub vision: VisionConfig,
    pub audio: AudioConfig,
    pub scan: ScanConfig,
}

impl Config {
    /// Load overrides from a JSON file on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Frame admission settings, per mode plus the adaptive bounds.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub scene: u64,
    pub reading: u64,
    pub idle: u64,
    pub objects: u64,
    pub faces: u64,
    pub scan: u64,
    pub min_interval: u64,
    pub max_interval: u64,
    /// Mean luma delta below which the view counts as still.
    pub motion_threshold: f32,
    /// Still admitted frames required before the interval stretches.
    pub quiet_window: u32,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            scene: 4,
            reading: 4,
            idle: 10,
            objects: 4,
            faces: 4,
            scan: 2,
            min_interval: 2,
            max_interval: 30,
            motion_threshold: 0.02,
            quiet_window: 3,
        }
    }
}

/// Quiet time between repeated announcements, per category class.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub obstacle_ms: u64,
    pub objects_ms: u64,
    pub person_ms: u64,
    pub text_ms: u64,
    pub system_ms: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            obstacle_ms: 2500,
            objects_ms: 4000,
            person_ms: 15_000,
            text_ms: 5000,
            system_ms: 2000,
        }
    }
}

impl CooldownConfig {
    pub fn policy(&self) -> CooldownPolicy {
        let system = Duration::from_millis(self.system_ms);
        CooldownPolicy::new(Duration::from_millis(self.person_ms))
            .with("obstacle", Duration::from_millis(self.obstacle_ms))
            .with("objects", Duration::from_millis(self.objects_ms))
            .with("text", Duration::from_millis(self.text_ms))
            .with("system", system)
            .with("scan", system)
            .with("caption", system)
            .with("depth", system)
            .with("replay", Duration::ZERO)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Object detections below this confidence are discarded.
    pub confidence: f32,
    /// Text lines below this confidence never reach speech.
    pub ocr_confidence: f32,
    /// Consecutive identical readings required before text is spoken.
    pub ocr_stable_frames: u32,
    /// Face match distance threshold; farther matches stay Unknown.
    pub face_threshold: f32,
    /// Depth value counted as near (1.0 is at the camera).
    pub depth_near: f32,
    /// Fraction of the path region that must be near to warn.
    pub depth_near_ratio: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            confidence: 0.6,
            ocr_confidence: 0.9,
            ocr_stable_frames: 2,
            face_threshold: 0.5,
            depth_near: 0.75,
            depth_near_ratio: 0.1,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    pub queue_capacity: usize,
    pub tts_url: String,
    pub speaker: String,
    pub shutdown_grace_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: 10,
            tts_url: "http://localhost:5002".into(),
            speaker: "default".into(),
            shutdown_grace_ms: 1500,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub duration_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { duration_ms: 5000 }
    }
}
