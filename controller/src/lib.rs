//! The mode state machine driving the companion.
//!
//! One loop owns the camera: it gates frames through the [`FramePacer`],
//! dispatches admitted frames to the active perceptors, folds the results
//! into speech requests and hands them to the notifier. Keyboard events
//! switch modes or fire one-shot overlays; nothing here ever blocks on
//! audio.

pub mod cadence;
pub mod config;
pub mod driver;
pub mod mode;

pub use cadence::FramePacer;
pub use config::{
    AudioConfig, CadenceConfig, Config, ConfigError, CooldownConfig, ScanConfig, VisionConfig,
};
pub use driver::{Controller, Perceptors};
pub use mode::{ControlEvent, Mode, OneShot};
