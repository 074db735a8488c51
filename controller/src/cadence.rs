use crate::config::CadenceConfig;
use crate::Mode;

/// Decides which frames are worth running inference on.
///
/// Each mode processes every Nth frame. A stretch of still admitted frames
/// widens the interval one step at a time — a user sitting at a desk does
/// not need the models running flat out — and any real motion snaps it back
/// to the mode's base rate. The interval never leaves
/// `[min_interval, max_interval]`.
#[derive(Clone, Debug)]
pub struct FramePacer {
    cfg: CadenceConfig,
    mode: Mode,
    interval: u64,
    quiet_streak: u32,
}

impl FramePacer {
    pub fn new(cfg: CadenceConfig, mode: Mode) -> Self {
        let interval = Self::base_of(&cfg, mode);
        Self {
            cfg,
            mode,
            interval,
            quiet_streak: 0,
        }
    }

    fn base_of(cfg: &CadenceConfig, mode: Mode) -> u64 {
        let base = match mode {
            Mode::Idle => cfg.idle,
            Mode::Scene => cfg.scene,
            Mode::Reading => cfg.reading,
            Mode::Objects => cfg.objects,
            Mode::Faces => cfg.faces,
            Mode::Scan => cfg.scan,
        };
        base.clamp(cfg.min_interval.max(1), cfg.max_interval)
    }

    /// Switch modes; the interval returns to the new mode's base rate.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.interval = Self::base_of(&self.cfg, mode);
        self.quiet_streak = 0;
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// True when the frame should be processed in the current mode.
    pub fn admit(&self, frame_index: u64) -> bool {
        frame_index % self.interval == 0
    }

    /// Record the luma delta between the last two admitted frames.
    pub fn observe_motion(&mut self, delta: f32) {
        if delta >= self.cfg.motion_threshold {
            self.quiet_streak = 0;
            self.interval = Self::base_of(&self.cfg, self.mode);
        } else {
            self.quiet_streak += 1;
            if self.quiet_streak >= self.cfg.quiet_window {
                self.quiet_streak = 0;
                self.interval = (self.interval + 1).min(self.cfg.max_interval);
            }
        }
    }
}
