use std::fmt;

/// Continuous operating modes. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Sitting quietly; no perception runs.
    Idle,
    /// Objects and people together.
    Scene,
    /// Printed text read aloud.
    Reading,
    /// Object detection alone.
    Objects,
    /// Face recognition alone.
    Faces,
    /// Short people roll call, then back to the previous mode.
    Scan,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Scene => "scene",
            Mode::Reading => "reading",
            Mode::Objects => "objects",
            Mode::Faces => "faces",
            Mode::Scan => "scan",
        }
    }

    /// Spoken when the mode is entered.
    pub fn announcement(&self) -> &'static str {
        match self {
            Mode::Idle => "Idle mode.",
            Mode::Scene => "Scene mode.",
            Mode::Reading => "Reading mode.",
            Mode::Objects => "Object detection mode.",
            Mode::Faces => "Face recognition mode.",
            Mode::Scan => "Scanning for people.",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Overlays that run once on demand and leave the current mode in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OneShot {
    Caption,
    Depth,
}

/// Symbolic input events delivered to the controller. Every event maps to a
/// defined transition or a logged no-op; there is no way to crash the loop
/// from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    Select(Mode),
    Trigger(OneShot),
    /// Say the current mode's last utterance again.
    Replay,
    /// Quick audible self-test.
    AudioCheck,
    Quit,
}
