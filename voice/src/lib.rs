//! Speech output for the companion.
//!
//! The frame loop must never wait on a sentence being read out. A
//! [`Notifier`] accepts requests without blocking; a single worker plays
//! them in order through a [`Tts`] engine, and per-category cooldowns keep
//! the audio channel from flooding.

pub mod cooldown;
pub mod notifier;
pub mod tts;

pub use cooldown::{CooldownPolicy, CooldownTable};
pub use notifier::{Notifier, Worker};
pub use tts::{CoquiTts, NullTts, SpeakError, Tts};

/// How urgently a request should reach the user's ears.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Routine,
    Urgent,
}

/// One utterance waiting to be spoken.
#[derive(Clone, Debug)]
pub struct SpeechRequest {
    /// Cooldown key: "objects", a person's name, a text digest.
    pub category: String,
    pub text: String,
    pub priority: Priority,
    /// Label of the mode that produced the request, for replay.
    pub source: String,
}

impl SpeechRequest {
    pub fn routine(
        category: impl Into<String>,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            text: text.into(),
            priority: Priority::Routine,
            source: source.into(),
        }
    }

    pub fn urgent(
        category: impl Into<String>,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            text: text.into(),
            priority: Priority::Urgent,
            source: source.into(),
        }
    }
}
