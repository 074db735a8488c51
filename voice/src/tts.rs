//! Text-to-speech engines.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SpeakError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("engine failure: {0}")]
    Engine(String),
}

/// A text-to-speech engine. `speak` resolves once the clip has been
/// rendered and played out, which can take seconds — that is exactly why
/// only the notifier worker ever awaits it.
#[async_trait]
pub trait Tts: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), SpeakError>;
}

/// Client for a Coqui-style TTS server.
pub struct CoquiTts {
    client: reqwest::Client,
    url: String,
    speaker: String,
}

impl CoquiTts {
    pub fn new(url: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            speaker: speaker.into(),
        }
    }
}

#[derive(serde::Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    speaker_id: &'a str,
}

#[async_trait]
impl Tts for CoquiTts {
    async fn speak(&self, text: &str) -> Result<(), SpeakError> {
        let payload = TtsRequest {
            text,
            speaker_id: &self.speaker,
        };
        let res = self
            .client
            .post(format!("{}/api/tts", self.url))
            .json(&payload)
            .send()
            .await?;
        // Wait for the whole clip so the queue advances on playback
        // completion.
        res.error_for_status()?.bytes().await?;
        Ok(())
    }
}

/// Engine that only logs. Used with audio off, and as the quiet end of the
/// degraded path.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTts;

#[async_trait]
impl Tts for NullTts {
    async fn speak(&self, text: &str) -> Result<(), SpeakError> {
        info!("speech: {text}");
        Ok(())
    }
}
