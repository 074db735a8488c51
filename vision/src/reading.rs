use async_trait::async_trait;
use registry::{LazyHandle, LoadError, Registry, ResourceKind};
use sensor::Frame;
use std::sync::{Arc, Mutex};

use crate::backend::OcrBackend;
use crate::{Detection, DetectionKind, PerceptError, Perceptor, Position};

type Factory = Box<dyn Fn() -> anyhow::Result<Arc<dyn OcrBackend>> + Send + Sync>;

#[derive(Default)]
struct Latch {
    text: String,
    streak: u32,
}

/// Reads printed text aloud once it stops jittering.
///
/// OCR output flickers frame to frame; the latch requires the same
/// high-confidence text on consecutive processed frames before it is
/// offered for speech.
pub struct ReadingPerceptor {
    handle: LazyHandle<dyn OcrBackend>,
    factory: Factory,
    confidence_floor: f32,
    stable_after: u32,
    latch: Mutex<Latch>,
}

impl ReadingPerceptor {
    pub fn new(
        registry: &Registry,
        factory: impl Fn() -> anyhow::Result<Arc<dyn OcrBackend>> + Send + Sync + 'static,
        confidence_floor: f32,
        stable_after: u32,
    ) -> Self {
        let handle = LazyHandle::new(ResourceKind::OcrEngine);
        registry.track(&handle);
        Self {
            handle,
            factory: Box::new(factory),
            confidence_floor,
            stable_after,
            latch: Mutex::new(Latch::default()),
        }
    }

    async fn backend(&self) -> Result<Arc<dyn OcrBackend>, LoadError> {
        self.handle
            .get_or_load(|| async {
                (self.factory)().map_err(|e| LoadError::new(ResourceKind::OcrEngine, e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl Perceptor for ReadingPerceptor {
    fn resource_kind(&self) -> ResourceKind {
        ResourceKind::OcrEngine
    }

    async fn process(&self, frame: &Frame) -> Result<Vec<Detection>, PerceptError> {
        let backend = self.backend().await?;
        let lines = backend
            .recognize(frame)
            .await
            .map_err(PerceptError::backend)?;

        let confident: Vec<&str> = lines
            .iter()
            .filter(|l| l.confidence >= self.confidence_floor)
            .map(|l| l.text.as_str())
            .collect();
        let spoken = confident.join(" ");
        {
            let mut latch = self.latch.lock().unwrap();
            if spoken.is_empty() {
                latch.text.clear();
                latch.streak = 0;
            } else if spoken == latch.text {
                latch.streak += 1;
            } else {
                latch.text = spoken;
                latch.streak = 1;
            }
        }

        Ok(lines
            .into_iter()
            .map(|l| {
                let position = Position::bucket(l.center_x, frame.width);
                Detection::new(DetectionKind::Text, l.text, l.confidence, position)
            })
            .collect())
    }

    /// The recognized text verbatim, once stable; below-floor lines never
    /// reach speech.
    fn describe(&self, detections: &[Detection]) -> Option<String> {
        if detections.is_empty() {
            return None;
        }
        let latch = self.latch.lock().unwrap();
        if !latch.text.is_empty() && latch.streak >= self.stable_after {
            Some(latch.text.clone())
        } else {
            None
        }
    }

    async fn warm(&self) -> Result<(), PerceptError> {
        self.backend().await?;
        Ok(())
    }
}
