use async_trait::async_trait;
use registry::{LazyHandle, LoadError, Registry, ResourceKind};
use sensor::Frame;
use std::sync::Arc;

use crate::backend::CaptionBackend;
use crate::{Detection, DetectionKind, PerceptError, Perceptor, Position};

type Factory = Box<dyn Fn() -> anyhow::Result<Arc<dyn CaptionBackend>> + Send + Sync>;

/// Describes the whole scene in one sentence, on demand.
pub struct CaptionPerceptor {
    handle: LazyHandle<dyn CaptionBackend>,
    factory: Factory,
}

impl CaptionPerceptor {
    pub fn new(
        registry: &Registry,
        factory: impl Fn() -> anyhow::Result<Arc<dyn CaptionBackend>> + Send + Sync + 'static,
    ) -> Self {
        let handle = LazyHandle::new(ResourceKind::CaptionModel);
        registry.track(&handle);
        Self {
            handle,
            factory: Box::new(factory),
        }
    }

    async fn backend(&self) -> Result<Arc<dyn CaptionBackend>, LoadError> {
        self.handle
            .get_or_load(|| async {
                (self.factory)()
                    .map_err(|e| LoadError::new(ResourceKind::CaptionModel, e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl Perceptor for CaptionPerceptor {
    fn resource_kind(&self) -> ResourceKind {
        ResourceKind::CaptionModel
    }

    async fn process(&self, frame: &Frame) -> Result<Vec<Detection>, PerceptError> {
        let backend = self.backend().await?;
        let caption = backend.caption(frame).await.map_err(PerceptError::backend)?;
        let caption = caption.trim();
        if caption.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Detection::new(
            DetectionKind::Text,
            caption,
            1.0,
            Position::Center,
        )])
    }

    fn describe(&self, detections: &[Detection]) -> Option<String> {
        detections.first().map(|d| d.label.clone())
    }

    async fn warm(&self) -> Result<(), PerceptError> {
        self.backend().await?;
        Ok(())
    }
}
