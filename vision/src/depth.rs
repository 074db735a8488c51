use async_trait::async_trait;
use registry::{LazyHandle, LoadError, Registry, ResourceKind};
use sensor::Frame;
use std::sync::Arc;

use crate::backend::DepthBackend;
use crate::{Detection, DetectionKind, PerceptError, Perceptor, Position};

type Factory = Box<dyn Fn() -> anyhow::Result<Arc<dyn DepthBackend>> + Send + Sync>;

/// Checks the walking path for nearby obstacles.
///
/// Looks at the center-bottom of the depth map — where walls and furniture
/// turn up at walking pace. A detection is produced only when a sizeable
/// share of that region is close.
pub struct DepthPerceptor {
    handle: LazyHandle<dyn DepthBackend>,
    factory: Factory,
    /// Depth value counted as near (map values are 1.0 at the camera).
    near_threshold: f32,
    /// Fraction of the region that must be near to raise the alarm.
    near_ratio: f32,
}

impl DepthPerceptor {
    pub fn new(
        registry: &Registry,
        factory: impl Fn() -> anyhow::Result<Arc<dyn DepthBackend>> + Send + Sync + 'static,
        near_threshold: f32,
        near_ratio: f32,
    ) -> Self {
        let handle = LazyHandle::new(ResourceKind::DepthModel);
        registry.track(&handle);
        Self {
            handle,
            factory: Box::new(factory),
            near_threshold,
            near_ratio,
        }
    }

    async fn backend(&self) -> Result<Arc<dyn DepthBackend>, LoadError> {
        self.handle
            .get_or_load(|| async {
                (self.factory)()
                    .map_err(|e| LoadError::new(ResourceKind::DepthModel, e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl Perceptor for DepthPerceptor {
    fn resource_kind(&self) -> ResourceKind {
        ResourceKind::DepthModel
    }

    async fn process(&self, frame: &Frame) -> Result<Vec<Detection>, PerceptError> {
        let backend = self.backend().await?;
        let map = backend.estimate(frame).await.map_err(PerceptError::backend)?;
        let (w, h) = (map.width, map.height);
        let ratio = map.near_ratio_in(w / 4, h / 2, 3 * w / 4, h, self.near_threshold);
        if ratio >= self.near_ratio {
            Ok(vec![Detection::new(
                DetectionKind::Object,
                "obstacle",
                ratio.min(1.0),
                Position::Center,
            )])
        } else {
            Ok(Vec::new())
        }
    }

    fn describe(&self, detections: &[Detection]) -> Option<String> {
        if detections.is_empty() {
            None
        } else {
            Some("Stop.".to_string())
        }
    }

    async fn warm(&self) -> Result<(), PerceptError> {
        self.backend().await?;
        Ok(())
    }
}
