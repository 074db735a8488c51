use async_trait::async_trait;
use registry::{LazyHandle, LoadError, Registry, ResourceKind};
use sensor::Frame;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::backend::ObjectBackend;
use crate::{Detection, DetectionKind, PerceptError, Perceptor, Position};

type Factory = Box<dyn Fn() -> anyhow::Result<Arc<dyn ObjectBackend>> + Send + Sync>;

/// Detects objects and summarizes them by label and position.
pub struct ObjectPerceptor {
    handle: LazyHandle<dyn ObjectBackend>,
    factory: Factory,
    confidence_floor: f32,
}

impl ObjectPerceptor {
    pub fn new(
        registry: &Registry,
        factory: impl Fn() -> anyhow::Result<Arc<dyn ObjectBackend>> + Send + Sync + 'static,
        confidence_floor: f32,
    ) -> Self {
        let handle = LazyHandle::new(ResourceKind::ObjectModel);
        registry.track(&handle);
        Self {
            handle,
            factory: Box::new(factory),
            confidence_floor,
        }
    }

    async fn backend(&self) -> Result<Arc<dyn ObjectBackend>, LoadError> {
        self.handle
            .get_or_load(|| async {
                (self.factory)()
                    .map_err(|e| LoadError::new(ResourceKind::ObjectModel, e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl Perceptor for ObjectPerceptor {
    fn resource_kind(&self) -> ResourceKind {
        ResourceKind::ObjectModel
    }

    async fn process(&self, frame: &Frame) -> Result<Vec<Detection>, PerceptError> {
        let backend = self.backend().await?;
        let boxes = backend.infer(frame).await.map_err(PerceptError::backend)?;
        Ok(boxes
            .into_iter()
            .filter(|b| b.confidence >= self.confidence_floor)
            .map(|b| {
                let position = Position::bucket(b.center_x(), frame.width);
                Detection::new(DetectionKind::Object, b.label, b.confidence, position)
            })
            .collect())
    }

    /// "I see chair on the left, person on the center" — one phrase per
    /// label, however many instances were found.
    fn describe(&self, detections: &[Detection]) -> Option<String> {
        if detections.is_empty() {
            return None;
        }
        let mut by_label: BTreeMap<&str, BTreeSet<Position>> = BTreeMap::new();
        for det in detections {
            by_label.entry(det.label.as_str()).or_default().insert(det.position);
        }
        let pieces: Vec<String> = by_label
            .into_iter()
            .map(|(label, positions)| {
                let spots: Vec<&str> = positions.iter().map(Position::as_str).collect();
                format!("{label} on the {}", spots.join(", "))
            })
            .collect();
        Some(format!("I see {}", pieces.join(", ")))
    }

    async fn warm(&self) -> Result<(), PerceptError> {
        self.backend().await?;
        Ok(())
    }
}
