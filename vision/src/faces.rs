use async_trait::async_trait;
use registry::{LazyHandle, LoadError, Registry, ResourceKind};
use sensor::Frame;
use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::FaceBackend;
use crate::known_faces::{KnownFaces, UNKNOWN};
use crate::{Detection, DetectionKind, PerceptError, Perceptor, Position};

type Factory = Box<dyn Fn() -> anyhow::Result<Arc<dyn FaceBackend>> + Send + Sync>;

/// The face engine and the people it can name, loaded together.
pub struct FaceStack {
    pub backend: Arc<dyn FaceBackend>,
    pub known: KnownFaces,
}

/// Recognizes people and reports where they stand.
pub struct FacePerceptor {
    handle: LazyHandle<FaceStack>,
    factory: Factory,
    faces_dir: Option<PathBuf>,
    threshold: f32,
}

impl FacePerceptor {
    pub fn new(
        registry: &Registry,
        factory: impl Fn() -> anyhow::Result<Arc<dyn FaceBackend>> + Send + Sync + 'static,
        faces_dir: Option<PathBuf>,
        threshold: f32,
    ) -> Self {
        let handle = LazyHandle::new(ResourceKind::FaceModel);
        registry.track(&handle);
        Self {
            handle,
            factory: Box::new(factory),
            faces_dir,
            threshold,
        }
    }

    async fn stack(&self) -> Result<Arc<FaceStack>, LoadError> {
        self.handle
            .get_or_load(|| async {
                let backend = (self.factory)()
                    .map_err(|e| LoadError::new(ResourceKind::FaceModel, e.to_string()))?;
                let known = match &self.faces_dir {
                    Some(dir) => KnownFaces::load(dir, backend.as_ref(), self.threshold).await,
                    None => KnownFaces::empty(self.threshold),
                };
                Ok(Arc::new(FaceStack { backend, known }))
            })
            .await
    }
}

#[async_trait]
impl Perceptor for FacePerceptor {
    fn resource_kind(&self) -> ResourceKind {
        ResourceKind::FaceModel
    }

    async fn process(&self, frame: &Frame) -> Result<Vec<Detection>, PerceptError> {
        let stack = self.stack().await?;
        let faces = stack
            .backend
            .detect(frame)
            .await
            .map_err(PerceptError::backend)?;
        Ok(faces
            .into_iter()
            .map(|(bbox, embedding)| {
                let (name, confidence) = stack.known.identify(&embedding);
                let position = Position::bucket(bbox.center_x(), frame.width);
                Detection::new(DetectionKind::Face, name, confidence, position)
            })
            .collect())
    }

    /// Expects detections for a single person — the controller groups per
    /// name. Strangers are never announced.
    fn describe(&self, detections: &[Detection]) -> Option<String> {
        let det = detections.iter().find(|d| d.label != UNKNOWN)?;
        Some(format!("{} is on the {} side", det.label, det.position))
    }

    async fn warm(&self) -> Result<(), PerceptError> {
        self.stack().await?;
        Ok(())
    }
}
