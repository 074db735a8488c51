use async_trait::async_trait;
use registry::{LoadError, ResourceKind};
use sensor::Frame;
use thiserror::Error;

use crate::Detection;

#[derive(Debug, Error)]
pub enum PerceptError {
    /// The backing model is unavailable; the caller should skip this
    /// perceptor's contribution for the frame.
    #[error(transparent)]
    Resource(#[from] LoadError),
    /// The engine rejected the frame; treated as no detections.
    #[error("inference failed: {0}")]
    Backend(String),
}

impl PerceptError {
    pub fn backend(err: anyhow::Error) -> Self {
        PerceptError::Backend(err.to_string())
    }
}

/// One perception capability behind a uniform contract.
#[async_trait]
pub trait Perceptor: Send + Sync {
    /// The heavy resource this perceptor loads on first use.
    fn resource_kind(&self) -> ResourceKind;

    /// Run inference on one frame. Expensive; only called on admitted frames
    /// (or once, for on-demand perceptors).
    async fn process(&self, frame: &Frame) -> Result<Vec<Detection>, PerceptError>;

    /// Turn a batch of detections into one spoken line, or `None` to stay
    /// quiet (an empty batch is always quiet).
    fn describe(&self, detections: &[Detection]) -> Option<String>;

    /// Load the backing resource ahead of first use.
    async fn warm(&self) -> Result<(), PerceptError>;
}
