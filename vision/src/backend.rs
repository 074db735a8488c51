//! Opaque inference collaborators.
//!
//! Perceptors only depend on these traits; the concrete engines (ONNX
//! runtimes, OCR stacks, depth networks) are wired in by the application.
//! The dummy implementations stand in during tests and when no engine is
//! configured.

use async_trait::async_trait;
use sensor::Frame;

/// Raw box from an object or face detector, in pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct RawBox {
    pub label: String,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl RawBox {
    pub fn new(label: impl Into<String>, confidence: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            x1,
            y1,
            x2,
            y2,
        }
    }

    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }
}

/// One recognized line of text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub confidence: f32,
    pub center_x: f32,
}

/// Dense depth estimate for a frame. Values are normalized to [0, 1] with
/// 1.0 nearest to the camera.
#[derive(Clone, Debug)]
pub struct DepthMap {
    pub width: u32,
    pub height: u32,
    values: Vec<f32>,
}

impl DepthMap {
    /// Values are row-major and must cover `width * height` pixels.
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), (width * height) as usize);
        Self {
            width,
            height,
            values,
        }
    }

    /// Fraction of pixels in the given region at least as near as `near`.
    /// Region bounds are clamped to the map.
    pub fn near_ratio_in(&self, x0: u32, y0: u32, x1: u32, y1: u32, near: f32) -> f32 {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return 0.0;
        }
        let mut close = 0usize;
        let mut total = 0usize;
        for y in y0..y1 {
            let row = (y * self.width) as usize;
            for x in x0..x1 {
                total += 1;
                if self.values[row + x as usize] >= near {
                    close += 1;
                }
            }
        }
        close as f32 / total as f32
    }
}

#[async_trait]
pub trait ObjectBackend: Send + Sync {
    async fn infer(&self, frame: &Frame) -> anyhow::Result<Vec<RawBox>>;
}

#[async_trait]
pub trait FaceBackend: Send + Sync {
    /// Detect faces and return each box paired with an embedding vector.
    async fn detect(&self, frame: &Frame) -> anyhow::Result<Vec<(RawBox, Vec<f32>)>>;
    /// Embed a standalone face image, used when enrolling known people.
    async fn embed(&self, rgb: &[u8], width: u32, height: u32) -> anyhow::Result<Vec<f32>>;
}

#[async_trait]
pub trait OcrBackend: Send + Sync {
    async fn recognize(&self, frame: &Frame) -> anyhow::Result<Vec<TextLine>>;
}

#[async_trait]
pub trait CaptionBackend: Send + Sync {
    async fn caption(&self, frame: &Frame) -> anyhow::Result<String>;
}

#[async_trait]
pub trait DepthBackend: Send + Sync {
    async fn estimate(&self, frame: &Frame) -> anyhow::Result<DepthMap>;
}

/// Object detector returning a canned set of boxes.
#[derive(Clone, Debug, Default)]
pub struct DummyObjects {
    pub boxes: Vec<RawBox>,
}

impl DummyObjects {
    pub fn with(boxes: Vec<RawBox>) -> Self {
        Self { boxes }
    }
}

#[async_trait]
impl ObjectBackend for DummyObjects {
    async fn infer(&self, _frame: &Frame) -> anyhow::Result<Vec<RawBox>> {
        Ok(self.boxes.clone())
    }
}

/// Face detector returning canned boxes and embeddings. `embed` averages the
/// pixels so distinct images get distinct (if crude) vectors.
#[derive(Clone, Debug, Default)]
pub struct DummyFaces {
    pub faces: Vec<(RawBox, Vec<f32>)>,
}

impl DummyFaces {
    pub fn with(faces: Vec<(RawBox, Vec<f32>)>) -> Self {
        Self { faces }
    }
}

#[async_trait]
impl FaceBackend for DummyFaces {
    async fn detect(&self, _frame: &Frame) -> anyhow::Result<Vec<(RawBox, Vec<f32>)>> {
        Ok(self.faces.clone())
    }

    async fn embed(&self, rgb: &[u8], _width: u32, _height: u32) -> anyhow::Result<Vec<f32>> {
        if rgb.is_empty() {
            return Ok(vec![0.0]);
        }
        let mean = rgb.iter().map(|&b| b as f32).sum::<f32>() / rgb.len() as f32;
        Ok(vec![mean / 255.0])
    }
}

#[derive(Clone, Debug, Default)]
pub struct DummyOcr {
    pub lines: Vec<TextLine>,
}

impl DummyOcr {
    pub fn with(lines: Vec<TextLine>) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl OcrBackend for DummyOcr {
    async fn recognize(&self, _frame: &Frame) -> anyhow::Result<Vec<TextLine>> {
        Ok(self.lines.clone())
    }
}

#[derive(Clone, Debug, Default)]
pub struct DummyCaption {
    pub text: String,
}

impl DummyCaption {
    pub fn with(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl CaptionBackend for DummyCaption {
    async fn caption(&self, _frame: &Frame) -> anyhow::Result<String> {
        Ok(self.text.clone())
    }
}

/// Depth estimator returning a uniform map.
#[derive(Clone, Debug)]
pub struct DummyDepth {
    pub level: f32,
}

impl Default for DummyDepth {
    fn default() -> Self {
        // Everything far away.
        Self { level: 0.0 }
    }
}

impl DummyDepth {
    pub fn with(level: f32) -> Self {
        Self { level }
    }
}

#[async_trait]
impl DepthBackend for DummyDepth {
    async fn estimate(&self, frame: &Frame) -> anyhow::Result<DepthMap> {
        let values = vec![self.level; (frame.width * frame.height) as usize];
        Ok(DepthMap::new(frame.width, frame.height, values))
    }
}
