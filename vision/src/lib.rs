//! Perception for the companion.
//!
//! Each capability (objects, faces, text, captions, depth) lives behind a
//! [`Perceptor`]: it turns a frame into [`Detection`]s and a batch of
//! detections into one spoken line. The actual inference engines are opaque
//! collaborators behind the backend traits and are loaded lazily.

pub mod backend;
pub mod caption;
pub mod depth;
pub mod detection;
pub mod faces;
pub mod known_faces;
pub mod objects;
pub mod perceptor;
pub mod reading;

pub use backend::{
    CaptionBackend, DepthBackend, DepthMap, DummyCaption, DummyDepth, DummyFaces, DummyObjects,
    DummyOcr, FaceBackend, ObjectBackend, OcrBackend, RawBox, TextLine,
};
pub use caption::CaptionPerceptor;
pub use depth::DepthPerceptor;
pub use detection::{Detection, DetectionKind, Position};
pub use faces::FacePerceptor;
pub use known_faces::{KnownFaces, UNKNOWN};
pub use objects::ObjectPerceptor;
pub use perceptor::{PerceptError, Perceptor};
pub use reading::ReadingPerceptor;
