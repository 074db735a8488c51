use std::path::Path;
use tracing::{info, warn};

use crate::backend::FaceBackend;

/// Label used for faces that match nobody in the store.
pub const UNKNOWN: &str = "Unknown";

/// In-memory store of known people.
///
/// Loaded from a directory with one subdirectory per person holding example
/// images; the directory name is the spoken name. Matching is
/// nearest-neighbour over embeddings with a distance threshold — anything
/// past the threshold is reported as [`UNKNOWN`].
pub struct KnownFaces {
    names: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    threshold: f32,
}

impl KnownFaces {
    pub fn empty(threshold: f32) -> Self {
        Self {
            names: Vec::new(),
            embeddings: Vec::new(),
            threshold,
        }
    }

    /// Walk `dir` and enroll every readable image. Unreadable files are
    /// logged and skipped; a missing directory yields an empty store.
    pub async fn load(dir: &Path, backend: &dyn FaceBackend, threshold: f32) -> Self {
        let mut store = Self::empty(threshold);
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("known faces directory {} not readable: {e}", dir.display());
                return store;
            }
        };
        for person in entries.filter_map(Result::ok) {
            let path = person.path();
            if !path.is_dir() {
                continue;
            }
            let name = person.file_name().to_string_lossy().to_string();
            let images = match std::fs::read_dir(&path) {
                Ok(images) => images,
                Err(_) => continue,
            };
            for entry in images.filter_map(Result::ok) {
                let image_path = entry.path();
                let rgb = match image::open(&image_path) {
                    Ok(img) => img.to_rgb8(),
                    Err(e) => {
                        warn!("skipping face image {}: {e}", image_path.display());
                        continue;
                    }
                };
                let (w, h) = rgb.dimensions();
                match backend.embed(rgb.as_raw(), w, h).await {
                    Ok(embedding) => store.enroll(name.clone(), embedding),
                    Err(e) => warn!("embedding failed for {}: {e}", image_path.display()),
                }
            }
        }
        info!(people = store.len(), "known faces loaded");
        store
    }

    pub fn enroll(&mut self, name: impl Into<String>, embedding: Vec<f32>) {
        self.names.push(name.into());
        self.embeddings.push(embedding);
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Best match for an embedding: the closest enrolled name when it beats
    /// the distance threshold, otherwise [`UNKNOWN`]. The confidence is
    /// `1 - distance`, floored at zero.
    pub fn identify(&self, embedding: &[f32]) -> (String, f32) {
        let mut best: Option<(usize, f32)> = None;
        for (idx, known) in self.embeddings.iter().enumerate() {
            let dist = euclidean(known, embedding);
            if best.map(|(_, d)| dist < d).unwrap_or(true) {
                best = Some((idx, dist));
            }
        }
        match best {
            Some((idx, dist)) => {
                let confidence = (1.0 - dist).max(0.0);
                if dist <= self.threshold {
                    (self.names[idx].clone(), confidence)
                } else {
                    (UNKNOWN.to_string(), confidence)
                }
            }
            None => (UNKNOWN.to_string(), 0.0),
        }
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    a.iter()
        .zip(b)
        .take(len)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
