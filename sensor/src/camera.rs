use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::time::{self, Duration};
use tracing::{info, warn};

use crate::Frame;

/// Consecutive unreadable frames tolerated before the stream is treated as
/// ended.
const READ_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("no frames match pattern {0}")]
    EmptySource(String),
    #[error("bad source pattern: {0}")]
    Pattern(String),
    #[error("failed to read frame {path:?}: {reason}")]
    Read { path: PathBuf, reason: String },
}

/// A source of frames with known dimensions.
#[async_trait]
pub trait Camera: Send {
    /// Fetch the next frame, or `None` at end of stream.
    async fn next_frame(&mut self) -> Result<Option<Frame>, CameraError>;
}

/// Reads image files matching a glob pattern as simulated webcam frames.
///
/// Files are served in sorted order at a fixed interval and, unless
/// `loop_once` is set, cycled forever. Unreadable files are skipped; after
/// a few consecutive failures the stream ends.
#[derive(Debug)]
pub struct GlobCamera {
    paths: Vec<PathBuf>,
    cursor: usize,
    index: u64,
    interval: time::Interval,
    loop_once: bool,
    failures: u32,
}

impl GlobCamera {
    /// Open a file-backed camera. Fails when the pattern is malformed or
    /// matches nothing, so a misconfigured source is caught at startup.
    pub fn new(pattern: &str, interval: Duration, loop_once: bool) -> Result<Self, CameraError> {
        let mut paths: Vec<PathBuf> = glob::glob(pattern)
            .map_err(|e| CameraError::Pattern(e.msg.to_string()))?
            .filter_map(Result::ok)
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(CameraError::EmptySource(pattern.to_string()));
        }
        info!(frames = paths.len(), %pattern, "camera opened");
        Ok(Self {
            paths,
            cursor: 0,
            index: 0,
            interval: time::interval(interval.max(Duration::from_millis(1))),
            loop_once,
            failures: 0,
        })
    }

    fn decode(path: &PathBuf) -> Result<(u32, u32, Vec<u8>), CameraError> {
        let img = image::open(path)
            .map_err(|e| CameraError::Read {
                path: path.clone(),
                reason: e.to_string(),
            })?
            .to_rgb8();
        let (w, h) = img.dimensions();
        Ok((w, h, img.into_raw()))
    }
}

#[async_trait]
impl Camera for GlobCamera {
    async fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        loop {
            if self.cursor >= self.paths.len() {
                if self.loop_once {
                    return Ok(None);
                }
                self.cursor = 0;
            }
            self.interval.tick().await;
            let path = self.paths[self.cursor].clone();
            self.cursor += 1;
            match Self::decode(&path) {
                Ok((w, h, rgb)) => {
                    self.failures = 0;
                    let frame = Frame::new(self.index, w, h, rgb);
                    self.index += 1;
                    return Ok(Some(frame));
                }
                Err(e) => {
                    self.failures += 1;
                    warn!(attempt = self.failures, "frame read failed: {e}");
                    if self.failures > READ_RETRIES {
                        warn!("too many consecutive read failures, ending stream");
                        return Ok(None);
                    }
                }
            }
        }
    }
}
