//! Lazy handles for heavy inference resources.
//!
//! Loading a model can take seconds. A [`LazyHandle`] pays that cost at most
//! once per process: concurrent first users wait for the same load instead of
//! starting their own, and a failed load is remembered instead of being
//! retried on every frame.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The heavy resources the perception stack may load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ObjectModel,
    FaceModel,
    OcrEngine,
    CaptionModel,
    DepthModel,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::ObjectModel => "object model",
            ResourceKind::FaceModel => "face model",
            ResourceKind::OcrEngine => "text reader",
            ResourceKind::CaptionModel => "caption model",
            ResourceKind::DepthModel => "depth model",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to load {kind}: {reason}")]
pub struct LoadError {
    pub kind: ResourceKind,
    pub reason: String,
}

impl LoadError {
    pub fn new(kind: ResourceKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

const UNLOADED: u8 = 0;
const LOADING: u8 = 1;
const READY: u8 = 2;
const FAILED: u8 = 3;

fn decode(state: u8) -> HandleState {
    match state {
        LOADING => HandleState::Loading,
        READY => HandleState::Ready,
        FAILED => HandleState::Failed,
        _ => HandleState::Unloaded,
    }
}

enum Slot<T: ?Sized> {
    Empty,
    Ready(Arc<T>),
    Failed(LoadError),
}

/// One lazily constructed resource.
///
/// The slot mutex serializes first use: whoever arrives first runs the
/// loader while everyone else waits on the lock and then observes the same
/// terminal state. The atomic probe lets callers peek without blocking.
pub struct LazyHandle<T: ?Sized> {
    kind: ResourceKind,
    slot: Mutex<Slot<T>>,
    probe: Arc<AtomicU8>,
}

impl<T: ?Sized> LazyHandle<T> {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            slot: Mutex::new(Slot::Empty),
            probe: Arc::new(AtomicU8::new(UNLOADED)),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Non-blocking view of the handle's state.
    pub fn state(&self) -> HandleState {
        decode(self.probe.load(Ordering::SeqCst))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == HandleState::Ready
    }

    /// Return the resource, constructing it on first use.
    ///
    /// The loader runs at most once per handle lifetime; a cached failure is
    /// returned to every later caller until [`LazyHandle::reset`].
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<T>, LoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<T>, LoadError>>,
    {
        let mut slot = self.slot.lock().await;
        match &*slot {
            Slot::Ready(value) => return Ok(value.clone()),
            Slot::Failed(err) => return Err(err.clone()),
            Slot::Empty => {}
        }
        self.probe.store(LOADING, Ordering::SeqCst);
        info!(kind = %self.kind, "loading resource");
        match load().await {
            Ok(value) => {
                *slot = Slot::Ready(value.clone());
                self.probe.store(READY, Ordering::SeqCst);
                info!(kind = %self.kind, "resource ready");
                Ok(value)
            }
            Err(err) => {
                warn!(kind = %self.kind, "resource load failed: {}", err.reason);
                *slot = Slot::Failed(err.clone());
                self.probe.store(FAILED, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    /// Forget the cached outcome so the next use loads again.
    pub async fn reset(&self) {
        let mut slot = self.slot.lock().await;
        *slot = Slot::Empty;
        self.probe.store(UNLOADED, Ordering::SeqCst);
    }
}

/// Readiness probes for every tracked handle, keyed by kind.
#[derive(Default)]
pub struct Registry {
    probes: std::sync::Mutex<HashMap<ResourceKind, Arc<AtomicU8>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track<T: ?Sized>(&self, handle: &LazyHandle<T>) {
        self.probes
            .lock()
            .unwrap()
            .insert(handle.kind, handle.probe.clone());
    }

    pub fn state(&self, kind: ResourceKind) -> Option<HandleState> {
        self.probes
            .lock()
            .unwrap()
            .get(&kind)
            .map(|p| decode(p.load(Ordering::SeqCst)))
    }

    pub fn is_ready(&self, kind: ResourceKind) -> bool {
        self.state(kind) == Some(HandleState::Ready)
    }

    /// All tracked kinds and their current states.
    pub fn snapshot(&self) -> Vec<(ResourceKind, HandleState)> {
        self.probes
            .lock()
            .unwrap()
            .iter()
            .map(|(kind, probe)| (*kind, decode(probe.load(Ordering::SeqCst))))
            .collect()
    }
}
