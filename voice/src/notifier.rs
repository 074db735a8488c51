use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Notify;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info, warn};

use crate::{CooldownPolicy, CooldownTable, Priority, SpeechRequest, Tts};

/// Consecutive engine failures tolerated before audio is given up on.
const MAX_ENGINE_FAILURES: u32 = 3;

struct Inner {
    pending: VecDeque<SpeechRequest>,
    cooldowns: CooldownTable,
    last_spoken: HashMap<String, String>,
    closed: bool,
    disabled: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    wake: Notify,
}

/// Non-blocking entry point for speech. Clone freely; all clones feed the
/// same worker. The cooldown table lives behind the notifier's lock — the
/// ready-check and the queue insertion happen under it in one step, so two
/// perceptors racing on the same frame cannot both get through.
#[derive(Clone)]
pub struct Notifier {
    shared: Arc<Shared>,
    policy: Arc<CooldownPolicy>,
    capacity: usize,
}

impl Notifier {
    /// Create a notifier and the worker that serves it; spawn
    /// [`Worker::run`] on a background task.
    pub fn new(policy: CooldownPolicy, capacity: usize) -> (Self, Worker) {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                pending: VecDeque::new(),
                cooldowns: CooldownTable::new(),
                last_spoken: HashMap::new(),
                closed: false,
                disabled: false,
            }),
            wake: Notify::new(),
        });
        let notifier = Self {
            shared: shared.clone(),
            policy: Arc::new(policy),
            capacity,
        };
        (notifier, Worker { shared })
    }

    /// Queue an utterance. Returns `false` when the request was dropped:
    /// still cooling down, queue full, audio disabled, or shutting down.
    pub fn speak(&self, request: SpeechRequest) -> bool {
        let now = Instant::now();
        let category = request.category.clone();
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.closed || inner.disabled {
            return false;
        }
        let cooldown = self.policy.cooldown_for(&category);
        if !inner.cooldowns.ready(&category, cooldown, now) {
            debug!(category = %category, "cooling down, dropped");
            return false;
        }
        if !Self::enqueue(&mut inner, request, self.capacity) {
            return false;
        }
        // Stamped at acceptance into the queue, not at playback, so a slow
        // clip cannot let a burst of duplicates pile up behind it.
        inner.cooldowns.stamp(&category, now);
        drop(inner);
        self.shared.wake.notify_one();
        true
    }

    /// Re-queue the last utterance spoken for `source`, bypassing cooldowns.
    pub fn replay(&self, source: &str) -> bool {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.closed || inner.disabled {
            return false;
        }
        let Some(text) = inner.last_spoken.get(source).cloned() else {
            debug!(%source, "nothing to replay");
            return false;
        };
        let request = SpeechRequest::routine("replay", text, source);
        if !Self::enqueue(&mut inner, request, self.capacity) {
            return false;
        }
        drop(inner);
        self.shared.wake.notify_one();
        true
    }

    fn enqueue(inner: &mut Inner, request: SpeechRequest, capacity: usize) -> bool {
        if inner.pending.len() >= capacity {
            if request.priority == Priority::Urgent {
                let category = request.category.clone();
                inner
                    .pending
                    .retain(|r| r.priority == Priority::Urgent || r.category == category);
            }
            if inner.pending.len() >= capacity {
                warn!(category = %request.category, "speech queue full, dropped");
                return false;
            }
        }
        inner.pending.push_back(request);
        true
    }

    /// Number of queued requests, mainly for diagnostics.
    pub fn pending(&self) -> usize {
        self.shared.inner.lock().unwrap().pending.len()
    }

    /// True once the worker has given up on the engine.
    pub fn audio_disabled(&self) -> bool {
        self.shared.inner.lock().unwrap().disabled
    }

    /// Stop accepting requests and give the worker a bounded grace period to
    /// finish what is queued; anything left after that is abandoned.
    pub async fn shutdown(&self, grace: Duration) {
        {
            self.shared.inner.lock().unwrap().closed = true;
        }
        self.shared.wake.notify_one();
        let drained = timeout(grace, async {
            loop {
                if self.shared.inner.lock().unwrap().pending.is_empty() {
                    break;
                }
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        if drained.is_err() {
            warn!("speech queue not drained within grace period, abandoning");
            self.shared.inner.lock().unwrap().pending.clear();
        }
    }
}

/// Drains the queue one request at a time, in order.
pub struct Worker {
    shared: Arc<Shared>,
}

impl Worker {
    pub async fn run(self, engine: Arc<dyn Tts>) {
        let mut failures = 0u32;
        loop {
            let next = { self.shared.inner.lock().unwrap().pending.pop_front() };
            let Some(request) = next else {
                if self.shared.inner.lock().unwrap().closed {
                    break;
                }
                self.shared.wake.notified().await;
                continue;
            };
            debug!(category = %request.category, "speaking: {}", request.text);
            match engine.speak(&request.text).await {
                Ok(()) => {
                    failures = 0;
                    let mut inner = self.shared.inner.lock().unwrap();
                    inner
                        .last_spoken
                        .insert(request.source.clone(), request.text.clone());
                }
                Err(e) => {
                    failures += 1;
                    warn!(attempt = failures, "speech engine error: {e}");
                    if failures >= MAX_ENGINE_FAILURES {
                        error!("speech engine keeps failing, audio disabled");
                        let mut inner = self.shared.inner.lock().unwrap();
                        inner.disabled = true;
                        inner.pending.clear();
                        break;
                    }
                }
            }
        }
        info!("speech worker stopped");
    }
}
