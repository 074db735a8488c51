use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use sensor::{mean_abs_delta, Camera, Frame};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use registry::{HandleState, Registry, ResourceKind};
use vision::{Detection, PerceptError, Perceptor, UNKNOWN};
use voice::{Notifier, SpeechRequest};

use crate::{Config, ControlEvent, FramePacer, Mode, OneShot};

/// Frames between frame-rate log lines.
const FPS_WINDOW: u64 = 20;
/// Consecutive camera read errors tolerated mid-run.
const CAMERA_RETRIES: u32 = 3;

/// The perception capabilities the controller dispatches to.
#[derive(Clone)]
pub struct Perceptors {
    pub objects: Arc<dyn Perceptor>,
    pub faces: Arc<dyn Perceptor>,
    pub reading: Arc<dyn Perceptor>,
    pub caption: Arc<dyn Perceptor>,
    pub depth: Arc<dyn Perceptor>,
}

struct ScanState {
    roster: std::collections::BTreeSet<String>,
    deadline: Instant,
    prior: Mode,
}

/// Detections gathered from one admitted frame, kept per capability so the
/// right describer runs on each group.
#[derive(Default)]
struct FrameBatch {
    objects: Vec<Detection>,
    faces: Vec<Detection>,
    text: Vec<Detection>,
}

enum Flow {
    Continue,
    Quit,
}

/// Owns the mode state machine and drives perception frame by frame.
pub struct Controller {
    cfg: Config,
    mode: Mode,
    pacer: FramePacer,
    percepts: Perceptors,
    notifier: Notifier,
    registry: Arc<Registry>,
    events: mpsc::UnboundedReceiver<ControlEvent>,
    scan: Option<ScanState>,
    reported_failures: HashSet<ResourceKind>,
    prev_luma: Option<Vec<u8>>,
    fps_count: u64,
    fps_since: Instant,
}

impl Controller {
    pub fn new(
        cfg: Config,
        initial_mode: Mode,
        percepts: Perceptors,
        notifier: Notifier,
        registry: Arc<Registry>,
        events: mpsc::UnboundedReceiver<ControlEvent>,
    ) -> Self {
        let mode = if initial_mode == Mode::Scan {
            warn!("cannot start in scan mode, falling back to idle");
            Mode::Idle
        } else {
            initial_mode
        };
        let pacer = FramePacer::new(cfg.cadence.clone(), mode);
        Self {
            cfg,
            mode,
            pacer,
            percepts,
            notifier,
            registry,
            events,
            scan: None,
            reported_failures: HashSet::new(),
            prev_luma: None,
            fps_count: 0,
            fps_since: Instant::now(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Drive the camera until it ends or the user quits. Never panics on
    /// perception failures; everything degrades to a quieter session.
    pub async fn run(&mut self, camera: &mut dyn Camera) {
        info!("controller starting in {} mode", self.mode.label());
        self.notifier.speak(SpeechRequest::routine(
            "system",
            "Iris online. Ready.",
            self.mode.label(),
        ));

        let mut read_failures = 0u32;
        loop {
            let frame = match camera.next_frame().await {
                Ok(Some(frame)) => {
                    read_failures = 0;
                    frame
                }
                Ok(None) => {
                    info!("camera stream ended");
                    break;
                }
                Err(e) => {
                    read_failures += 1;
                    warn!(attempt = read_failures, "camera read failed: {e}");
                    if read_failures > CAMERA_RETRIES {
                        warn!("camera keeps failing, treating as end of stream");
                        break;
                    }
                    continue;
                }
            };

            self.tick_fps();
            if self.scan_expired() {
                self.finish_scan();
            }
            if let Flow::Quit = self.drain_events(Some(&frame)).await {
                break;
            }
            if !self.pacer.admit(frame.index) {
                continue;
            }
            self.track_motion(&frame);
            if self.mode == Mode::Idle {
                continue;
            }

            let mode_before = self.mode;
            let batch = self.perceive(&frame).await;
            // Keyboard input that arrived while inference ran wins over the
            // frame's results.
            if let Flow::Quit = self.drain_events(Some(&frame)).await {
                break;
            }
            if self.mode != mode_before {
                debug!("mode changed during inference, results discarded");
                continue;
            }
            self.announce(&batch);
        }
        info!("controller loop exited");
    }

    async fn drain_events(&mut self, frame: Option<&Frame>) -> Flow {
        while let Ok(event) = self.events.try_recv() {
            match event {
                ControlEvent::Quit => {
                    info!("quit requested");
                    return Flow::Quit;
                }
                ControlEvent::Select(mode) => self.select(mode),
                ControlEvent::Trigger(shot) => match frame {
                    Some(frame) => self.one_shot(shot, frame).await,
                    None => debug!("no frame captured yet, {shot:?} skipped"),
                },
                ControlEvent::Replay => {
                    if !self.notifier.replay(self.mode.label()) {
                        debug!("nothing to replay for {} mode", self.mode.label());
                    }
                }
                ControlEvent::AudioCheck => {
                    self.notifier.speak(SpeechRequest::routine(
                        "system",
                        "Audio check one two three.",
                        self.mode.label(),
                    ));
                }
            }
        }
        Flow::Continue
    }

    fn select(&mut self, target: Mode) {
        if target == self.mode {
            debug!("already in {} mode", target.label());
            return;
        }
        info!("switching mode: {} -> {}", self.mode.label(), target.label());
        if self.mode == Mode::Scan {
            self.scan = None;
        }
        if target == Mode::Scan {
            self.scan = Some(ScanState {
                roster: Default::default(),
                deadline: Instant::now() + Duration::from_millis(self.cfg.scan.duration_ms),
                prior: self.mode,
            });
        }
        self.mode = target;
        self.pacer.set_mode(target);
        self.notifier.speak(SpeechRequest::routine(
            "system",
            target.announcement(),
            target.label(),
        ));
    }

    fn scan_expired(&self) -> bool {
        self.scan
            .as_ref()
            .map(|s| Instant::now() >= s.deadline)
            .unwrap_or(false)
    }

    /// Announce everyone the scan saw and return to the prior mode. The
    /// prior mode's cadence counters start fresh, same as any switch.
    fn finish_scan(&mut self) {
        let Some(scan) = self.scan.take() else {
            return;
        };
        let text = if scan.roster.is_empty() {
            "No one found.".to_string()
        } else {
            let names: Vec<&str> = scan.roster.iter().map(String::as_str).collect();
            format!("I found {}.", names.join(" and "))
        };
        self.notifier
            .speak(SpeechRequest::routine("scan", text, Mode::Scan.label()));
        info!("scan complete, returning to {} mode", scan.prior.label());
        self.mode = scan.prior;
        self.pacer.set_mode(scan.prior);
    }

    async fn perceive(&mut self, frame: &Frame) -> FrameBatch {
        let mut batch = FrameBatch::default();
        match self.mode {
            Mode::Idle => {}
            Mode::Scene => {
                let objects = self.percepts.objects.clone();
                let faces = self.percepts.faces.clone();
                batch.objects = self.run_perceptor(&objects, frame).await;
                batch.faces = self.run_perceptor(&faces, frame).await;
            }
            Mode::Objects => {
                let objects = self.percepts.objects.clone();
                batch.objects = self.run_perceptor(&objects, frame).await;
            }
            Mode::Faces | Mode::Scan => {
                let faces = self.percepts.faces.clone();
                batch.faces = self.run_perceptor(&faces, frame).await;
            }
            Mode::Reading => {
                let reading = self.percepts.reading.clone();
                batch.text = self.run_perceptor(&reading, frame).await;
            }
        }
        batch
    }

    /// Run one perceptor, containing its failures. A resource still loading
    /// is skipped (the load continues in the background so the frame loop
    /// never stalls on it); a missing resource is reported once and the
    /// contribution disabled; an inference error means no detections this
    /// frame.
    async fn run_perceptor(
        &mut self,
        perceptor: &Arc<dyn Perceptor>,
        frame: &Frame,
    ) -> Vec<Detection> {
        let kind = perceptor.resource_kind();
        match self.registry.state(kind) {
            Some(HandleState::Unloaded) => {
                debug!("{kind} not loaded yet, starting load in the background");
                let perceptor = perceptor.clone();
                tokio::spawn(async move {
                    let _ = perceptor.warm().await;
                });
                return Vec::new();
            }
            Some(HandleState::Loading) => {
                debug!("{kind} still loading, skipping this frame");
                return Vec::new();
            }
            _ => {}
        }
        match perceptor.process(frame).await {
            Ok(detections) => detections,
            Err(PerceptError::Resource(err)) => {
                if self.reported_failures.insert(err.kind) {
                    warn!("{err}; contribution disabled");
                    self.notifier.speak(SpeechRequest::routine(
                        "system",
                        format!("The {} is unavailable.", err.kind),
                        self.mode.label(),
                    ));
                }
                Vec::new()
            }
            Err(PerceptError::Backend(reason)) => {
                warn!("inference error, skipping frame: {reason}");
                Vec::new()
            }
        }
    }

    /// Fold a frame's detections into speech: at most one request per
    /// distinct category, objects before faces.
    fn announce(&mut self, batch: &FrameBatch) {
        let source = self.mode.label();
        if !batch.objects.is_empty() {
            if let Some(text) = self.percepts.objects.describe(&batch.objects) {
                self.notifier
                    .speak(SpeechRequest::routine("objects", text, source));
            }
        }
        if !batch.faces.is_empty() {
            if let Some(scan) = self.scan.as_mut() {
                for det in &batch.faces {
                    if det.label != UNKNOWN {
                        scan.roster.insert(det.label.clone());
                    }
                }
            } else {
                let mut by_name: BTreeMap<&str, Vec<Detection>> = BTreeMap::new();
                for det in &batch.faces {
                    if det.label != UNKNOWN {
                        by_name.entry(det.label.as_str()).or_default().push(det.clone());
                    }
                }
                for (name, group) in by_name {
                    if let Some(text) = self.percepts.faces.describe(&group) {
                        self.notifier.speak(SpeechRequest::routine(name, text, source));
                    }
                }
            }
        }
        if !batch.text.is_empty() {
            if let Some(text) = self.percepts.reading.describe(&batch.text) {
                let category = format!("text:{:x}", digest(&text));
                self.notifier
                    .speak(SpeechRequest::routine(category, text, source));
            }
        }
    }

    /// Run an on-demand overlay on the current frame, outside the normal
    /// cadence, and leave the continuous mode untouched.
    async fn one_shot(&mut self, shot: OneShot, frame: &Frame) {
        info!("{shot:?} requested");
        let source = self.mode.label();
        match shot {
            OneShot::Caption => {
                let caption = self.percepts.caption.clone();
                let detections = self.run_perceptor(&caption, frame).await;
                let text = caption
                    .describe(&detections)
                    .unwrap_or_else(|| "I have no description.".to_string());
                self.notifier
                    .speak(SpeechRequest::routine("caption", text, source));
            }
            OneShot::Depth => {
                let depth = self.percepts.depth.clone();
                let detections = self.run_perceptor(&depth, frame).await;
                match depth.describe(&detections) {
                    Some(text) => {
                        self.notifier
                            .speak(SpeechRequest::urgent("obstacle", text, source));
                    }
                    None => {
                        self.notifier.speak(SpeechRequest::routine(
                            "depth",
                            "The path looks clear.",
                            source,
                        ));
                    }
                }
            }
        }
    }

    fn track_motion(&mut self, frame: &Frame) {
        let luma = frame.luma();
        if let Some(prev) = &self.prev_luma {
            let delta = mean_abs_delta(prev, &luma);
            self.pacer.observe_motion(delta);
        }
        self.prev_luma = Some(luma);
    }

    fn tick_fps(&mut self) {
        self.fps_count += 1;
        if self.fps_count >= FPS_WINDOW {
            let elapsed = self.fps_since.elapsed().as_secs_f32();
            if elapsed > 0.0 {
                debug!("camera rate: {:.1} fps", self.fps_count as f32 / elapsed);
            }
            self.fps_count = 0;
            self.fps_since = Instant::now();
        }
    }
}

fn digest(text: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
