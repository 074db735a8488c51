mod keys;

use anyhow::Context;
use clap::Parser;
use controller::{Config, Controller, Mode, Perceptors};
use registry::Registry;
use sensor::GlobCamera;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use vision::{
    CaptionPerceptor, DepthPerceptor, DummyCaption, DummyDepth, DummyFaces, DummyObjects,
    DummyOcr, FacePerceptor, ObjectPerceptor, Perceptor, ReadingPerceptor,
};
use voice::{CoquiTts, Notifier, NullTts, Tts};

#[derive(Parser)]
#[command(author, version, about = "Camera companion that speaks what it sees")]
struct Cli {
    /// Glob pattern of image files serving as the camera stream
    #[arg(long, default_value = "frames/*.jpg", env = "IRIS_SOURCE")]
    source: String,

    /// Milliseconds between frames
    #[arg(long, default_value_t = 100)]
    frame_interval_ms: u64,

    /// Serve the source files once instead of cycling forever
    #[arg(long)]
    loop_once: bool,

    /// Mode to start in: idle, scene, reading, objects or faces
    #[arg(long, default_value = "idle")]
    mode: String,

    /// Object confidence floor override
    #[arg(long)]
    confidence: Option<f32>,

    /// Disable spoken output
    #[arg(long)]
    no_audio: bool,

    /// Directory of known faces, one subdirectory per person
    #[arg(long, env = "IRIS_FACES_DIR")]
    faces_dir: Option<PathBuf>,

    /// JSON config file layered over the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// TTS server URL override
    #[arg(long, env = "IRIS_TTS_URL")]
    tts_url: Option<String>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn initial_mode(name: &str) -> Mode {
    match name {
        "idle" => Mode::Idle,
        "scene" => Mode::Scene,
        "reading" => Mode::Reading,
        "objects" => Mode::Objects,
        "faces" => Mode::Faces,
        other => {
            warn!("unknown mode '{other}', starting idle");
            Mode::Idle
        }
    }
}

/// Wire up the perception stack. The engines here are stand-ins; a real
/// deployment plugs its model runtimes in behind the backend traits.
fn build_perceptors(cfg: &Config, registry: &Registry, faces_dir: Option<PathBuf>) -> Perceptors {
    let objects = ObjectPerceptor::new(
        registry,
        || Ok(Arc::new(DummyObjects::default()) as Arc<dyn vision::ObjectBackend>),
        cfg.vision.confidence,
    );
    let faces = FacePerceptor::new(
        registry,
        || Ok(Arc::new(DummyFaces::default()) as Arc<dyn vision::FaceBackend>),
        faces_dir,
        cfg.vision.face_threshold,
    );
    let reading = ReadingPerceptor::new(
        registry,
        || Ok(Arc::new(DummyOcr::default()) as Arc<dyn vision::OcrBackend>),
        cfg.vision.ocr_confidence,
        cfg.vision.ocr_stable_frames,
    );
    let caption = CaptionPerceptor::new(registry, || {
        Ok(Arc::new(DummyCaption::default()) as Arc<dyn vision::CaptionBackend>)
    });
    let depth = DepthPerceptor::new(
        registry,
        || Ok(Arc::new(DummyDepth::default()) as Arc<dyn vision::DepthBackend>),
        cfg.vision.depth_near,
        cfg.vision.depth_near_ratio,
    );
    Perceptors {
        objects: Arc::new(objects),
        faces: Arc::new(faces),
        reading: Arc::new(reading),
        caption: Arc::new(caption),
        depth: Arc::new(depth),
    }
}

/// Pull the heavy handles up in likely-use order so the first mode switch
/// does not stall. First use and warm-up share the per-handle lock, so the
/// load still happens once.
fn spawn_warmup(percepts: Perceptors) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let order: [(&str, &Arc<dyn Perceptor>); 4] = [
            ("objects", &percepts.objects),
            ("faces", &percepts.faces),
            ("reading", &percepts.reading),
            ("caption", &percepts.caption),
        ];
        for (name, perceptor) in order {
            if let Err(e) = perceptor.warm().await {
                debug!("warm-up of {name} failed: {e}");
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        info!("warm-up complete");
    });
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut cfg = match &cli.config {
        Some(path) => Config::from_file(path).context("loading config file")?,
        None => Config::default(),
    };
    if let Some(confidence) = cli.confidence {
        cfg.vision.confidence = confidence;
    }
    if cli.no_audio {
        cfg.audio.enabled = false;
    }
    if let Some(url) = &cli.tts_url {
        cfg.audio.tts_url = url.clone();
    }

    let mut camera = GlobCamera::new(
        &cli.source,
        Duration::from_millis(cli.frame_interval_ms),
        cli.loop_once,
    )
    .context("opening camera source")?;

    let registry = Arc::new(Registry::new());
    let percepts = build_perceptors(&cfg, &registry, cli.faces_dir.clone());

    let engine: Arc<dyn Tts> = if cfg.audio.enabled {
        Arc::new(CoquiTts::new(
            cfg.audio.tts_url.clone(),
            cfg.audio.speaker.clone(),
        ))
    } else {
        Arc::new(NullTts)
    };
    let (notifier, worker) = Notifier::new(cfg.cooldowns.policy(), cfg.audio.queue_capacity);
    let speech = tokio::spawn(worker.run(engine));

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    tokio::spawn(keys::listen(events_tx));
    spawn_warmup(percepts.clone());

    let mut driver = Controller::new(
        cfg.clone(),
        initial_mode(&cli.mode),
        percepts,
        notifier.clone(),
        registry.clone(),
        events_rx,
    );
    driver.run(&mut camera).await;

    notifier
        .shutdown(Duration::from_millis(cfg.audio.shutdown_grace_ms))
        .await;
    let _ = tokio::time::timeout(Duration::from_secs(1), speech).await;
    Ok(())
}
