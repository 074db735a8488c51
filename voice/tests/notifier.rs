use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use voice::{CooldownPolicy, Notifier, SpeakError, SpeechRequest, Tts};

#[derive(Clone, Default)]
struct RecordingTts {
    spoken: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Tts for RecordingTts {
    async fn speak(&self, text: &str) -> Result<(), SpeakError> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct BrokenTts;

#[async_trait]
impl Tts for BrokenTts {
    async fn speak(&self, _text: &str) -> Result<(), SpeakError> {
        Err(SpeakError::Engine("no audio device".into()))
    }
}

async fn wait_for<F: Fn() -> bool>(cond: F) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

fn lenient_policy() -> CooldownPolicy {
    // Tiny default so unrelated requests in a test never collide.
    CooldownPolicy::new(Duration::ZERO)
}

#[tokio::test]
async fn requests_play_in_fifo_order() {
    let engine = RecordingTts::default();
    let spoken = engine.spoken.clone();
    let (notifier, worker) = Notifier::new(lenient_policy(), 10);
    tokio::spawn(worker.run(Arc::new(engine)));

    assert!(notifier.speak(SpeechRequest::routine("a", "first", "scene")));
    assert!(notifier.speak(SpeechRequest::routine("b", "second", "scene")));
    assert!(notifier.speak(SpeechRequest::routine("c", "third", "scene")));

    wait_for(|| spoken.lock().unwrap().len() == 3).await;
    assert_eq!(*spoken.lock().unwrap(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn same_category_is_dropped_inside_the_cooldown() {
    let engine = RecordingTts::default();
    let spoken = engine.spoken.clone();
    let policy = CooldownPolicy::new(Duration::from_secs(60));
    let (notifier, worker) = Notifier::new(policy, 10);
    tokio::spawn(worker.run(Arc::new(engine)));

    assert!(notifier.speak(SpeechRequest::routine("Ada", "Ada is here", "scene")));
    assert!(!notifier.speak(SpeechRequest::routine("Ada", "Ada again", "scene")));

    wait_for(|| spoken.lock().unwrap().len() == 1).await;
    assert_eq!(*spoken.lock().unwrap(), vec!["Ada is here"]);
}

#[tokio::test]
async fn full_queue_drops_the_newest_routine_request() {
    // No worker: nothing drains the queue.
    let (notifier, _worker) = Notifier::new(lenient_policy(), 2);

    assert!(notifier.speak(SpeechRequest::routine("a", "one", "scene")));
    assert!(notifier.speak(SpeechRequest::routine("b", "two", "scene")));
    assert!(!notifier.speak(SpeechRequest::routine("c", "three", "scene")));
    assert_eq!(notifier.pending(), 2);
}

#[tokio::test]
async fn urgent_requests_evict_queued_routine_ones() {
    let (notifier, _worker) = Notifier::new(lenient_policy(), 2);

    assert!(notifier.speak(SpeechRequest::routine("a", "one", "scene")));
    assert!(notifier.speak(SpeechRequest::routine("b", "two", "scene")));
    assert!(notifier.speak(SpeechRequest::urgent("obstacle", "Stop.", "scene")));
    assert_eq!(notifier.pending(), 1);
}

#[tokio::test]
async fn replay_bypasses_the_cooldown() {
    let engine = RecordingTts::default();
    let spoken = engine.spoken.clone();
    let policy = CooldownPolicy::new(Duration::from_secs(60)).with("replay", Duration::ZERO);
    let (notifier, worker) = Notifier::new(policy, 10);
    tokio::spawn(worker.run(Arc::new(engine)));

    assert!(notifier.speak(SpeechRequest::routine("objects", "I see a chair", "scene")));
    wait_for(|| spoken.lock().unwrap().len() == 1).await;

    // The category is still cooling down, but replay goes through.
    assert!(!notifier.speak(SpeechRequest::routine("objects", "I see a chair", "scene")));
    assert!(notifier.replay("scene"));
    wait_for(|| spoken.lock().unwrap().len() == 2).await;
    assert_eq!(spoken.lock().unwrap()[1], "I see a chair");
}

#[tokio::test]
async fn replay_with_no_history_is_a_no_op() {
    let (notifier, _worker) = Notifier::new(lenient_policy(), 4);
    assert!(!notifier.replay("reading"));
}

#[tokio::test]
async fn broken_engine_disables_audio_after_three_failures() {
    let (notifier, worker) = Notifier::new(lenient_policy(), 10);
    let handle = tokio::spawn(worker.run(Arc::new(BrokenTts)));

    for i in 0..3 {
        assert!(notifier.speak(SpeechRequest::routine(
            format!("cat{i}"),
            "hello",
            "scene"
        )));
    }

    handle.await.unwrap();
    assert!(notifier.audio_disabled());
    assert!(!notifier.speak(SpeechRequest::routine("later", "ignored", "scene")));
}

#[tokio::test]
async fn shutdown_drains_within_the_grace_period() {
    let engine = RecordingTts::default();
    let spoken = engine.spoken.clone();
    let (notifier, worker) = Notifier::new(lenient_policy(), 10);
    tokio::spawn(worker.run(Arc::new(engine)));

    notifier.speak(SpeechRequest::routine("a", "going", "scene"));
    notifier.speak(SpeechRequest::routine("b", "gone", "scene"));
    notifier.shutdown(Duration::from_secs(1)).await;

    assert_eq!(notifier.pending(), 0);
    wait_for(|| spoken.lock().unwrap().len() == 2).await;
    // Closed for business afterwards.
    assert!(!notifier.speak(SpeechRequest::routine("c", "late", "scene")));
}
