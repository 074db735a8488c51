use registry::Registry;
use sensor::Frame;
use std::sync::Arc;
use vision::{DummyFaces, FaceBackend, FacePerceptor, KnownFaces, Perceptor, RawBox, UNKNOWN};

#[test]
fn empty_store_names_nobody() {
    let store = KnownFaces::empty(0.5);
    let (name, confidence) = store.identify(&[0.3, 0.3]);
    assert_eq!(name, UNKNOWN);
    assert_eq!(confidence, 0.0);
}

#[test]
fn nearest_neighbour_wins_within_threshold() {
    let mut store = KnownFaces::empty(0.5);
    store.enroll("Ada", vec![0.1, 0.1]);
    store.enroll("Grace", vec![0.9, 0.9]);

    let (name, confidence) = store.identify(&[0.85, 0.9]);
    assert_eq!(name, "Grace");
    assert!(confidence > 0.9);
}

#[test]
fn matches_past_the_threshold_stay_unknown() {
    let mut store = KnownFaces::empty(0.2);
    store.enroll("Ada", vec![0.0, 0.0]);

    let (name, _) = store.identify(&[1.0, 1.0]);
    assert_eq!(name, UNKNOWN);
}

#[tokio::test]
async fn face_perceptor_names_enrolled_people() {
    // Enroll "Ada" from a mid-grey image; the dummy backend embeds images by
    // mean shade, so a detection with a matching embedding maps back to her.
    let dir = std::env::temp_dir().join(format!("known-faces-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("Ada")).unwrap();
    let img = image::ImageBuffer::from_pixel(8, 8, image::Rgb([200u8, 200, 200]));
    img.save(dir.join("Ada").join("one.png")).unwrap();

    let registry = Registry::new();
    let backend = DummyFaces::with(vec![(
        RawBox::new("face", 0.9, 20.0, 0.0, 60.0, 40.0),
        vec![200.0 / 255.0],
    )]);
    let perceptor = FacePerceptor::new(
        &registry,
        move || Ok(Arc::new(backend.clone()) as Arc<dyn FaceBackend>),
        Some(dir.clone()),
        0.5,
    );

    let frame = Frame::new(0, 300, 200, vec![0; 300 * 200 * 3]);
    let detections = perceptor.process(&frame).await.unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].label, "Ada");
    assert_eq!(
        perceptor.describe(&detections).as_deref(),
        Some("Ada is on the left side")
    );
}

#[tokio::test]
async fn strangers_are_never_announced() {
    let registry = Registry::new();
    let backend = DummyFaces::with(vec![(
        RawBox::new("face", 0.9, 140.0, 0.0, 160.0, 40.0),
        vec![0.5],
    )]);
    let perceptor = FacePerceptor::new(
        &registry,
        move || Ok(Arc::new(backend.clone()) as Arc<dyn FaceBackend>),
        None,
        0.5,
    );

    let frame = Frame::new(0, 300, 200, vec![0; 300 * 200 * 3]);
    let detections = perceptor.process(&frame).await.unwrap();
    assert_eq!(detections[0].label, UNKNOWN);
    assert!(perceptor.describe(&detections).is_none());
}
