use registry::{HandleState, LazyHandle, LoadError, Registry, ResourceKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

#[tokio::test]
async fn concurrent_first_use_loads_exactly_once() {
    let handle = Arc::new(LazyHandle::<u32>::new(ResourceKind::ObjectModel));
    let loads = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let handle = handle.clone();
        let loads = loads.clone();
        tasks.push(tokio::spawn(async move {
            handle
                .get_or_load(|| async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(30)).await;
                    Ok(Arc::new(42u32))
                })
                .await
        }));
    }

    for task in tasks {
        let value = task.await.unwrap().unwrap();
        assert_eq!(*value, 42);
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(handle.is_ready());
}

#[tokio::test]
async fn failure_is_cached_until_reset() {
    let handle = LazyHandle::<u32>::new(ResourceKind::CaptionModel);
    let loads = Arc::new(AtomicUsize::new(0));

    let attempt = |outcome_ok: bool| {
        let loads = loads.clone();
        move || async move {
            loads.fetch_add(1, Ordering::SeqCst);
            if outcome_ok {
                Ok(Arc::new(7u32))
            } else {
                Err(LoadError::new(ResourceKind::CaptionModel, "file absent"))
            }
        }
    };

    let first = handle.get_or_load(attempt(false)).await;
    assert!(first.is_err());
    assert_eq!(handle.state(), HandleState::Failed);

    // Later callers get the remembered error without re-running the loader.
    let second = handle.get_or_load(attempt(true)).await;
    assert_eq!(second.unwrap_err(), first.unwrap_err());
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    handle.reset().await;
    assert_eq!(handle.state(), HandleState::Unloaded);
    let third = handle.get_or_load(attempt(true)).await.unwrap();
    assert_eq!(*third, 7);
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn registry_reports_tracked_states() {
    let registry = Registry::new();
    let objects = LazyHandle::<u32>::new(ResourceKind::ObjectModel);
    let faces = LazyHandle::<u32>::new(ResourceKind::FaceModel);
    registry.track(&objects);
    registry.track(&faces);

    assert_eq!(registry.state(ResourceKind::ObjectModel), Some(HandleState::Unloaded));
    assert!(!registry.is_ready(ResourceKind::ObjectModel));
    assert_eq!(registry.state(ResourceKind::OcrEngine), None);

    objects
        .get_or_load(|| async { Ok(Arc::new(1u32)) })
        .await
        .unwrap();
    assert!(registry.is_ready(ResourceKind::ObjectModel));
    assert!(!registry.is_ready(ResourceKind::FaceModel));
    assert_eq!(registry.snapshot().len(), 2);
}

#[tokio::test]
async fn trait_objects_can_live_behind_a_handle() {
    trait Backend: Send + Sync {
        fn answer(&self) -> u32;
    }
    struct Real;
    impl Backend for Real {
        fn answer(&self) -> u32 {
            9
        }
    }

    let handle = LazyHandle::<dyn Backend>::new(ResourceKind::DepthModel);
    let backend = handle
        .get_or_load(|| async { Ok(Arc::new(Real) as Arc<dyn Backend>) })
        .await
        .unwrap();
    assert_eq!(backend.answer(), 9);
}
