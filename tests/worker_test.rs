mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use annotrack_rs::worker::{PointPrompt, SEGMENTATION_SCORE, SegmentationEvent, SegmentationWorker};
use annotrack_rs::{DetectionWorker, InferenceMode, ModelState};
use crossbeam_channel::RecvTimeoutError;

use common::*;

#[test]
fn test_latest_submission_wins() {
    init_tracing();
    let (detector, started, gate) = GatedDetector::new();
    let (mut worker, results) = DetectionWorker::spawn(Some(detector)).unwrap();

    assert!(worker.submit(tagged_frame(1), 1));
    assert_eq!(started.recv_timeout(WAIT).unwrap(), 1);

    // worker is busy with frame 1; only the newest of these survives
    for id in 2..=4 {
        assert!(worker.submit(tagged_frame(id), u64::from(id)));
    }
    gate.send(()).unwrap();
    assert_eq!(started.recv_timeout(WAIT).unwrap(), 4);
    gate.send(()).unwrap();

    let processed: Vec<u64> = (0..2)
        .map(|_| results.recv_timeout(WAIT).unwrap().frame_index)
        .collect();
    assert_eq!(processed, vec![1, 4]);
    assert!(started.recv_timeout(QUIET).is_err());

    worker.stop();
}

#[test]
fn test_detect_then_track_until_reload() {
    init_tracing();
    let detector = Arc::new(MockDetector::default());
    let (worker, results) = DetectionWorker::spawn(Some(detector.clone())).unwrap();
    assert_eq!(worker.model_state(), ModelState::FreshModel);

    let mut modes = Vec::new();
    for id in 1..=3 {
        worker.submit(tagged_frame(id), u64::from(id));
        modes.push(results.recv_timeout(WAIT).unwrap().mode);
    }
    assert_eq!(
        modes,
        vec![InferenceMode::Detect, InferenceMode::Track, InferenceMode::Track]
    );
    assert_eq!(worker.model_state(), ModelState::Tracking);

    let reloaded = Arc::new(MockDetector::default());
    worker.set_model(Some(reloaded.clone()));
    assert_eq!(worker.model_state(), ModelState::FreshModel);

    worker.submit(tagged_frame(4), 4);
    let batch = results.recv_timeout(WAIT).unwrap();
    assert_eq!(batch.mode, InferenceMode::Detect);
    assert_eq!(batch.detections[0].track_id, None);
    worker.submit(tagged_frame(5), 5);
    let batch = results.recv_timeout(WAIT).unwrap();
    assert_eq!(batch.mode, InferenceMode::Track);
    assert_eq!(batch.detections[0].track_id, Some(1));

    assert_eq!(detector.calls.lock().unwrap().len(), 3);
    assert_eq!(
        *reloaded.calls.lock().unwrap(),
        vec![(4, InferenceMode::Detect), (5, InferenceMode::Track)]
    );
}

#[test]
fn test_model_swap_during_inference() {
    init_tracing();
    let (gated, started, gate) = GatedDetector::new();
    let (mut worker, results) = DetectionWorker::spawn(Some(gated)).unwrap();

    worker.submit(tagged_frame(1), 1);
    assert_eq!(started.recv_timeout(WAIT).unwrap(), 1);

    // the old model is still inside its call
    let replacement = Arc::new(MockDetector::default());
    worker.set_model(Some(replacement.clone()));
    assert_eq!(worker.model_state(), ModelState::FreshModel);
    worker.submit(tagged_frame(2), 2);
    gate.send(()).unwrap();

    let first = results.recv_timeout(WAIT).unwrap();
    assert_eq!(first.frame_index, 1);
    assert_eq!(first.mode, InferenceMode::Detect);
    assert_eq!(first.detections[0].confidence, 0.8);

    // the finished step of the old model did not advance the new one
    let second = results.recv_timeout(WAIT).unwrap();
    assert_eq!(second.frame_index, 2);
    assert_eq!(second.mode, InferenceMode::Detect);
    assert_eq!(worker.model_state(), ModelState::Tracking);
    assert_eq!(
        *replacement.calls.lock().unwrap(),
        vec![(2, InferenceMode::Detect)]
    );
    assert!(started.recv_timeout(QUIET).is_err());

    worker.stop();
}

#[test]
fn test_without_model_frames_are_accepted_but_silent() {
    init_tracing();
    let (worker, results) = DetectionWorker::spawn(None).unwrap();
    assert!(!worker.has_model());
    assert!(worker.submit(tagged_frame(1), 1));
    assert!(results.recv_timeout(QUIET).is_err());

    worker.set_model(Some(Arc::new(MockDetector::default())));
    assert!(worker.submit(tagged_frame(2), 2));
    let batch = results.recv_timeout(WAIT).unwrap();
    assert_eq!(batch.frame_index, 2);
    assert_eq!(batch.mode, InferenceMode::Detect);

    worker.set_model(None);
    worker.submit(tagged_frame(3), 3);
    assert!(results.recv_timeout(QUIET).is_err());
}

#[test]
fn test_backend_failures_do_not_stop_the_loop() {
    init_tracing();
    let (seen_tx, seen) = crossbeam_channel::unbounded();
    let (worker, results) =
        DetectionWorker::spawn(Some(Arc::new(FlakyDetector { seen: seen_tx }))).unwrap();

    worker.submit(tagged_frame(1), 1);
    assert_eq!(seen.recv_timeout(WAIT).unwrap(), 1);
    worker.submit(tagged_frame(2), 2);
    assert_eq!(seen.recv_timeout(WAIT).unwrap(), 2);
    worker.submit(tagged_frame(3), 3);

    let batch = results.recv_timeout(WAIT).unwrap();
    assert_eq!(batch.frame_index, 3);
    // failed steps do not count as the first successful call
    assert_eq!(batch.mode, InferenceMode::Detect);
    assert!(worker.is_running());
}

#[test]
fn test_stop_waits_for_in_flight_step() {
    init_tracing();
    let (detector, started, gate) = GatedDetector::new();
    let (mut worker, results) = DetectionWorker::spawn(Some(detector)).unwrap();

    worker.submit(tagged_frame(1), 1);
    assert_eq!(started.recv_timeout(WAIT).unwrap(), 1);

    let released = Arc::new(AtomicBool::new(false));
    let releaser = {
        let released = Arc::clone(&released);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            released.store(true, Ordering::SeqCst);
            let _ = gate.send(());
        })
    };

    worker.stop();
    assert!(released.load(Ordering::SeqCst));
    assert!(!worker.is_running());

    // the in-flight batch was delivered before stop returned, nothing after
    assert_eq!(results.try_iter().count(), 1);
    assert_eq!(
        results.recv_timeout(QUIET).unwrap_err(),
        RecvTimeoutError::Disconnected
    );
    releaser.join().unwrap();
}

#[test]
fn test_submit_after_stop_is_noop() {
    init_tracing();
    let (mut worker, _results) = DetectionWorker::spawn(Some(Arc::new(MockDetector::default()))).unwrap();
    worker.stop();
    worker.stop();
    assert!(!worker.submit(tagged_frame(1), 1));
    worker.set_model(None);
}

#[test]
fn test_listener_receives_batches() {
    init_tracing();
    let (tx, rx) = crossbeam_channel::unbounded();
    let worker = DetectionWorker::spawn_with_listener(
        Some(Arc::new(MockDetector::default())),
        move |batch| {
            let _ = tx.send((batch.frame_index, batch.frame.dimensions()));
        },
    )
    .unwrap();
    worker.submit(tagged_frame(9), 90);
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), (90, (32, 24)));
}

#[test]
fn test_segmentation_worker() {
    init_tracing();
    let (mut worker, events) = SegmentationWorker::spawn(Some(Arc::new(PointSegmenter))).unwrap();

    worker.submit(tagged_frame(1), 1, Vec::new());
    assert!(events.recv_timeout(QUIET).is_err());

    worker.submit(tagged_frame(2), 2, vec![PointPrompt::foreground(5.0, 3.0)]);
    match events.recv_timeout(WAIT).unwrap() {
        SegmentationEvent::Mask(result) => {
            assert_eq!(result.frame_index, 2);
            assert_eq!(result.scores, vec![SEGMENTATION_SCORE]);
            assert_eq!(result.orig_shape, (24, 32));
            let mask = result.segmentation().unwrap();
            assert!(mask[[3, 5]]);
            assert_eq!(mask.iter().filter(|v| **v).count(), 1);
        }
        other => panic!("unexpected event {other:?}"),
    }

    worker.set_model(Some(Arc::new(EmptySegmenter)));
    worker.submit(tagged_frame(3), 3, vec![PointPrompt::background(1.0, 1.0)]);
    match events.recv_timeout(WAIT).unwrap() {
        SegmentationEvent::Error(message) => assert_eq!(message, "No masks generated"),
        other => panic!("unexpected event {other:?}"),
    }

    worker.set_model(None);
    assert!(!worker.has_model());
    worker.submit(tagged_frame(4), 4, vec![PointPrompt::foreground(1.0, 1.0)]);
    assert!(events.recv_timeout(QUIET).is_err());

    worker.stop();
    assert!(!worker.submit(tagged_frame(5), 5, vec![PointPrompt::foreground(1.0, 1.0)]));
}

#[test]
fn test_segmentation_backend_failures_are_reported() {
    init_tracing();
    let (worker, events) = SegmentationWorker::spawn(Some(Arc::new(FlakySegmenter))).unwrap();
    let prompt = || vec![PointPrompt::foreground(4.0, 2.0)];

    for tag in [1, 2] {
        worker.submit(tagged_frame(tag), u64::from(tag), prompt());
        match events.recv_timeout(WAIT).unwrap() {
            SegmentationEvent::Error(message) => {
                assert!(message.starts_with("segmentation error: "), "{message}");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    worker.submit(tagged_frame(3), 3, prompt());
    match events.recv_timeout(WAIT).unwrap() {
        SegmentationEvent::Mask(result) => assert_eq!(result.frame_index, 3),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_clear_prompts_drops_pending_job() {
    init_tracing();
    let (segmenter, started, gate) = GatedSegmenter::new();
    let (mut worker, events) = SegmentationWorker::spawn(Some(segmenter)).unwrap();

    worker.submit(tagged_frame(1), 1, vec![PointPrompt::foreground(1.0, 1.0)]);
    assert_eq!(started.recv_timeout(WAIT).unwrap(), (1, 1));

    // frame 2 waits behind frame 1 and loses its prompts
    worker.submit(tagged_frame(2), 2, vec![PointPrompt::foreground(2.0, 2.0)]);
    worker.clear_prompts();
    gate.send(()).unwrap();

    match events.recv_timeout(WAIT).unwrap() {
        SegmentationEvent::Mask(result) => assert_eq!(result.frame_index, 1),
        other => panic!("unexpected event {other:?}"),
    }
    assert!(events.recv_timeout(QUIET).is_err());
    assert!(started.recv_timeout(QUIET).is_err());

    // clearing with nothing pending leaves later submissions alone
    worker.clear_prompts();
    worker.submit(tagged_frame(3), 3, vec![PointPrompt::foreground(3.0, 3.0)]);
    assert_eq!(started.recv_timeout(WAIT).unwrap(), (3, 1));
    gate.send(()).unwrap();
    match events.recv_timeout(WAIT).unwrap() {
        SegmentationEvent::Mask(result) => assert_eq!(result.frame_index, 3),
        other => panic!("unexpected event {other:?}"),
    }

    worker.stop();
}
