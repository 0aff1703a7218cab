#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use annotrack_rs::error::{BackendError, FrameReadError};
use annotrack_rs::worker::{Mask, PointPrompt, SegmentationBackend};
use annotrack_rs::{BoxDetection, DetectionBackend, Frame, InferenceMode};
use crossbeam_channel::{Receiver, Sender};
use ndarray::Array2;

pub const WAIT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(200);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Frame whose red channel carries `id`, so backends can tell frames apart.
pub fn tagged_frame(id: u8) -> Frame {
    Frame::filled(32, 24, [id, 0, 0])
}

pub fn frame_tag(frame: &Frame) -> u8 {
    frame.as_bytes()[0]
}

/// Records every call and reports one box per frame.
#[derive(Default)]
pub struct MockDetector {
    pub calls: Mutex<Vec<(u8, InferenceMode)>>,
}

impl DetectionBackend for MockDetector {
    fn infer(&self, frame: &Frame, mode: InferenceMode) -> Result<Vec<BoxDetection>, BackendError> {
        self.calls
            .lock()
            .map_err(|_| BackendError::Inference("poisoned".into()))?
            .push((frame_tag(frame), mode));
        let det = BoxDetection::new(2.0, 2.0, 12.0, 10.0, 0.9, 0);
        Ok(vec![match mode {
            InferenceMode::Detect => det,
            InferenceMode::Track => det.with_track_id(1),
        }])
    }

    fn class_name(&self, class_id: usize) -> Option<String> {
        (class_id == 0).then(|| "crab".to_string())
    }
}

/// Announces each call on `started` and then blocks until a token arrives
/// on `gate`.
pub struct GatedDetector {
    pub started: Sender<u8>,
    pub gate: Receiver<()>,
}

impl GatedDetector {
    /// Detector plus the receiver of started frame tags and the gate sender.
    pub fn new() -> (Arc<Self>, Receiver<u8>, Sender<()>) {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let detector = Arc::new(Self {
            started: started_tx,
            gate: gate_rx,
        });
        (detector, started_rx, gate_tx)
    }
}

impl DetectionBackend for GatedDetector {
    fn infer(&self, frame: &Frame, _mode: InferenceMode) -> Result<Vec<BoxDetection>, BackendError> {
        let _ = self.started.send(frame_tag(frame));
        self.gate
            .recv()
            .map_err(|_| BackendError::Inference("gate closed".into()))?;
        Ok(vec![BoxDetection::new(0.0, 0.0, 4.0, 4.0, 0.8, 0)])
    }
}

/// Fails on tag 1, panics on tag 2, detects otherwise. Every call is
/// reported on `seen`.
pub struct FlakyDetector {
    pub seen: Sender<u8>,
}

impl DetectionBackend for FlakyDetector {
    fn infer(&self, frame: &Frame, _mode: InferenceMode) -> Result<Vec<BoxDetection>, BackendError> {
        let tag = frame_tag(frame);
        let _ = self.seen.send(tag);
        match tag {
            1 => Err(BackendError::Inference("cuda out of memory".into())),
            2 => panic!("backend crashed"),
            _ => Ok(vec![BoxDetection::new(1.0, 1.0, 8.0, 8.0, 0.7, 0)]),
        }
    }
}

/// One mask per foreground prompt, marking the prompt pixel.
pub struct PointSegmenter;

impl SegmentationBackend for PointSegmenter {
    fn segment(&self, frame: &Frame, prompts: &[PointPrompt]) -> Result<Vec<Mask>, BackendError> {
        Ok(prompts
            .iter()
            .map(|p| {
                let mut mask = Array2::from_elem(
                    (frame.height() as usize, frame.width() as usize),
                    false,
                );
                mask[[p.y as usize, p.x as usize]] = true;
                mask
            })
            .collect())
    }
}

pub struct EmptySegmenter;

impl SegmentationBackend for EmptySegmenter {
    fn segment(&self, _frame: &Frame, _prompts: &[PointPrompt]) -> Result<Vec<Mask>, BackendError> {
        Ok(Vec::new())
    }
}

/// Fails on tag 1, panics on tag 2, defers to [`PointSegmenter`] otherwise.
pub struct FlakySegmenter;

impl SegmentationBackend for FlakySegmenter {
    fn segment(&self, frame: &Frame, prompts: &[PointPrompt]) -> Result<Vec<Mask>, BackendError> {
        match frame_tag(frame) {
            1 => Err(BackendError::Inference("weights not loaded".into())),
            2 => panic!("segmenter crashed"),
            _ => PointSegmenter.segment(frame, prompts),
        }
    }
}

/// [`PointSegmenter`] that reports each call with its prompt count on
/// `started` and then waits for a token on `gate`.
pub struct GatedSegmenter {
    pub started: Sender<(u8, usize)>,
    pub gate: Receiver<()>,
}

impl GatedSegmenter {
    pub fn new() -> (Arc<Self>, Receiver<(u8, usize)>, Sender<()>) {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let segmenter = Arc::new(Self {
            started: started_tx,
            gate: gate_rx,
        });
        (segmenter, started_rx, gate_tx)
    }
}

impl SegmentationBackend for GatedSegmenter {
    fn segment(&self, frame: &Frame, prompts: &[PointPrompt]) -> Result<Vec<Mask>, BackendError> {
        let _ = self.started.send((frame_tag(frame), prompts.len()));
        self.gate
            .recv()
            .map_err(|_| BackendError::Inference("gate closed".into()))?;
        PointSegmenter.segment(frame, prompts)
    }
}

/// Reader producing a solid frame per index, failing for indices in `broken`.
pub fn solid_reader(
    width: u32,
    height: u32,
    broken: Vec<u64>,
) -> impl FnMut(u64) -> Result<Frame, FrameReadError> {
    move |frame_index| {
        if broken.contains(&frame_index) {
            return Err(FrameReadError::NotFound(frame_index));
        }
        Ok(Frame::filled(width, height, [(frame_index * 20) as u8, 90, 160]))
    }
}
