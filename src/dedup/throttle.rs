use tracing::trace;

use super::fingerprint::Fingerprint;
use crate::config::DedupConfig;
use crate::frame::Frame;

/// Suppresses frames that look like the last submitted one.
#[derive(Debug, Clone)]
pub struct FrameDeduplicator {
    thumbnail_size: u32,
    threshold: f32,
    reference: Option<Fingerprint>,
}

impl FrameDeduplicator {
    pub fn new(thumbnail_size: u32, threshold: f32) -> Self {
        Self {
            thumbnail_size,
            threshold,
            reference: None,
        }
    }

    pub fn from_config(config: &DedupConfig) -> Self {
        Self::new(config.thumbnail_size, config.threshold)
    }

    /// Decide whether `frame` should go to the worker.
    ///
    /// A submitted frame becomes the new reference; a suppressed one does not,
    /// so slow drift still ends up submitted.
    pub fn should_submit(&mut self, frame: &Frame) -> bool {
        let candidate = Fingerprint::compute(frame, self.thumbnail_size);
        if let Some(reference) = &self.reference {
            let difference = candidate.mean_abs_diff(reference);
            if difference < self.threshold {
                trace!(fingerprint = %candidate.hex(), difference, "near-duplicate frame skipped");
                return false;
            }
        }
        trace!(fingerprint = %candidate.hex(), "frame accepted");
        self.reference = Some(candidate);
        true
    }

    /// Forget the reference; the next frame is always submitted.
    pub fn reset(&mut self) {
        self.reference = None;
    }

    pub fn reference(&self) -> Option<&Fingerprint> {
        self.reference.as_ref()
    }
}

impl Default for FrameDeduplicator {
    fn default() -> Self {
        Self::from_config(&DedupConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Dropped by the every-Nth-frame rule.
    SkippedInterval,
    /// Dropped as a near-duplicate of the last submitted frame.
    SkippedSimilar,
    Submit,
}

impl ThrottleDecision {
    pub fn is_submit(self) -> bool {
        self == ThrottleDecision::Submit
    }
}

/// Interval skip followed by similarity skip.
///
/// While playback runs at elevated speed only every Nth frame is considered;
/// the frames that survive still go through the [`FrameDeduplicator`].
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    every_n: u32,
    elevated: bool,
    counter: u64,
    dedup: FrameDeduplicator,
}

impl FrameThrottle {
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            every_n: config.elevated_every_n.max(1),
            elevated: false,
            counter: 0,
            dedup: FrameDeduplicator::from_config(config),
        }
    }

    /// Toggle elevated-speed mode. The interval counter restarts.
    pub fn set_elevated_speed(&mut self, elevated: bool) {
        self.elevated = elevated;
        self.counter = 0;
    }

    pub fn is_elevated(&self) -> bool {
        self.elevated
    }

    pub fn offer(&mut self, frame: &Frame) -> ThrottleDecision {
        if self.elevated && self.every_n > 1 {
            self.counter += 1;
            if self.counter % u64::from(self.every_n) != 0 {
                return ThrottleDecision::SkippedInterval;
            }
        }
        if self.dedup.should_submit(frame) {
            ThrottleDecision::Submit
        } else {
            ThrottleDecision::SkippedSimilar
        }
    }

    /// Reset after a source switch or seek.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.dedup.reset();
    }
}
