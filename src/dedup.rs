//! Cheap frame-similarity throttling ahead of the detection worker.

mod fingerprint;
mod throttle;

pub use fingerprint::Fingerprint;
pub use throttle::{FrameDeduplicator, FrameThrottle, ThrottleDecision};
