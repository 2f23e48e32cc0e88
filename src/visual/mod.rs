// ABOUTME: Visual state producers driven by playback clock ticks
// ABOUTME: ProgressRing and Countdown derive deterministic state from elapsed/duration

/// Countdown display state
pub mod countdown;
/// Progress ring fill state
pub mod progress_ring;

pub use countdown::{Countdown, CountdownConfig, CountdownState, CountdownStatus};
pub use progress_ring::{ProgressRing, RingConfig, RingState, RING_LEAD_BIAS_SECS};
