// ABOUTME: Output context trait and latency estimate types
// ABOUTME: The single seam between the engine and hardware audio output

use crate::assets::DecodedAudio;
use crate::error::Error;

/// Measured hardware latency, in seconds per component.
///
/// Derived read-only from the live context each time it is queried. Callers
/// must not cache it across `resume()` — the estimate is stale after the
/// context is re-acquired. Components may be non-finite when the hardware
/// cannot report them; [`total_ms`] treats those as zero.
///
/// [`total_ms`]: LatencyEstimate::total_ms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyEstimate {
    /// Processing latency inherent to the output graph.
    pub base_latency: f64,
    /// Latency between submitting a buffer and it becoming audible.
    pub output_latency: f64,
}

impl LatencyEstimate {
    /// An estimate reporting no latency at all.
    pub const ZERO: Self = Self {
        base_latency: 0.0,
        output_latency: 0.0,
    };

    /// Total compensation value in milliseconds.
    ///
    /// Non-finite components count as `0` rather than poisoning the sum
    /// with NaN; the value offsets when a visual cue should appear relative
    /// to when sound is actually audible.
    pub fn total_ms(&self) -> f64 {
        let sanitize = |secs: f64| if secs.is_finite() { secs } else { 0.0 };
        (sanitize(self.base_latency) + sanitize(self.output_latency)) * 1000.0
    }
}

/// The single active output graph (source → gain → destination).
///
/// Only [`AudioEngine`](crate::engine::AudioEngine) calls these methods; no
/// other component constructs output nodes. Implementations start at most
/// one source at a time: `start_source` on an implementation with an active
/// source replaces it.
pub trait OutputContext {
    /// Build a fresh output graph for `audio` and start it `offset_secs`
    /// into the buffer.
    fn start_source(&mut self, audio: &DecodedAudio, offset_secs: f64) -> Result<(), Error>;

    /// Halt and discard the active source. Benign no-op when idle.
    fn stop_source(&mut self);

    /// Update the gain stage without interrupting playback. `level` is a
    /// linear 0.0–1.0 factor; out-of-range and non-finite values are
    /// clamped.
    fn set_gain(&mut self, level: f32);

    /// Current latency estimate from the live hardware.
    fn latency(&self) -> LatencyEstimate;

    /// Release the hardware resource, keeping graph state for `resume`.
    fn suspend(&mut self) -> Result<(), Error>;

    /// Re-acquire the hardware resource after `suspend`.
    fn resume(&mut self) -> Result<(), Error>;
}
