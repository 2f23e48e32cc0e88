// ABOUTME: Lock-free gain control shared with the audio callback
// ABOUTME: Atomic target level plus a per-frame ramp to avoid clicks

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared gain level for an output context.
///
/// All methods are lock-free and safe to call from any thread; the audio
/// callback reads the target while the control thread writes it. Cloning is
/// cheap (single `Arc` increment).
#[derive(Clone)]
pub struct GainControl {
    target_bits: Arc<AtomicU32>,
}

impl GainControl {
    /// Create a control at the given initial level (clamped to 0.0–1.0).
    pub(crate) fn new(level: f32) -> Self {
        Self {
            target_bits: Arc::new(AtomicU32::new(clamp_level(level).to_bits())),
        }
    }

    /// Set the gain level. Values outside 0.0–1.0 are clamped; non-finite
    /// values fail safe to silence.
    pub fn set_level(&self, level: f32) {
        self.target_bits
            .store(clamp_level(level).to_bits(), Ordering::Relaxed);
    }

    /// Current target level (0.0–1.0).
    pub fn level(&self) -> f32 {
        let level = f32::from_bits(self.target_bits.load(Ordering::Relaxed));
        // The store path clamps, but fail safe on read too: NaN is unordered
        // so `clamp` would propagate it into the entire ramp.
        if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl fmt::Debug for GainControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GainControl")
            .field("level", &self.level())
            .finish()
    }
}

/// Per-frame gain ramp to avoid clicks on level changes.
///
/// Operates per-frame (not per-sample) so ramp duration is independent of
/// channel count; all samples within a frame get the same gain value.
pub(crate) struct GainRamp {
    /// Frames over which to ramp (20ms at the configured sample rate).
    /// Zero for very low sample rates, in which case changes snap.
    ramp_duration_frames: u32,
    current_gain: f32,
    ramp_frames_remaining: u32,
    ramp_step: f32,
    last_target: f32,
}

impl GainRamp {
    /// Create a ramp with a 20ms transition at the given sample rate,
    /// starting (without ramping) at `initial_gain`.
    pub(crate) fn new(sample_rate: u32, initial_gain: f32) -> Self {
        let gain = clamp_level(initial_gain);
        Self {
            ramp_duration_frames: sample_rate / 50,
            current_gain: gain,
            ramp_frames_remaining: 0,
            ramp_step: 0.0,
            last_target: gain,
        }
    }

    /// Apply gain to an interleaved f32 buffer of `channels` samples per
    /// frame, ramping toward `target`.
    pub(crate) fn apply(&mut self, data: &mut [f32], channels: usize, target: f32) {
        // channels == 0 is a programming error but must not panic on the
        // audio thread. Returning before update_target keeps a target
        // change from being committed by a degenerate call.
        if data.is_empty() || channels == 0 {
            return;
        }
        debug_assert!(
            data.len() % channels == 0,
            "buffer length must be a multiple of channels"
        );

        self.update_target(target);

        // Fast path: unity gain and no active ramp leaves the buffer alone.
        if self.ramp_frames_remaining == 0 && self.current_gain == 1.0 {
            return;
        }

        let frames = data.len() / channels;
        let ramp_frames = (self.ramp_frames_remaining as usize).min(frames);

        let (ramp_data, steady_data) = data.split_at_mut(ramp_frames * channels);
        for frame in ramp_data.chunks_mut(channels) {
            self.current_gain += self.ramp_step;
            self.ramp_frames_remaining -= 1;
            if self.ramp_frames_remaining == 0 {
                self.current_gain = target;
            }
            for sample in frame.iter_mut() {
                *sample *= self.current_gain;
            }
        }
        // Bound floating-point accumulation error once per callback.
        if ramp_frames > 0 && self.ramp_frames_remaining > 0 {
            self.current_gain = self.current_gain.clamp(0.0, 1.0);
        }

        let gain = self.current_gain;
        if gain == 0.0 {
            steady_data.fill(0.0);
        } else {
            for sample in steady_data.iter_mut() {
                *sample *= gain;
            }
        }
    }

    fn update_target(&mut self, target: f32) {
        if !target.is_finite() {
            return;
        }
        if target.to_bits() != self.last_target.to_bits() {
            if self.ramp_duration_frames == 0 {
                self.current_gain = target;
            } else {
                self.ramp_frames_remaining = self.ramp_duration_frames;
                self.ramp_step = (target - self.current_gain) / self.ramp_duration_frames as f32;
            }
            self.last_target = target;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_roundtrip_and_clamp() {
        let gc = GainControl::new(1.0);
        gc.set_level(0.5);
        assert!((gc.level() - 0.5).abs() < f32::EPSILON);

        gc.set_level(1.5);
        assert!((gc.level() - 1.0).abs() < f32::EPSILON);

        gc.set_level(-0.5);
        assert_eq!(gc.level(), 0.0);
    }

    #[test]
    fn non_finite_level_fails_safe_to_silence() {
        let gc = GainControl::new(1.0);
        gc.set_level(f32::NAN);
        assert_eq!(gc.level(), 0.0);
        gc.set_level(f32::INFINITY);
        assert_eq!(gc.level(), 0.0);
    }

    #[test]
    fn clone_shares_state() {
        let gc = GainControl::new(1.0);
        let gc2 = gc.clone();
        gc.set_level(0.25);
        assert!((gc2.level() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn ramp_reaches_target_exactly() {
        let mut ramp = GainRamp::new(1000, 1.0); // 20 frames for 20ms
        let mut data = vec![1.0; 20];
        ramp.apply(&mut data, 1, 0.5);

        assert!((ramp.current_gain - 0.5).abs() < f32::EPSILON);
        assert!((data[19] - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn ramp_duration_is_channel_independent() {
        let mut mono_ramp = GainRamp::new(1000, 1.0);
        let mut mono = vec![1.0; 20];
        mono_ramp.apply(&mut mono, 1, 0.0);

        let mut stereo_ramp = GainRamp::new(1000, 1.0);
        let mut stereo = vec![1.0; 40];
        stereo_ramp.apply(&mut stereo, 2, 0.0);

        // Last frame's left channel should match mono's last sample.
        assert!((mono[19] - stereo[38]).abs() < 1e-5);
    }

    #[test]
    fn unity_gain_fast_path_leaves_buffer_unchanged() {
        let mut ramp = GainRamp::new(48_000, 1.0);
        let original = [0.1, 0.2, 0.3, 0.4];
        let mut data = original;
        ramp.apply(&mut data, 2, 1.0);
        assert_eq!(data, original);
    }

    #[test]
    fn muted_steady_state_fills_zeros() {
        let mut ramp = GainRamp::new(1000, 1.0); // 20-frame ramp
        let mut data = vec![1.0; 40];
        ramp.apply(&mut data, 1, 0.0);

        for &s in &data[20..] {
            assert_eq!(s, 0.0);
        }
    }

    #[test]
    fn empty_buffer_does_not_commit_target() {
        let mut ramp = GainRamp::new(1000, 0.5);
        ramp.apply(&mut [], 1, 0.0);
        assert!((ramp.current_gain - 0.5).abs() < f32::EPSILON);

        // The next real buffer ramps from 0.5, not from a stale state.
        let mut data = vec![1.0; 20];
        ramp.apply(&mut data, 1, 0.0);
        assert!((ramp.current_gain - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_ramp_duration_snaps_instantly() {
        let mut ramp = GainRamp::new(10, 1.0);
        assert_eq!(ramp.ramp_duration_frames, 0);

        let mut data = vec![1.0; 5];
        ramp.apply(&mut data, 1, 0.25);
        for &s in &data {
            assert!((s - 0.25).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn mid_ramp_reversal_stays_in_range() {
        let mut ramp = GainRamp::new(1000, 1.0);
        let mut down = vec![1.0; 10];
        ramp.apply(&mut down, 1, 0.0);
        let mut up = vec![1.0; 30];
        ramp.apply(&mut up, 1, 1.0);

        for &s in down.iter().chain(up.iter()) {
            assert!((0.0..=1.0).contains(&s), "sample out of range: {s}");
        }
        assert!((ramp.current_gain - 1.0).abs() < f32::EPSILON);
    }
}
