// ABOUTME: Core asset type definitions (SectionId, DecodedAudio)
// ABOUTME: Decoded buffers are interleaved f32 PCM shared via Arc

use std::fmt;
use std::sync::Arc;

/// Identifier of a single playable audio stimulus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(String);

impl SectionId {
    /// Create a section id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// PCM audio ready for immediate playback.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]`, shared via `Arc` so the
/// cache and an active playback graph can hold the same buffer without
/// copying. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
}

impl DecodedAudio {
    /// Wrap decoded interleaved samples.
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples: Arc::from(samples.into_boxed_slice()),
            channels,
            sample_rate,
        }
    }

    /// Interleaved sample data.
    pub fn samples(&self) -> &Arc<[f32]> {
        &self.samples
    }

    /// Number of channels per frame.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Playable duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Whether two handles share the same underlying buffer.
    pub fn same_buffer(&self, other: &DecodedAudio) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_frames_and_rate() {
        // 4800 stereo frames at 48kHz = 100ms
        let audio = DecodedAudio::new(vec![0.0; 4800 * 2], 2, 48_000);
        assert_eq!(audio.frames(), 4800);
        assert!((audio.duration_secs() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn zero_rate_has_zero_duration() {
        let audio = DecodedAudio::new(vec![0.0; 100], 1, 0);
        assert_eq!(audio.duration_secs(), 0.0);
    }

    #[test]
    fn clones_share_the_buffer() {
        let audio = DecodedAudio::new(vec![0.0; 4], 2, 48_000);
        let clone = audio.clone();
        assert!(audio.same_buffer(&clone));
    }
}
