// ABOUTME: Hardware output context built on cpal
// ABOUTME: One fresh output stream per source, with measured output latency

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::assets::DecodedAudio;
use crate::engine::context::{LatencyEstimate, OutputContext};
use crate::engine::gain::{GainControl, GainRamp};
use crate::error::Error;

/// State shared between the control thread and the audio callback.
///
/// The callback thread only touches atomics and the error mutex; it never
/// calls back into the engine.
struct StreamShared {
    /// Next interleaved sample index into the source buffer.
    cursor: AtomicUsize,
    /// Most recent playback-minus-callback delta, in microseconds.
    output_latency_us: AtomicU64,
    /// Last error reported by the stream callback, if any.
    last_error: Mutex<Option<String>>,
}

struct ActiveStream {
    // Held for its Drop: dropping the Stream tears the graph down.
    _stream: Stream,
    shared: Arc<StreamShared>,
}

/// [`OutputContext`] implementation over the default (or a provided) cpal
/// output device.
///
/// Each `start_source` builds a fresh output stream for that buffer —
/// the source → gain → destination graph of one playback session. Output
/// latency is measured live from the callback's playback/callback timestamp
/// delta; base latency is not reported by cpal and reads as NaN, which
/// [`LatencyEstimate::total_ms`] treats as zero.
pub struct CpalContext {
    device: Device,
    gain: GainControl,
    active: Option<ActiveStream>,
    suspended: bool,
}

impl CpalContext {
    /// Create a context on the default output device.
    ///
    /// Host platforms gate audio output behind a user interaction; construct
    /// the context (and [`initialize`](crate::engine::AudioEngine::initialize)
    /// the engine) only after one has occurred.
    pub fn new() -> Result<Self, Error> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Output("no output device available".to_string()))?;
        Ok(Self::with_device(device))
    }

    /// Create a context on a specific device.
    pub fn with_device(device: Device) -> Self {
        Self {
            device,
            gain: GainControl::new(1.0),
            active: None,
            suspended: false,
        }
    }

    /// Last error reported by the active stream's callback, clearing it.
    pub fn take_error(&self) -> Option<String> {
        self.active
            .as_ref()
            .and_then(|a| a.shared.last_error.lock().take())
    }

    fn build_stream(
        &self,
        audio: &DecodedAudio,
        offset_secs: f64,
    ) -> Result<ActiveStream, Error> {
        let channels = usize::from(audio.channels().max(1));
        let sample_rate = audio.sample_rate();
        let config = StreamConfig {
            channels: audio.channels().max(1),
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let offset_frames = (offset_secs.max(0.0) * f64::from(sample_rate)) as usize;
        let start_index = (offset_frames * channels).min(audio.samples().len());

        let shared = Arc::new(StreamShared {
            cursor: AtomicUsize::new(start_index),
            output_latency_us: AtomicU64::new(0),
            last_error: Mutex::new(None),
        });

        let samples = Arc::clone(audio.samples());
        let cb_shared = Arc::clone(&shared);
        let gain = self.gain.clone();
        let mut ramp = GainRamp::new(sample_rate, gain.level());

        let err_shared = Arc::clone(&shared);
        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [f32], info: &cpal::OutputCallbackInfo| {
                    let ts = info.timestamp();
                    let delta = ts
                        .playback
                        .duration_since(&ts.callback)
                        .unwrap_or(Duration::ZERO);
                    cb_shared
                        .output_latency_us
                        .store(delta.as_micros() as u64, Ordering::Relaxed);

                    let start = cb_shared.cursor.load(Ordering::Relaxed).min(samples.len());
                    let n = data.len().min(samples.len() - start);
                    data[..n].copy_from_slice(&samples[start..start + n]);
                    data[n..].fill(0.0);
                    cb_shared.cursor.store(start + n, Ordering::Relaxed);

                    ramp.apply(data, channels, gain.level());
                },
                move |err| {
                    warn!("audio stream error: {err}");
                    *err_shared.last_error.lock() = Some(err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Output(e.to_string()))?;

        Ok(ActiveStream {
            _stream: stream,
            shared,
        })
    }
}

impl OutputContext for CpalContext {
    fn start_source(&mut self, audio: &DecodedAudio, offset_secs: f64) -> Result<(), Error> {
        // The old graph must be torn down before the new one starts; two
        // audible sources at once is a defect, not a race.
        self.stop_source();

        let active = self.build_stream(audio, offset_secs)?;
        if self.suspended {
            active
                ._stream
                .pause()
                .map_err(|e| Error::Output(e.to_string()))?;
        } else {
            active
                ._stream
                .play()
                .map_err(|e| Error::Output(e.to_string()))?;
        }
        self.active = Some(active);
        debug!("started source at {offset_secs:.3}s");
        Ok(())
    }

    fn stop_source(&mut self) {
        if self.active.take().is_some() {
            debug!("stopped source");
        }
    }

    fn set_gain(&mut self, level: f32) {
        self.gain.set_level(level);
    }

    fn latency(&self) -> LatencyEstimate {
        let output_latency = match &self.active {
            Some(active) => {
                active.shared.output_latency_us.load(Ordering::Relaxed) as f64 / 1_000_000.0
            }
            None => 0.0,
        };
        LatencyEstimate {
            // cpal does not report graph-processing latency.
            base_latency: f64::NAN,
            output_latency,
        }
    }

    fn suspend(&mut self) -> Result<(), Error> {
        self.suspended = true;
        if let Some(active) = &self.active {
            active
                ._stream
                .pause()
                .map_err(|e| Error::Output(e.to_string()))?;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<(), Error> {
        self.suspended = false;
        if let Some(active) = &self.active {
            active
                ._stream
                .play()
                .map_err(|e| Error::Output(e.to_string()))?;
        }
        Ok(())
    }
}
