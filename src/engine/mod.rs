// ABOUTME: Audio engine owning the single active output graph
// ABOUTME: Contains the engine, output context seam, gain control, and cpal backend

/// Playback engine and session lifecycle
pub mod audio_engine;
/// Output context trait and latency types
pub mod context;
/// Hardware output context built on cpal
pub mod cpal_context;
/// Lock-free gain control and per-frame ramping
pub mod gain;

pub use audio_engine::{AudioEngine, PlaybackSession, SessionEvents};
pub use context::{LatencyEstimate, OutputContext};
pub use cpal_context::CpalContext;
pub use gain::GainControl;
