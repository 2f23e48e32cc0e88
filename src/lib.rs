// ABOUTME: Playback timing and audio-buffer synchronization engine
// ABOUTME: Clock-driven playback with cached decoded assets and synced visuals

//! cuesync drives stimulus playback for experiment runs: it decodes and
//! caches audio assets keyed by section id, plays them from arbitrary
//! offsets with measured hardware latency compensation, and keeps visual
//! countdown/progress state in lock-step with the audio.
//!
//! Everything runs on one thread, cooperatively: per-frame clock callbacks,
//! async decode completions, and user-driven play/stop calls interleave on
//! a current-thread runtime inside a [`tokio::task::LocalSet`]. The only
//! cross-thread boundary is the hardware audio callback, hidden behind
//! [`engine::OutputContext`].
//!
//! Typical wiring:
//!
//! ```no_run
//! use std::rc::Rc;
//! use cuesync::assets::{AudioAssetCache, FileSource, SectionId, WavDecoder};
//! use cuesync::engine::{AudioEngine, CpalContext, SessionEvents};
//!
//! # async fn run() -> Result<(), cuesync::Error> {
//! let cache = AudioAssetCache::new(Rc::new(FileSource::new()), Rc::new(WavDecoder::new()));
//! let id = SectionId::from("warmup");
//! cache.register(id.clone(), "stimuli/warmup.wav");
//!
//! let engine = AudioEngine::new(cache);
//! // After a qualifying user interaction:
//! engine.initialize(Box::new(CpalContext::new()?));
//! engine
//!     .play_session(
//!         &id,
//!         0.0,
//!         SessionEvents {
//!             on_tick: Some(Box::new(|elapsed| println!("{elapsed:.2}s"))),
//!             on_finish: Some(Box::new(|| println!("done"))),
//!         },
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

/// Asset loading, decoding, and caching
pub mod assets;
/// Frame-driven playback clock
pub mod clock;
/// Playback engine and output contexts
pub mod engine;
/// Crate-wide error type
pub mod error;
/// Clock-driven visual state producers
pub mod visual;

pub use assets::{AudioAssetCache, DecodedAudio, SectionId};
pub use clock::{ClockConfig, ClockHandle, PlaybackClock};
pub use engine::{AudioEngine, CpalContext, LatencyEstimate, OutputContext, SessionEvents};
pub use error::Error;
pub use visual::{Countdown, CountdownStatus, ProgressRing, RingState};
