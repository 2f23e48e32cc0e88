// ABOUTME: Playback engine owning the single active session
// ABOUTME: Resolves buffers via the cache, drives output and a playback clock

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use tokio::time::Instant;

use crate::assets::{AudioAssetCache, SectionId};
use crate::clock::{ClockConfig, ClockHandle, FinishFn, PlaybackClock, TickFn, DEFAULT_FRAME_INTERVAL};
use crate::engine::context::OutputContext;
use crate::error::Error;

/// Caller-supplied notifications for one playback session.
///
/// `on_tick` fires at scheduler cadence with the elapsed playback time;
/// `on_finish` fires exactly once when the section completes naturally.
/// Neither fires after `stop()` or supersession by a newer `play`.
#[derive(Default)]
pub struct SessionEvents {
    /// Per-frame elapsed-time callback.
    pub on_tick: Option<TickFn>,
    /// Natural-completion callback.
    pub on_finish: Option<FinishFn>,
}

/// State of one active audio playback instance.
pub struct PlaybackSession {
    asset_id: SectionId,
    start_offset: f64,
    started_at: Instant,
    clock: ClockHandle,
}

impl PlaybackSession {
    /// The section being played.
    pub fn asset_id(&self) -> &SectionId {
        &self.asset_id
    }

    /// Offset in seconds at which playback started.
    pub fn start_offset(&self) -> f64 {
        self.start_offset
    }

    /// When playback started.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Explicit session lifecycle. `running` booleans scattered across callers
/// are exactly the bug this replaces.
enum SessionState {
    Idle,
    Loading { generation: u64 },
    Playing(PlaybackSession),
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PowerState {
    Running,
    Suspended,
}

struct EngineInner {
    context: Option<Box<dyn OutputContext>>,
    state: SessionState,
    power: PowerState,
    /// Bumped by every play/stop; an in-flight load whose generation no
    /// longer matches must not start a session when it resolves.
    generation: u64,
}

impl EngineInner {
    /// Synchronously halt the active session's clock and output node.
    /// The caller decides the successor state.
    fn halt_active_session(&mut self) {
        if let SessionState::Playing(session) = &self.state {
            session.clock.cancel();
            if let Some(context) = self.context.as_mut() {
                context.stop_source();
            }
        }
    }

    fn loading_generation(&self) -> Option<u64> {
        match &self.state {
            SessionState::Loading { generation } => Some(*generation),
            _ => None,
        }
    }
}

/// The playback engine: owns the output context and at most one active
/// [`PlaybackSession`].
///
/// Created `Uninitialized`; call [`initialize`] with an output context once
/// the host platform permits audio output (after a qualifying user
/// interaction). `play` before that is an error. All other operations are
/// best-effort and never fail for benign misuse.
///
/// The engine is a cheap-to-clone handle over shared single-threaded state,
/// so UI callbacks and completion handlers can hold their own copies.
///
/// [`initialize`]: AudioEngine::initialize
#[derive(Clone)]
pub struct AudioEngine {
    inner: Rc<RefCell<EngineInner>>,
    cache: AudioAssetCache,
}

impl AudioEngine {
    /// Create an uninitialized engine over an injected asset cache.
    pub fn new(cache: AudioAssetCache) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EngineInner {
                context: None,
                state: SessionState::Idle,
                power: PowerState::Running,
                generation: 0,
            })),
            cache,
        }
    }

    /// Attach the output context. Call after a qualifying user interaction.
    /// A second call replaces the context only if nothing is playing.
    pub fn initialize(&self, context: Box<dyn OutputContext>) {
        let mut inner = self.inner.borrow_mut();
        if matches!(inner.state, SessionState::Playing(_)) {
            warn!("initialize() ignored while a session is playing");
            return;
        }
        inner.context = Some(context);
        inner.power = PowerState::Running;
    }

    /// Whether the engine has an output context.
    pub fn is_initialized(&self) -> bool {
        self.inner.borrow().context.is_some()
    }

    /// The cache this engine resolves buffers from.
    pub fn cache(&self) -> &AudioAssetCache {
        &self.cache
    }

    /// Play a section from its beginning.
    pub async fn play(&self, id: &SectionId) -> Result<(), Error> {
        self.play_session(id, 0.0, SessionEvents::default()).await
    }

    /// Play a section from `offset_secs` into the buffer.
    pub async fn play_from(&self, id: &SectionId, offset_secs: f64) -> Result<(), Error> {
        self.play_session(id, offset_secs, SessionEvents::default())
            .await
    }

    /// Play a section from an offset, wiring tick/finish notifications.
    ///
    /// Any active session is stopped synchronously before the new buffer is
    /// resolved; overlapping audible output never occurs. If a newer `play`
    /// or a `stop` supersedes this call while its decode is in flight, the
    /// decode result is discarded and `Ok(())` is returned without starting
    /// a session.
    pub async fn play_session(
        &self,
        id: &SectionId,
        offset_secs: f64,
        events: SessionEvents,
    ) -> Result<(), Error> {
        let generation = {
            let mut inner = self.inner.borrow_mut();
            if inner.context.is_none() {
                return Err(Error::EngineNotReady);
            }
            inner.halt_active_session();
            inner.generation += 1;
            let generation = inner.generation;
            inner.state = SessionState::Loading { generation };
            generation
        };

        // Suspension point: the borrow is released while the decode runs.
        let audio = match self.cache.get(id) {
            Some(audio) => audio,
            None => match self.cache.load_registered(id).await {
                Ok(audio) => audio,
                Err(e) => {
                    let mut inner = self.inner.borrow_mut();
                    if inner.loading_generation() != Some(generation) {
                        // A newer play or a stop owns the state now; the
                        // failure belongs to whoever retries, not to us.
                        debug!("play of '{id}' superseded while decoding; not starting");
                        return Ok(());
                    }
                    inner.state = SessionState::Idle;
                    return Err(e);
                }
            },
        };

        let mut inner = self.inner.borrow_mut();
        if inner.loading_generation() != Some(generation) {
            debug!("play of '{id}' superseded while decoding; not starting");
            return Ok(());
        }

        let Some(context) = inner.context.as_mut() else {
            inner.state = SessionState::Idle;
            return Err(Error::EngineNotReady);
        };
        if let Err(e) = context.start_source(&audio, offset_secs) {
            inner.state = SessionState::Idle;
            return Err(e);
        }

        let duration = (audio.duration_secs() - offset_secs.max(0.0)).max(0.0);
        let SessionEvents { on_tick, on_finish } = events;
        let finish_inner = Rc::clone(&self.inner);
        let clock = PlaybackClock::start(ClockConfig {
            initial_elapsed: 0.0,
            duration,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            on_tick,
            on_finish: Some(Box::new(move || {
                finish_session(&finish_inner, generation);
                if let Some(finish) = on_finish {
                    finish();
                }
            })),
        });

        inner.state = SessionState::Playing(PlaybackSession {
            asset_id: id.clone(),
            start_offset: offset_secs,
            started_at: Instant::now(),
            clock,
        });
        debug!("playing '{id}' from {offset_secs:.3}s for {duration:.3}s");
        Ok(())
    }

    /// Halt the active session. Idempotent; safe with nothing playing.
    pub fn stop(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.generation += 1; // invalidate any in-flight load
        inner.halt_active_session();
        inner.state = SessionState::Stopped;
    }

    /// Update the gain stage without stopping playback. Best-effort no-op
    /// while uninitialized.
    pub fn set_gain(&self, level: f32) {
        let mut inner = self.inner.borrow_mut();
        if let Some(context) = inner.context.as_mut() {
            context.set_gain(level);
        }
    }

    /// Total latency compensation in milliseconds, never NaN.
    ///
    /// Queried live from the context on every call — the estimate is stale
    /// after `resume()` and must not be cached across it.
    pub fn total_latency_ms(&self) -> f64 {
        match self.inner.borrow().context.as_ref() {
            Some(context) => context.latency().total_ms(),
            None => 0.0,
        }
    }

    /// Release the hardware audio resource. Best-effort.
    pub fn suspend(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(context) = inner.context.as_mut() {
            if let Err(e) = context.suspend() {
                warn!("suspend failed: {e}");
            }
        }
        inner.power = PowerState::Suspended;
    }

    /// Re-acquire the hardware audio resource. Best-effort.
    pub fn resume(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(context) = inner.context.as_mut() {
            if let Err(e) = context.resume() {
                warn!("resume failed: {e}");
            }
        }
        inner.power = PowerState::Running;
    }

    /// Whether the hardware resource is currently suspended.
    pub fn is_suspended(&self) -> bool {
        self.inner.borrow().power == PowerState::Suspended
    }

    /// Whether a session is currently playing.
    pub fn is_playing(&self) -> bool {
        matches!(self.inner.borrow().state, SessionState::Playing(_))
    }

    /// The section of the active or loading session, if any.
    pub fn current_section(&self) -> Option<SectionId> {
        match &self.inner.borrow().state {
            SessionState::Playing(session) => Some(session.asset_id.clone()),
            _ => None,
        }
    }
}

/// Natural-completion transition, invoked from the session clock's finish
/// callback. The generation check makes it a no-op if a newer play or a
/// stop got there first.
fn finish_session(inner: &Rc<RefCell<EngineInner>>, generation: u64) {
    let mut inner = inner.borrow_mut();
    if inner.generation != generation {
        return;
    }
    if let Some(context) = inner.context.as_mut() {
        context.stop_source();
    }
    inner.state = SessionState::Idle;
}
