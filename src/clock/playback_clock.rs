// ABOUTME: Cancellable, frame-driven playback clock
// ABOUTME: Samples a monotonic clock per frame and fires tick/finish callbacks

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use typed_builder::TypedBuilder;

/// Default per-frame cadence, roughly one notification per display frame.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Periodic elapsed-time notification. Receives seconds since playback start.
pub type TickFn = Box<dyn FnMut(f64) + 'static>;

/// One-shot completion notification.
pub type FinishFn = Box<dyn FnOnce() + 'static>;

/// Configuration for [`PlaybackClock::start`].
///
/// `on_tick` fires once per frame with the clamped elapsed time while
/// `elapsed < duration`; `on_finish` fires exactly once when the duration is
/// reached. Both are optional so a caller can observe only the edge it
/// cares about.
#[derive(TypedBuilder)]
pub struct ClockConfig {
    /// Elapsed seconds already consumed before this clock starts (e.g. when
    /// resuming playback mid-section).
    #[builder(default = 0.0)]
    pub initial_elapsed: f64,

    /// Total duration in seconds. Zero or negative is legal and fires
    /// `on_finish` on the first scheduling turn with no prior tick.
    pub duration: f64,

    /// Cadence at which the monotonic clock is sampled.
    #[builder(default = DEFAULT_FRAME_INTERVAL)]
    pub frame_interval: Duration,

    /// Per-frame elapsed-time callback.
    #[builder(default, setter(strip_option))]
    pub on_tick: Option<TickFn>,

    /// Completion callback, invoked exactly once.
    #[builder(default, setter(strip_option))]
    pub on_finish: Option<FinishFn>,
}

/// Cancellation token for a running clock.
///
/// Dropping the handle does *not* cancel the clock; call [`cancel`] to stop
/// it. After `cancel()` returns, no further `on_tick`/`on_finish` callback
/// fires, including one already queued for the next frame. Cancellation is
/// idempotent.
///
/// The handle is deliberately `!Send`: the clock is part of a cooperative
/// single-threaded scheduler and all callbacks fire on the local task set.
///
/// [`cancel`]: ClockHandle::cancel
pub struct ClockHandle {
    cancelled: Rc<Cell<bool>>,
    finished: Rc<Cell<bool>>,
}

impl ClockHandle {
    /// Stop the clock. No callback fires after this returns.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Whether `cancel()` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Whether the clock ran to natural completion (`on_finish` fired).
    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }
}

/// A cancellable, frame-driven scheduler turning wall-clock elapsed time
/// into periodic tick/finish notifications.
///
/// The clock never blocks or busy-waits: it only advances between yields of
/// the local task scheduler, so a caller may safely set up state after
/// `start()` returns — the first notification always happens on a
/// subsequent scheduling turn.
pub struct PlaybackClock;

impl PlaybackClock {
    /// Start a clock. Must be called from within a [`tokio::task::LocalSet`]
    /// running on a current-thread runtime.
    pub fn start(config: ClockConfig) -> ClockHandle {
        let ClockConfig {
            initial_elapsed,
            duration,
            frame_interval,
            mut on_tick,
            on_finish,
        } = config;

        let cancelled = Rc::new(Cell::new(false));
        let finished = Rc::new(Cell::new(false));
        let handle = ClockHandle {
            cancelled: Rc::clone(&cancelled),
            finished: Rc::clone(&finished),
        };

        tokio::task::spawn_local(async move {
            // `duration > 0.0` is false for zero, negative and NaN durations;
            // all of those finish immediately without a tick. The spawned
            // task body only runs after start() has returned, so even this
            // path never fires synchronously.
            if !(duration > 0.0) {
                if !cancelled.get() {
                    finished.set(true);
                    if let Some(finish) = on_finish {
                        finish();
                    }
                }
                return;
            }

            let started_at = Instant::now();
            let mut frames = interval_at(started_at + frame_interval, frame_interval);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                frames.tick().await;
                // Checked before any callback so a cancel issued from a
                // previous tick, or from outside, wins over a queued frame.
                if cancelled.get() {
                    return;
                }

                let elapsed = initial_elapsed + started_at.elapsed().as_secs_f64();
                if elapsed < duration {
                    if let Some(tick) = on_tick.as_mut() {
                        tick(elapsed);
                    }
                } else {
                    if let Some(tick) = on_tick.as_mut() {
                        tick(duration);
                    }
                    // The clamped tick may itself cancel the clock; finish
                    // must not fire in that case.
                    if cancelled.get() {
                        return;
                    }
                    finished.set(true);
                    if let Some(finish) = on_finish {
                        finish();
                    }
                    return;
                }
            }
        });

        handle
    }
}
