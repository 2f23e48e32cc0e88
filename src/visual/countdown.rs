// ABOUTME: Countdown display state synchronized to audio playback
// ABOUTME: Renders ceil(duration - elapsed), clamped to zero on finish

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::clock::{ClockConfig, ClockHandle, PlaybackClock, DEFAULT_FRAME_INTERVAL};

/// Observer of countdown frames.
pub type CountdownFrameFn = Box<dyn FnMut(CountdownState) + 'static>;

/// Lifecycle of the countdown, a pure function of its clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStatus {
    /// The clock is ticking.
    Running,
    /// The clock has not started or was cancelled.
    Paused,
    /// The clock finished; the display is pinned at zero.
    Finished,
}

/// Snapshot of the countdown, recomputed whole on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    /// Whole seconds remaining, `ceil(duration - elapsed)`, never negative.
    pub remaining: u64,
    /// Current lifecycle status.
    pub status: CountdownStatus,
}

/// Configuration for [`Countdown::new`].
#[derive(TypedBuilder)]
pub struct CountdownConfig {
    /// Section duration in seconds.
    pub duration: f64,
    /// Elapsed seconds already consumed when the countdown appears.
    #[builder(default = 0.0)]
    pub start_offset: f64,
    /// Whether the countdown starts running. While false, no tick fires.
    #[builder(default = true)]
    pub running: bool,
    /// Clock sampling cadence.
    #[builder(default = DEFAULT_FRAME_INTERVAL)]
    pub frame_interval: Duration,
    /// Per-frame observer.
    #[builder(default, setter(strip_option))]
    pub on_frame: Option<CountdownFrameFn>,
}

/// Seconds remaining to display at `elapsed` of `duration` seconds.
pub fn seconds_remaining(elapsed: f64, duration: f64) -> u64 {
    let remaining = (duration - elapsed).ceil();
    if remaining > 0.0 {
        remaining as u64
    } else {
        0
    }
}

/// A countdown display driven exclusively by an internally-owned
/// [`PlaybackClock`].
pub struct Countdown {
    duration: f64,
    frame_interval: Duration,
    state: Rc<Cell<CountdownState>>,
    elapsed: Rc<Cell<f64>>,
    on_frame: Rc<RefCell<Option<CountdownFrameFn>>>,
    clock: Option<ClockHandle>,
}

impl Countdown {
    /// Create a countdown and, if `running`, start its clock.
    ///
    /// A non-positive duration renders the finished state immediately, with
    /// no intermediate running frame and no clock started.
    pub fn new(config: CountdownConfig) -> Self {
        let CountdownConfig {
            duration,
            start_offset,
            running,
            frame_interval,
            on_frame,
        } = config;

        let finished = !(duration > 0.0);
        let initial = CountdownState {
            remaining: seconds_remaining(start_offset, duration),
            status: if finished {
                CountdownStatus::Finished
            } else {
                CountdownStatus::Paused
            },
        };
        let mut countdown = Self {
            duration,
            frame_interval,
            state: Rc::new(Cell::new(initial)),
            elapsed: Rc::new(Cell::new(start_offset)),
            on_frame: Rc::new(RefCell::new(on_frame)),
            clock: None,
        };

        if finished {
            countdown.emit(initial);
        } else if running {
            countdown.start_clock();
        }
        countdown
    }

    /// Current countdown state.
    pub fn state(&self) -> CountdownState {
        self.state.get()
    }

    /// Current lifecycle status.
    pub fn status(&self) -> CountdownStatus {
        self.state.get().status
    }

    /// Pause or resume. Pausing cancels the clock immediately; no tick
    /// fires afterwards. Resuming continues from the last elapsed position.
    pub fn set_running(&mut self, running: bool) {
        if running {
            if self.clock.is_none() && self.status() != CountdownStatus::Finished {
                self.start_clock();
            }
        } else if let Some(clock) = self.clock.take() {
            clock.cancel();
            // A finished clock already rendered the terminal state; pausing
            // only releases the handle.
            if clock.is_finished() {
                return;
            }
            let paused = CountdownState {
                remaining: seconds_remaining(self.elapsed.get(), self.duration),
                status: CountdownStatus::Paused,
            };
            self.state.set(paused);
            self.emit(paused);
        }
    }

    fn start_clock(&mut self) {
        let duration = self.duration;

        let tick_state = Rc::clone(&self.state);
        let tick_elapsed = Rc::clone(&self.elapsed);
        let tick_frame = Rc::clone(&self.on_frame);

        let finish_state = Rc::clone(&self.state);
        let finish_frame = Rc::clone(&self.on_frame);

        let handle = PlaybackClock::start(ClockConfig {
            initial_elapsed: self.elapsed.get(),
            duration,
            frame_interval: self.frame_interval,
            on_tick: Some(Box::new(move |elapsed| {
                tick_elapsed.set(elapsed);
                let state = CountdownState {
                    remaining: seconds_remaining(elapsed, duration),
                    status: CountdownStatus::Running,
                };
                tick_state.set(state);
                if let Some(observer) = tick_frame.borrow_mut().as_mut() {
                    observer(state);
                }
            })),
            on_finish: Some(Box::new(move || {
                let state = CountdownState {
                    remaining: 0,
                    status: CountdownStatus::Finished,
                };
                finish_state.set(state);
                if let Some(observer) = finish_frame.borrow_mut().as_mut() {
                    observer(state);
                }
            })),
        });

        // The first tick lands on a later scheduling turn; report Running
        // from the moment the clock is started.
        let state = CountdownState {
            remaining: seconds_remaining(self.elapsed.get(), duration),
            status: CountdownStatus::Running,
        };
        self.state.set(state);
        self.clock = Some(handle);
    }

    fn emit(&mut self, state: CountdownState) {
        if let Some(observer) = self.on_frame.borrow_mut().as_mut() {
            observer(state);
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.cancel();
        }
    }
}
