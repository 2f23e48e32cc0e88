// ABOUTME: Progress ring state synchronized to audio playback
// ABOUTME: Computes a deterministic fill fraction from clock ticks

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::clock::{ClockConfig, ClockHandle, PlaybackClock, DEFAULT_FRAME_INTERVAL};

/// Forward bias added to the fill fraction while running, in seconds.
///
/// Compensates for the rendering delay of the visual transition itself so
/// the ring does not visibly lag the audio. An empirical smoothing value,
/// tunable rather than a semantic contract.
pub const RING_LEAD_BIAS_SECS: f64 = 0.1;

/// Observer of ring frames.
pub type RingFrameFn = Box<dyn FnMut(RingState) + 'static>;

/// Snapshot of the ring, recomputed whole on every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingState {
    /// Fill fraction in 0.0–1.0.
    pub fill: f64,
    /// Whether the underlying clock has finished.
    pub finished: bool,
}

/// Configuration for [`ProgressRing::new`].
#[derive(TypedBuilder)]
pub struct RingConfig {
    /// Section duration in seconds.
    pub duration: f64,
    /// Elapsed seconds already consumed when the ring appears.
    #[builder(default = 0.0)]
    pub start_offset: f64,
    /// Whether the ring starts running. While false, no tick ever fires.
    #[builder(default = true)]
    pub running: bool,
    /// Clock sampling cadence.
    #[builder(default = DEFAULT_FRAME_INTERVAL)]
    pub frame_interval: Duration,
    /// Per-frame observer.
    #[builder(default, setter(strip_option))]
    pub on_frame: Option<RingFrameFn>,
}

/// Fill fraction for a ring at `elapsed` of `duration` seconds.
///
/// The lead bias applies only while running, so a paused ring shows the
/// exact progress.
pub fn ring_fill(elapsed: f64, duration: f64, running: bool) -> f64 {
    if !(duration > 0.0) {
        return 1.0;
    }
    let bias = if running { RING_LEAD_BIAS_SECS } else { 0.0 };
    ((elapsed + bias) / duration).clamp(0.0, 1.0)
}

/// A progress ring driven exclusively by an internally-owned
/// [`PlaybackClock`]. Pure presentation state; owns no audio.
pub struct ProgressRing {
    duration: f64,
    frame_interval: Duration,
    state: Rc<Cell<RingState>>,
    elapsed: Rc<Cell<f64>>,
    on_frame: Rc<RefCell<Option<RingFrameFn>>>,
    clock: Option<ClockHandle>,
}

impl ProgressRing {
    /// Create a ring and, if `running`, start its clock.
    ///
    /// A non-positive duration renders the finished state immediately, with
    /// no intermediate running frame and no clock started.
    pub fn new(config: RingConfig) -> Self {
        let RingConfig {
            duration,
            start_offset,
            running,
            frame_interval,
            on_frame,
        } = config;

        let finished = !(duration > 0.0);
        let initial = RingState {
            fill: ring_fill(start_offset, duration, false),
            finished,
        };
        let mut ring = Self {
            duration,
            frame_interval,
            state: Rc::new(Cell::new(initial)),
            elapsed: Rc::new(Cell::new(start_offset)),
            on_frame: Rc::new(RefCell::new(on_frame)),
            clock: None,
        };

        if finished {
            ring.emit(initial);
        } else if running {
            ring.start_clock();
        }
        ring
    }

    /// Current ring state.
    pub fn state(&self) -> RingState {
        self.state.get()
    }

    /// Pause or resume the ring. Pausing cancels the clock immediately; no
    /// tick fires afterwards. Resuming continues from the last elapsed
    /// position.
    pub fn set_running(&mut self, running: bool) {
        if running {
            if self.clock.is_none() && !self.state.get().finished {
                self.start_clock();
            }
        } else if let Some(clock) = self.clock.take() {
            clock.cancel();
            // A finished clock already rendered the terminal state; pausing
            // only releases the handle.
            if clock.is_finished() {
                return;
            }
            let paused = RingState {
                fill: ring_fill(self.elapsed.get(), self.duration, false),
                finished: false,
            };
            self.state.set(paused);
            self.emit(paused);
        }
    }

    /// Whether the clock is currently running.
    pub fn is_running(&self) -> bool {
        self.clock
            .as_ref()
            .is_some_and(|c| !c.is_cancelled() && !c.is_finished())
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
                let state = RingState {
                    fill: ring_fill(elapsed, duration, true),
                    finished: false,
                };
                tick_state.set(state);
                if let Some(observer) = tick_frame.borrow_mut().as_mut() {
                    observer(state);
                }
            })),
            on_finish: Some(Box::new(move || {
                let state = RingState {
                    fill: 1.0,
                    finished: true,
                };
                finish_state.set(state);
                if let Some(observer) = finish_frame.borrow_mut().as_mut() {
                    observer(state);
                }
            })),
        });
        self.clock = Some(handle);
    }

    fn emit(&mut self, state: RingState) {
        if let Some(observer) = self.on_frame.borrow_mut().as_mut() {
            observer(state);
        }
    }
}

impl Drop for ProgressRing {
    fn drop(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_applies_bias_only_while_running() {
        let running = ring_fill(1.0, 10.0, true);
        let paused = ring_fill(1.0, 10.0, false);
        assert!((running - (1.0 + RING_LEAD_BIAS_SECS) / 10.0).abs() < 1e-12);
        assert!((paused - 0.1).abs() < 1e-12);
    }

    #[test]
    fn fill_clamps_to_one() {
        assert_eq!(ring_fill(10.0, 10.0, true), 1.0);
        assert_eq!(ring_fill(12.0, 10.0, false), 1.0);
    }

    #[test]
    fn zero_duration_is_full() {
        assert_eq!(ring_fill(0.0, 0.0, true), 1.0);
        assert_eq!(ring_fill(0.0, -1.0, false), 1.0);
    }
}
