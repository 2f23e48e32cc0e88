// ABOUTME: Frame-driven scheduling for playback-synchronized notifications
// ABOUTME: PlaybackClock turns wall-clock elapsed time into tick/finish callbacks

/// Cancellable frame-driven playback clock
pub mod playback_clock;

pub use playback_clock::{
    ClockConfig, ClockHandle, FinishFn, PlaybackClock, TickFn, DEFAULT_FRAME_INTERVAL,
};
