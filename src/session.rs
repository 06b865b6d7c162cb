use std::time::Duration;

use crate::timing;

/// Lifecycle states of the playback engine integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Prepared,
    Playing,
    Paused,
    /// Resuming towards a saved position; exits to [`Playing`](Self::Playing)
    /// when the engine signals seek completion.
    Seeking,
    Completed,
    Error,
}

/// Mutable per-ad-view state, confined to the update thread.
#[derive(Debug)]
pub struct PlaybackSession {
    pub state: PlaybackState,
    /// Position snapshot taken on pause, or restored from saved state.
    pub resume_position: Option<Duration>,
    pub last_seek_target: Option<Duration>,
    /// Delay before the close control becomes available.
    pub close_delay: Duration,
    pub calibration_done: bool,
    pub complete: bool,
    pub video_error: bool,
    /// Set when leaving for an external click-through after completion, so
    /// the browser return finishes the ad view.
    pub closing: bool,
    pub allow_close: bool,
    pub pollers_running: bool,
    pub destroyed: bool,
}

impl PlaybackSession {
    pub fn new(resume_position: Option<Duration>) -> Self {
        PlaybackSession {
            state: PlaybackState::Idle,
            resume_position,
            last_seek_target: None,
            close_delay: timing::DEFAULT_CLOSE_DELAY,
            calibration_done: false,
            complete: false,
            video_error: false,
            closing: false,
            allow_close: false,
            pollers_running: false,
            destroyed: false,
        }
    }
}
