use std::time::Duration;

/// Position and duration reads from the underlying media engine.
///
/// Both queries return `None` until the engine has signalled that the media
/// source is ready; callers must tolerate that during the pre-calibration
/// window instead of treating it as an error.
pub trait PlaybackClock {
    fn current_position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
}
