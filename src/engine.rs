//! Media engine seam.
//!
//! The hardware player runs on its own threads and reports back through
//! asynchronous callbacks. Engine adapters translate those callbacks into
//! [`EngineEvent`]s and send them through the controller's channel so that
//! every state mutation happens on the update thread.

use std::time::Duration;

use crate::clock::PlaybackClock;

/// Player states reported through [`EngineEvent::StateChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
    Paused,
    Error,
}

/// Seek precision hints, mirroring the modes hardware players expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// Land on the frame closest to the target, decoding if necessary.
    Closest,
    /// Land on the nearest preceding sync frame.
    PreviousSync,
}

/// Asynchronous notifications from the media engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The media source is ready; position and duration are readable now.
    Prepared { duration: Duration },
    StateChanged(PlayerState),
    PlaybackCompleted,
    SeekCompleted { position: Duration },
}

/// Narrow control interface over the hardware media player.
pub trait MediaEngine: PlaybackClock {
    /// Load the media source and start asynchronous preparation. The engine
    /// reports [`EngineEvent::Prepared`] once ready.
    fn prepare(&mut self, media_path: &str);

    fn play(&mut self);

    fn pause(&mut self);

    fn seek_to(&mut self, position: Duration, mode: SeekMode);

    /// Close the engine's internal audio-focus handler.
    ///
    /// Some platform players resume by themselves after a transient audio
    /// loss even though play/pause are managed manually here; closing the
    /// focus handler on pause keeps the pause authoritative. Failures are
    /// reported back so the caller can log and continue.
    fn release_audio_focus(&mut self) -> Result<(), String> {
        Ok(())
    }
}
