//! Third-party viewability measurement seam.
//!
//! The vendor SDK integration lives in the host; the core forwards playback
//! events through this interface and never waits on it.

use std::time::Duration;

/// Playback events forwarded to the measurement vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEvent {
    Started,
    FirstQuartile,
    Midpoint,
    ThirdQuartile,
    Paused,
    Resumed,
    Skipped,
    ClickThru,
    Complete,
    Error,
}

/// One measurement session per ad view.
pub trait ViewabilitySession {
    fn start(&mut self);
    fn end(&mut self);
    fn is_tracking(&self) -> bool;
    fn track_impression(&mut self);
    fn has_impression_occurred(&self) -> bool;
    fn record_event(&mut self, kind: VideoEvent, position: Duration);
}

/// Session used when no viewability vendors are configured.
#[derive(Debug, Default)]
pub struct NullViewabilitySession {
    tracking: bool,
    impressed: bool,
}

impl ViewabilitySession for NullViewabilitySession {
    fn start(&mut self) {
        self.tracking = true;
    }

    fn end(&mut self) {
        self.tracking = false;
    }

    fn is_tracking(&self) -> bool {
        self.tracking
    }

    fn track_impression(&mut self) {
        self.impressed = true;
    }

    fn has_impression_occurred(&self) -> bool {
        self.impressed
    }

    fn record_event(&mut self, _kind: VideoEvent, _position: Duration) {}
}
