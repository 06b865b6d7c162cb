//! Full-screen VAST video ad playback core.
//!
//! Renders and tracks a VAST video ad through narrow host interfaces: a
//! media engine, a widget surface, a fire-and-forget tracking transport and
//! a viewability vendor session. The controller serializes every input onto
//! one update thread and owns the playback lifecycle state machine, the
//! once-only tracking dispatch, the skip/close timing policy and the
//! icon/companion overlays.

pub mod clock;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod message;
pub mod overlay;
pub mod poller;
pub mod session;
pub mod surface;
pub mod timing;
pub mod tracking;
pub mod viewability;
