//! VAST tracking dispatch.
//!
//! Maps playback-position crossings and lifecycle transitions to tracking
//! URL batches and viewability-session events. Dispatch is gated on a set of
//! already-fired event identifiers, so each tracking-event URL set fires at
//! most once per ad-view lifecycle no matter how often the pollers cross the
//! same threshold or how engine callbacks race the polling path.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::VideoAdConfig;
use crate::error::VastErrorCode;
use crate::viewability::{VideoEvent, ViewabilitySession};

/// Semantic tracking events keyed in the ad configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingEvent {
    Impression,
    Start,
    FirstQuartile,
    Midpoint,
    ThirdQuartile,
    Complete,
    Skip,
    Close,
    ClickThrough,
    Pause,
    Resume,
    Error,
    IconImpression,
    IconClick,
}

/// Extra request context forwarded to the transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackingContext<'a> {
    /// Local media asset the trackers describe, for `[ASSETURI]` macros.
    pub asset: Option<&'a str>,
    /// Set on error dispatches, for `[ERRORCODE]` macros.
    pub error_code: Option<VastErrorCode>,
}

/// Fire-and-forget HTTP tracking transport. Implementations must not block
/// the calling thread; there is no completion signal and no backpressure.
pub trait TrackingTransport {
    fn send(&mut self, urls: &[String], position: Duration, ctx: TrackingContext<'_>);
}

#[derive(Debug, Clone, Copy)]
enum ProgressOffset {
    Millis(u64),
    Fraction(f64),
}

#[derive(Debug, Clone, Copy)]
struct ProgressTracker {
    event: TrackingEvent,
    offset: ProgressOffset,
}

impl ProgressTracker {
    fn threshold(&self, duration: Duration) -> Duration {
        match self.offset {
            ProgressOffset::Millis(ms) => Duration::from_millis(ms),
            ProgressOffset::Fraction(fraction) => {
                Duration::from_millis((duration.as_millis() as f64 * fraction).round() as u64)
            }
        }
    }
}

/// Once-only tracking dispatcher for a single ad view.
pub struct TrackingDispatcher {
    urls: HashMap<TrackingEvent, Vec<String>>,
    asset: String,
    fired: HashSet<TrackingEvent>,
    progress: Vec<ProgressTracker>,
    transport: Box<dyn TrackingTransport>,
    viewability: Box<dyn ViewabilitySession>,
}

impl TrackingDispatcher {
    pub fn new(
        config: &VideoAdConfig,
        transport: Box<dyn TrackingTransport>,
        viewability: Box<dyn ViewabilitySession>,
    ) -> Self {
        let progress = vec![
            ProgressTracker {
                event: TrackingEvent::Start,
                offset: ProgressOffset::Millis(0),
            },
            ProgressTracker {
                event: TrackingEvent::FirstQuartile,
                offset: ProgressOffset::Fraction(0.25),
            },
            ProgressTracker {
                event: TrackingEvent::Midpoint,
                offset: ProgressOffset::Fraction(0.5),
            },
            ProgressTracker {
                event: TrackingEvent::ThirdQuartile,
                offset: ProgressOffset::Fraction(0.75),
            },
        ];
        TrackingDispatcher {
            urls: config.tracking_urls.clone(),
            asset: config.disk_media_path.clone(),
            fired: HashSet::new(),
            progress,
            transport,
            viewability,
        }
    }

    /// Send the URL batch for `event` unless it has fired before.
    fn fire(&mut self, event: TrackingEvent, position: Duration, error_code: Option<VastErrorCode>) -> bool {
        if !self.fired.insert(event) {
            return false;
        }
        log::debug!("tracking {:?} at {}ms", event, position.as_millis());
        if let Some(urls) = self.urls.get(&event) {
            if !urls.is_empty() {
                let ctx = TrackingContext {
                    asset: Some(self.asset.as_str()),
                    error_code,
                };
                self.transport.send(urls, position, ctx);
            }
        }
        true
    }

    /// Like [`fire`](Self::fire) for URL sets that live outside the main
    /// tracking map (icon sub-config).
    fn fire_external(&mut self, event: TrackingEvent, urls: &[String], position: Duration) {
        if !self.fired.insert(event) {
            return;
        }
        log::debug!("tracking {:?} at {}ms", event, position.as_millis());
        if !urls.is_empty() {
            let ctx = TrackingContext {
                asset: Some(self.asset.as_str()),
                error_code: None,
            };
            self.transport.send(urls, position, ctx);
        }
    }

    pub fn has_fired(&self, event: TrackingEvent) -> bool {
        self.fired.contains(&event)
    }

    pub fn impression(&mut self, position: Duration) {
        self.fire(TrackingEvent::Impression, position, None);
    }

    /// Fire every scheduled progress tracker the position has crossed, then
    /// run the complete path once all trackers are exhausted and the position
    /// has reached the media duration. The fired-set keeps this exactly-once
    /// even when the engine's completion callback races the polling path.
    pub fn poll_progress(&mut self, position: Duration, duration: Duration) {
        let crossed: Vec<TrackingEvent> = self
            .progress
            .iter()
            .filter(|tracker| {
                !self.fired.contains(&tracker.event) && position >= tracker.threshold(duration)
            })
            .map(|tracker| tracker.event)
            .collect();

        for event in crossed {
            self.fire(event, position, None);
            if let Some(kind) = viewability_event_for(event) {
                self.viewability.record_event(kind, position);
            }
        }

        if self.remaining_progress_trackers() == 0
            && duration > Duration::ZERO
            && position >= duration
        {
            self.complete(duration);
        }
    }

    pub fn remaining_progress_trackers(&self) -> usize {
        self.progress
            .iter()
            .filter(|tracker| !self.fired.contains(&tracker.event))
            .count()
    }

    pub fn complete(&mut self, position: Duration) {
        if self.fired.contains(&TrackingEvent::Complete) {
            return;
        }
        self.viewability.record_event(VideoEvent::Complete, position);
        self.fire(TrackingEvent::Complete, position, None);
    }

    pub fn skip(&mut self, position: Duration) {
        self.viewability.record_event(VideoEvent::Skipped, position);
        self.fire(TrackingEvent::Skip, position, None);
    }

    pub fn close(&mut self, position: Duration) {
        self.fire(TrackingEvent::Close, position, None);
    }

    pub fn click(&mut self, position: Duration) {
        self.viewability.record_event(VideoEvent::ClickThru, position);
        self.fire(TrackingEvent::ClickThrough, position, None);
    }

    pub fn pause(&mut self, position: Duration) {
        self.fire(TrackingEvent::Pause, position, None);
    }

    pub fn resume(&mut self, position: Duration) {
        self.fire(TrackingEvent::Resume, position, None);
    }

    pub fn error(&mut self, code: VastErrorCode, position: Duration) {
        self.viewability.record_event(VideoEvent::Error, position);
        self.fire(TrackingEvent::Error, position, Some(code));
    }

    pub fn icon_impression(&mut self, urls: &[String], position: Duration) {
        self.fire_external(TrackingEvent::IconImpression, urls, position);
    }

    pub fn icon_click(&mut self, urls: &[String], position: Duration) {
        self.fire_external(TrackingEvent::IconClick, urls, position);
    }

    /// Viewability bookkeeping for an engine transition into playing: first
    /// time records the impression, later times record a resume.
    pub fn player_playing(&mut self, position: Duration) {
        if self.viewability.has_impression_occurred() {
            self.viewability.record_event(VideoEvent::Resumed, position);
        } else {
            self.viewability.track_impression();
        }
    }

    /// Viewability bookkeeping for an engine transition into paused; only
    /// meaningful once an impression has occurred.
    pub fn player_paused(&mut self, position: Duration) {
        if self.viewability.has_impression_occurred() {
            self.viewability.record_event(VideoEvent::Paused, position);
        }
    }

    pub fn ensure_viewability_started(&mut self) {
        if !self.viewability.is_tracking() {
            self.viewability.start();
        }
    }

    pub fn end_viewability(&mut self) {
        self.viewability.end();
    }
}

fn viewability_event_for(event: TrackingEvent) -> Option<VideoEvent> {
    match event {
        TrackingEvent::Start => Some(VideoEvent::Started),
        TrackingEvent::FirstQuartile => Some(VideoEvent::FirstQuartile),
        TrackingEvent::Midpoint => Some(VideoEvent::Midpoint),
        TrackingEvent::ThirdQuartile => Some(VideoEvent::ThirdQuartile),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config;

    #[derive(Debug, Clone)]
    struct SentBatch {
        urls: Vec<String>,
        error_code: Option<VastErrorCode>,
    }

    #[derive(Default)]
    struct RecordingTransport {
        sent: Rc<RefCell<Vec<SentBatch>>>,
    }

    impl TrackingTransport for RecordingTransport {
        fn send(&mut self, urls: &[String], _position: Duration, ctx: TrackingContext<'_>) {
            self.sent.borrow_mut().push(SentBatch {
                urls: urls.to_vec(),
                error_code: ctx.error_code,
            });
        }
    }

    #[derive(Default)]
    struct RecordingViewability {
        tracking: bool,
        impressed: bool,
        events: Rc<RefCell<Vec<VideoEvent>>>,
    }

    impl ViewabilitySession for RecordingViewability {
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

        fn record_event(&mut self, kind: VideoEvent, _position: Duration) {
            self.events.borrow_mut().push(kind);
        }
    }

    fn dispatcher_with_quartiles() -> (TrackingDispatcher, Rc<RefCell<Vec<SentBatch>>>, Rc<RefCell<Vec<VideoEvent>>>) {
        let mut cfg = config::test_config();
        for (event, url) in [
            (TrackingEvent::Start, "https://t.example/start"),
            (TrackingEvent::FirstQuartile, "https://t.example/q1"),
            (TrackingEvent::Midpoint, "https://t.example/mid"),
            (TrackingEvent::ThirdQuartile, "https://t.example/q3"),
            (TrackingEvent::Complete, "https://t.example/complete"),
            (TrackingEvent::Pause, "https://t.example/pause"),
            (TrackingEvent::Error, "https://t.example/error"),
        ] {
            cfg.tracking_urls.insert(event, vec![url.to_string()]);
        }

        let sent = Rc::new(RefCell::new(Vec::new()));
        let events = Rc::new(RefCell::new(Vec::new()));
        let transport = RecordingTransport { sent: sent.clone() };
        let viewability = RecordingViewability {
            events: events.clone(),
            ..RecordingViewability::default()
        };
        let dispatcher = TrackingDispatcher::new(&cfg, Box::new(transport), Box::new(viewability));
        (dispatcher, sent, events)
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn quartiles_fire_once_under_repeated_polls() {
        let (mut dispatcher, sent, events) = dispatcher_with_quartiles();
        let duration = ms(10_000);

        for _ in 0..5 {
            dispatcher.poll_progress(ms(5_100), duration);
        }

        let batches = sent.borrow();
        let urls: Vec<&str> = batches
            .iter()
            .flat_map(|b| b.urls.iter().map(String::as_str))
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://t.example/start",
                "https://t.example/q1",
                "https://t.example/mid",
            ]
        );
        assert_eq!(dispatcher.remaining_progress_trackers(), 1);
        assert_eq!(
            *events.borrow(),
            vec![
                VideoEvent::Started,
                VideoEvent::FirstQuartile,
                VideoEvent::Midpoint,
            ]
        );
    }

    #[test]
    fn complete_fires_once_when_poll_and_callback_race() {
        let (mut dispatcher, sent, events) = dispatcher_with_quartiles();
        let duration = ms(10_000);

        // Polling path exhausts the trackers and reaches the end first.
        dispatcher.poll_progress(ms(10_000), duration);
        // Engine completion callback lands afterwards.
        dispatcher.complete(duration);
        dispatcher.complete(duration);

        let complete_batches = sent
            .borrow()
            .iter()
            .filter(|b| b.urls[0].ends_with("/complete"))
            .count();
        assert_eq!(complete_batches, 1);
        let complete_events = events
            .borrow()
            .iter()
            .filter(|e| **e == VideoEvent::Complete)
            .count();
        assert_eq!(complete_events, 1);
    }

    #[test]
    fn complete_path_needs_exhausted_trackers_and_reached_end() {
        let (mut dispatcher, _sent, _events) = dispatcher_with_quartiles();
        let duration = ms(10_000);

        // Far enough for every tracker but short of the duration.
        dispatcher.poll_progress(ms(9_000), duration);
        assert_eq!(dispatcher.remaining_progress_trackers(), 0);
        assert!(!dispatcher.has_fired(TrackingEvent::Complete));

        dispatcher.poll_progress(ms(10_000), duration);
        assert!(dispatcher.has_fired(TrackingEvent::Complete));
    }

    #[test]
    fn pause_urls_fire_once_but_viewability_pause_repeats() {
        let (mut dispatcher, sent, events) = dispatcher_with_quartiles();

        dispatcher.player_playing(ms(0));
        dispatcher.pause(ms(1_000));
        dispatcher.player_paused(ms(1_000));
        dispatcher.pause(ms(2_000));
        dispatcher.player_paused(ms(2_000));

        let pause_batches = sent
            .borrow()
            .iter()
            .filter(|b| b.urls[0].ends_with("/pause"))
            .count();
        assert_eq!(pause_batches, 1);
        let pause_events = events
            .borrow()
            .iter()
            .filter(|e| **e == VideoEvent::Paused)
            .count();
        assert_eq!(pause_events, 2);
    }

    #[test]
    fn first_playing_transition_tracks_impression_not_resume() {
        let (mut dispatcher, _sent, events) = dispatcher_with_quartiles();

        dispatcher.player_playing(ms(0));
        assert!(events.borrow().is_empty());

        dispatcher.player_playing(ms(3_000));
        assert_eq!(*events.borrow(), vec![VideoEvent::Resumed]);
    }

    #[test]
    fn error_dispatch_carries_the_vast_code() {
        let (mut dispatcher, sent, events) = dispatcher_with_quartiles();

        dispatcher.error(VastErrorCode::GeneralLinearAdError, ms(4_000));
        dispatcher.error(VastErrorCode::GeneralLinearAdError, ms(4_100));

        let batches = sent.borrow();
        let error_batches: Vec<_> = batches
            .iter()
            .filter(|b| b.urls[0].ends_with("/error"))
            .collect();
        assert_eq!(error_batches.len(), 1);
        assert_eq!(
            error_batches[0].error_code,
            Some(VastErrorCode::GeneralLinearAdError)
        );
        assert_eq!(
            events
                .borrow()
                .iter()
                .filter(|e| **e == VideoEvent::Error)
                .count(),
            2
        );
    }

    #[test]
    fn icon_urls_fire_once_despite_per_poll_dispatch() {
        let (mut dispatcher, sent, _events) = dispatcher_with_quartiles();
        let urls = vec!["https://t.example/icon-imp".to_string()];

        for tick in 0..4 {
            dispatcher.icon_impression(&urls, ms(1_000 + tick * 50));
        }

        let icon_batches = sent
            .borrow()
            .iter()
            .filter(|b| b.urls[0].ends_with("/icon-imp"))
            .count();
        assert_eq!(icon_batches, 1);
    }
}
