//! Full-screen VAST video ad controller.
//!
//! Owns the playback lifecycle state machine. Engine callbacks, poller ticks
//! and user actions all funnel through [`VastVideoController::update`] as
//! [`Message`]s drained on a single thread, together with the host lifecycle
//! hooks. All session mutation stays on that thread, so none of it is locked.

use std::sync::mpsc::Sender;
use std::time::Duration;

use url::Url;

use crate::clock::PlaybackClock;
use crate::config::{CompanionAdConfig, SavedState, VideoAdConfig};
use crate::engine::{EngineEvent, MediaEngine, PlayerState, SeekMode};
use crate::error::{AdError, Result, VastErrorCode};
use crate::message::Message;
use crate::overlay::{self, IconOverlay};
use crate::poller::Poller;
use crate::session::{PlaybackSession, PlaybackState};
use crate::surface::PlayerSurface;
use crate::timing;
use crate::tracking::{TrackingDispatcher, TrackingTransport};
use crate::viewability::ViewabilitySession;

/// Fast tick: progress bar, progress trackers, icon overlay.
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Slow tick: countdown widget, close-control gating.
const COUNTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Request code the surface hands to the external browser so
/// [`VastVideoController::on_activity_result`] can recognize the return.
pub const CLICKTHROUGH_REQUEST_CODE: i32 = 871;

/// Host-implemented upstream notifications.
pub trait AdEventListener {
    /// Companion creatives resolved; fired once the media duration is known.
    fn companion_ads_ready(&mut self, companions: &[CompanionAdConfig], duration: Duration);
    /// The ad view should finish.
    fn video_finished(&mut self, position: Duration);
}

pub struct VastVideoController {
    config: VideoAdConfig,
    session: PlaybackSession,
    tracking: TrackingDispatcher,
    icon: IconOverlay,
    companions: Vec<CompanionAdConfig>,
    has_declared_companion: bool,
    engine: Box<dyn MediaEngine>,
    surface: Box<dyn PlayerSurface>,
    listener: Box<dyn AdEventListener>,
    progress_poller: Poller,
    countdown_poller: Poller,
}

impl VastVideoController {
    /// Build the controller for one ad view and start media preparation.
    ///
    /// `saved` takes precedence over `config_json` so a restored view resumes
    /// with the exact configuration and position it was torn down with.
    /// Configuration problems are fatal here; nothing else is.
    pub fn new(
        config_json: Option<&str>,
        saved: Option<SavedState>,
        engine: Box<dyn MediaEngine>,
        surface: Box<dyn PlayerSurface>,
        listener: Box<dyn AdEventListener>,
        transport: Box<dyn TrackingTransport>,
        viewability: Box<dyn ViewabilitySession>,
        tx: Sender<Message>,
    ) -> Result<Self> {
        let (config, resume_position) = match saved {
            Some(saved) => {
                let position = saved.position();
                (saved.config, position)
            }
            None => {
                let serialized = config_json.ok_or(AdError::MissingConfig)?;
                (VideoAdConfig::from_json(serialized)?, None)
            }
        };

        let has_declared_companion = !config.companion_ads.is_empty();
        let companions = overlay::companion_ads(&config);
        let tracking = TrackingDispatcher::new(&config, transport, viewability);
        let icon = IconOverlay::new(config.icon.clone());
        let session = PlaybackSession::new(resume_position);

        let progress_poller = Poller::new(
            "ad-progress-poll",
            PROGRESS_POLL_INTERVAL,
            Message::ProgressTick,
            tx.clone(),
        );
        let countdown_poller = Poller::new(
            "ad-countdown-poll",
            COUNTDOWN_POLL_INTERVAL,
            Message::CountdownTick,
            tx,
        );

        let mut controller = VastVideoController {
            config,
            session,
            tracking,
            icon,
            companions,
            has_declared_companion,
            engine,
            surface,
            listener,
            progress_poller,
            countdown_poller,
        };

        if let Some(text) = controller.config.custom_cta_text.as_deref() {
            controller.surface.update_cta_text(text);
        }
        if let Some(text) = controller.config.custom_skip_text.as_deref() {
            controller.surface.update_close_button_text(text);
        }
        if let Some(url) = controller.config.custom_close_icon_url.as_deref() {
            controller.surface.update_close_button_icon(url);
        }
        if !controller.config.rewarded {
            // The CTA is tappable from the first frame on non-rewarded ads.
            controller.surface.notify_video_skippable();
        }

        log::info!(
            "vast controller created: rewarded={}, companions={}, icon={}, resume={:?}",
            controller.config.rewarded,
            controller.companions.len(),
            controller.icon.config().is_some(),
            controller.session.resume_position,
        );

        controller.engine.prepare(&controller.config.disk_media_path);

        Ok(controller)
    }

    /// Handle one input on the update thread.
    pub fn update(&mut self, message: Message) {
        match message {
            Message::Engine(event) => self.handle_engine_event(event),
            Message::ProgressTick => {
                if self.session.pollers_running {
                    self.progress_tick();
                }
            }
            Message::CountdownTick => {
                if self.session.pollers_running {
                    self.countdown_tick(false);
                }
            }
            Message::CloseTapped => self.handle_close_tapped(),
            Message::ClickThrough => self.handle_click_through(),
            Message::IconClicked => self.handle_icon_clicked(),
            Message::IconRenderLost => self.handle_icon_render_lost(),
        }
    }

    /// Fire the impression tracking for this ad view.
    pub fn on_create(&mut self) {
        let position = self.position();
        self.tracking.impression(position);
    }

    pub fn on_resume(&mut self) {
        self.tracking.ensure_viewability_started();
        self.start_pollers();

        let resume_position = self.session.resume_position;
        match resume_position {
            Some(position) if position > Duration::ZERO => {
                self.session.last_seek_target = Some(position);
                self.session.state = PlaybackState::Seeking;
                self.engine.seek_to(position, SeekMode::Closest);
            }
            _ => {
                if !self.session.complete {
                    self.engine.play();
                }
            }
        }

        if let Some(position) = resume_position {
            if !self.session.complete {
                self.tracking.resume(position);
            }
        }
    }

    pub fn on_pause(&mut self) {
        self.stop_pollers();
        self.session.resume_position = self.engine.current_position();
        self.engine.pause();

        // The engine may grab playback back after a transient audio focus
        // loss even though play/pause are managed manually here.
        if let Err(e) = self.engine.release_audio_focus() {
            log::warn!("unable to release engine audio focus: {}", e);
        }

        if !self.session.complete {
            let position = self.session.resume_position.unwrap_or(Duration::ZERO);
            self.tracking.pause(position);
        }
        if matches!(
            self.session.state,
            PlaybackState::Playing | PlaybackState::Seeking
        ) {
            self.session.state = PlaybackState::Paused;
        }
    }

    /// Stop all timers and end the viewability session. Safe to call more
    /// than once.
    pub fn on_destroy(&mut self) {
        self.stop_pollers();
        if !self.session.destroyed {
            self.session.destroyed = true;
            self.tracking.end_viewability();
        }
    }

    pub fn on_save_instance_state(&self) -> SavedState {
        SavedState {
            position_ms: self
                .session
                .resume_position
                .map(|p| p.as_millis() as i64)
                .unwrap_or(-1),
            config: self.config.clone(),
        }
    }

    /// Orientation changes keep the current layout.
    pub fn on_configuration_changed(&mut self) {}

    pub fn on_back_pressed(&mut self) {
        self.handle_exit_trackers();
    }

    /// The device back control is honored only once the close control is
    /// available.
    pub fn back_button_enabled(&self) -> bool {
        self.session.allow_close
    }

    /// Return from the external click-through browser. Finishes the ad view
    /// when the click happened after completion.
    pub fn on_activity_result(&mut self, request_code: i32, result_ok: bool) {
        if self.session.closing && request_code == CLICKTHROUGH_REQUEST_CODE && result_ok {
            let position = self.position();
            self.listener.video_finished(position);
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn config(&self) -> &VideoAdConfig {
        &self.config
    }

    pub fn companions(&self) -> &[CompanionAdConfig] {
        &self.companions
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Prepared { duration } => self.handle_prepared(duration),
            EngineEvent::StateChanged(state) => self.handle_player_state(state),
            EngineEvent::PlaybackCompleted => self.handle_playback_completed(),
            EngineEvent::SeekCompleted { position } => self.handle_seek_completed(position),
        }
    }

    /// Media source became ready: calibrate timing and widgets. Entered at
    /// most once per controller instance.
    fn handle_prepared(&mut self, duration: Duration) {
        if self.session.calibration_done {
            log::warn!("duplicate prepared callback ignored");
            return;
        }

        self.session.close_delay =
            timing::close_button_delay(duration, &self.config, self.has_declared_companion);
        self.listener.companion_ads_ready(&self.companions, duration);

        self.surface
            .calibrate_progress(duration, self.session.close_delay);
        self.surface.calibrate_countdown(self.session.close_delay);
        let position = self.position();
        self.surface
            .update_countdown(self.session.close_delay, position);

        self.session.calibration_done = true;
        if self.session.state == PlaybackState::Idle {
            self.session.state = PlaybackState::Prepared;
        }
        log::info!(
            "media prepared: duration={}ms, close delay={}ms",
            duration.as_millis(),
            self.session.close_delay.as_millis()
        );
    }

    fn handle_player_state(&mut self, state: PlayerState) {
        let position = self.position();
        match state {
            PlayerState::Playing => {
                self.tracking.player_playing(position);
                if !self.session.complete && !self.session.video_error {
                    self.session.state = PlaybackState::Playing;
                }
            }
            PlayerState::Paused => {
                self.tracking.player_paused(position);
                if self.session.state == PlaybackState::Playing {
                    self.session.state = PlaybackState::Paused;
                }
            }
            PlayerState::Error => self.handle_player_error(position),
            PlayerState::Idle => {
                log::debug!("player state changed to {:?}", state);
            }
        }
    }

    /// Engine playback errors are terminal for this ad view: the close
    /// control opens immediately and the user has to dismiss the ad.
    fn handle_player_error(&mut self, position: Duration) {
        if self.session.video_error || self.session.complete {
            log::debug!("player error after terminal state ignored");
            return;
        }
        log::error!("player error at {}ms", position.as_millis());

        self.stop_pollers();
        self.countdown_tick(true);
        self.session.video_error = true;
        self.session.state = PlaybackState::Error;
        self.tracking
            .error(VastErrorCode::GeneralLinearAdError, position);
    }

    fn handle_playback_completed(&mut self) {
        self.stop_pollers();
        self.countdown_tick(false);
        self.session.complete = true;
        if !self.session.video_error {
            self.session.state = PlaybackState::Completed;
        }

        if !self.session.video_error && self.tracking.remaining_progress_trackers() == 0 {
            let position = self.position();
            self.tracking.complete(position);
        }

        self.surface.set_video_visible(false);
        self.surface.set_progress_visible(false);
        if self.icon.created() {
            self.surface.set_icon_visible(false);
        }
        self.surface.notify_video_complete();

        if let Some(companion) = overlay::select_companion(&self.companions) {
            self.surface.show_companion(companion);
        }
        log::info!("playback completed");
    }

    fn handle_seek_completed(&mut self, position: Duration) {
        log::debug!("seek completed at {}ms", position.as_millis());
        self.session.last_seek_target = None;
        self.engine.play();
    }

    fn progress_tick(&mut self) {
        let Some(position) = self.engine.current_position() else {
            return;
        };
        self.surface.update_progress(position);
        if let Some(duration) = self.engine.duration() {
            self.tracking.poll_progress(position, duration);
        }
        self.icon
            .poll(position, &mut *self.surface, &mut self.tracking);
    }

    fn countdown_tick(&mut self, force_closeable: bool) {
        let position = self.position();
        if self.session.calibration_done {
            self.surface
                .update_countdown(self.session.close_delay, position);
        }

        if (force_closeable || position >= self.session.close_delay) && !self.session.allow_close {
            self.session.allow_close = true;
            self.surface.show_close_control();
            // The CTA turns tappable for rewarded ads too once skippable.
            self.surface.notify_video_skippable();
        }
    }

    fn handle_close_tapped(&mut self) {
        self.session.closing = self.session.complete;
        self.handle_exit_trackers();
        let position = self.position();
        self.listener.video_finished(position);
    }

    fn handle_click_through(&mut self) {
        let Some(raw) = self.config.clickthrough_url.as_deref() else {
            return;
        };
        if raw.is_empty() {
            return;
        }
        // Rewarded ads only become clickable once the close control is up.
        if self.config.rewarded && !self.session.allow_close {
            return;
        }

        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("invalid click-through url {:?}: {}", raw, e);
                return;
            }
        };

        let now = self.position();
        let position = if self.session.complete {
            self.engine.duration().unwrap_or(now)
        } else {
            now
        };
        self.tracking.click(position);
        self.session.closing = self.session.complete;
        self.surface
            .open_clickthrough(&url, CLICKTHROUGH_REQUEST_CODE);
    }

    fn handle_icon_clicked(&mut self) {
        if !self.icon.created() {
            return;
        }
        let Some(icon) = self.icon.config() else {
            return;
        };
        let position = self.position();
        self.tracking
            .icon_click(&icon.click_tracking_urls, position);
    }

    fn handle_icon_render_lost(&mut self) {
        log::warn!("icon content renderer went away, ignoring the icon");
        let position = self.position();
        self.tracking.error(VastErrorCode::Undefined, position);
    }

    /// Skip-or-complete plus close tracking for every way out of the ad.
    fn handle_exit_trackers(&mut self) {
        let position = self.position();
        let duration = self.engine.duration();
        let reached_end = self.session.complete
            || duration
                .map(|d| d > Duration::ZERO && position >= d)
                .unwrap_or(false);

        if reached_end {
            self.tracking.complete(duration.unwrap_or(position));
        } else {
            self.tracking.skip(position);
        }
        self.tracking.close(duration.unwrap_or(position));
    }

    fn start_pollers(&mut self) {
        self.session.pollers_running = true;
        self.progress_poller.start();
        self.countdown_poller.start();
    }

    fn stop_pollers(&mut self) {
        self.session.pollers_running = false;
        self.progress_poller.stop();
        self.countdown_poller.stop();
    }

    fn position(&self) -> Duration {
        self.engine.current_position().unwrap_or(Duration::ZERO)
    }
}
