//! Widget-layer seam.
//!
//! The view hierarchy and widget rendering live in the host; the controller
//! drives them through this narrow interface and never waits on it. Every
//! call is a plain visibility/content toggle the host applies on its own
//! render pass.

use std::time::Duration;

use url::Url;

use crate::config::{CompanionAdConfig, IconConfig};

pub trait PlayerSurface {
    fn update_cta_text(&mut self, text: &str);
    fn update_close_button_text(&mut self, text: &str);
    fn update_close_button_icon(&mut self, url: &str);

    fn set_video_visible(&mut self, visible: bool);

    /// Size the progress bar to the media duration and show it.
    fn calibrate_progress(&mut self, duration: Duration, close_delay: Duration);
    fn update_progress(&mut self, position: Duration);
    fn set_progress_visible(&mut self, visible: bool);

    /// Size the countdown widget to the close delay and show it.
    fn calibrate_countdown(&mut self, close_delay: Duration);
    fn update_countdown(&mut self, close_delay: Duration, position: Duration);

    /// Swap the countdown widget for the close button. Never reversed before
    /// teardown.
    fn show_close_control(&mut self);

    /// The CTA button may react to taps from now on.
    fn notify_video_skippable(&mut self);

    /// Playback finished; overlay widgets restyle for the companion phase.
    fn notify_video_complete(&mut self);

    fn create_icon(&mut self, icon: &IconConfig);
    fn set_icon_visible(&mut self, visible: bool);

    /// Present the post-roll companion creative.
    fn show_companion(&mut self, companion: &CompanionAdConfig);

    /// Launch the external browser for a click-through. The host reports the
    /// return through `on_activity_result` with the same request code.
    fn open_clickthrough(&mut self, url: &Url, request_code: i32);
}
