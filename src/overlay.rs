//! Industry-icon overlay and companion-ad selection.

use std::time::Duration;

use crate::config::{CompanionAdConfig, IconConfig, ResourceKind, VastResource, VideoAdConfig};
use crate::surface::PlayerSurface;
use crate::tracking::{TrackingDispatcher, TrackingEvent};

/// Lazily materialized icon overlay.
///
/// The icon is intentionally not preloaded: the widget is created on the
/// first poll at or past the offset, shown once, hidden once the display
/// window has passed, and never re-shown or destroyed afterwards.
pub struct IconOverlay {
    config: Option<IconConfig>,
    created: bool,
    hidden: bool,
}

impl IconOverlay {
    pub fn new(config: Option<IconConfig>) -> Self {
        IconOverlay {
            config,
            created: false,
            hidden: false,
        }
    }

    pub fn config(&self) -> Option<&IconConfig> {
        self.config.as_ref()
    }

    pub fn created(&self) -> bool {
        self.created
    }

    /// Evaluate the overlay against the current playback position.
    pub fn poll(
        &mut self,
        position: Duration,
        surface: &mut dyn PlayerSurface,
        tracking: &mut TrackingDispatcher,
    ) {
        let Some(icon) = self.config.as_ref() else {
            return;
        };
        let offset = Duration::from_millis(icon.offset_ms);
        if position < offset {
            return;
        }

        if !self.created {
            log::debug!("materializing industry icon at {}ms", position.as_millis());
            surface.create_icon(icon);
            surface.set_icon_visible(true);
            self.created = true;
        }

        tracking.icon_impression(&icon.impression_urls, position);

        let Some(duration_ms) = icon.duration_ms else {
            return;
        };
        if !self.hidden && position >= offset + Duration::from_millis(duration_ms) {
            surface.set_icon_visible(false);
            self.hidden = true;
        }
    }
}

/// Companion set reported upstream once the duration is known: the declared
/// companions, or a synthesized full-screen pseudo-companion rendered from
/// the video's last frame when the ad declares none.
pub fn companion_ads(config: &VideoAdConfig) -> Vec<CompanionAdConfig> {
    if !config.companion_ads.is_empty() {
        return config.companion_ads.clone();
    }
    vec![CompanionAdConfig {
        resource: VastResource {
            resource: config.disk_media_path.clone(),
            kind: ResourceKind::BlurredLastFrame,
            width: None,
            height: None,
        },
        clickthrough_url: config.clickthrough_url.clone(),
        click_tracking_urls: config.urls_for(TrackingEvent::ClickThrough).to_vec(),
        creative_view_urls: Vec::new(),
        custom_cta_text: config.custom_cta_text.clone(),
    }]
}

/// Companion displayed at completion: first declared, else the synthesized
/// pseudo-companion.
pub fn select_companion(companions: &[CompanionAdConfig]) -> Option<&CompanionAdConfig> {
    companions.first()
}
