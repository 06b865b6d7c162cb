//! Ad configuration model and save/restore persistence.
//!
//! The configuration is produced upstream by the VAST XML parsing layer and
//! handed over as a JSON string; it is immutable after load. The same
//! descriptor is snapshotted into [`SavedState`] so a torn-down ad view can
//! be rebuilt exactly where it left off.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AdError, Result};
use crate::tracking::TrackingEvent;

/// Rewarded countdown used when the ad payload does not specify one.
pub const DEFAULT_COUNTDOWN_DURATION_MS: u64 = 30_000;

/// Kinds of creative resources the widget layer can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    StaticImage,
    Html,
    /// Synthesized stand-in rendered from the video's last frame.
    BlurredLastFrame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VastResource {
    pub resource: String,
    pub kind: ResourceKind,
    /// Pixel size; `None` fills the host surface.
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Industry-icon overlay declaration. At most one per ad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconConfig {
    pub offset_ms: u64,
    /// How long the icon stays up; `None` keeps it until completion.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    pub resource: VastResource,
    #[serde(default)]
    pub clickthrough_url: Option<String>,
    #[serde(default)]
    pub click_tracking_urls: Vec<String>,
    #[serde(default)]
    pub impression_urls: Vec<String>,
}

/// Static creative shown after the video completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionAdConfig {
    pub resource: VastResource,
    #[serde(default)]
    pub clickthrough_url: Option<String>,
    #[serde(default)]
    pub click_tracking_urls: Vec<String>,
    #[serde(default)]
    pub creative_view_urls: Vec<String>,
    #[serde(default)]
    pub custom_cta_text: Option<String>,
}

/// Measurement vendor declared in the VAST extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewabilityVendor {
    pub vendor_key: String,
    pub javascript_resource_url: String,
    #[serde(default)]
    pub verification_parameters: Option<String>,
}

/// Immutable-after-load descriptor of one video ad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAdConfig {
    pub disk_media_path: String,
    #[serde(default)]
    pub clickthrough_url: Option<String>,
    /// Raw VAST skipoffset attribute; parsed lazily by the timing policy.
    #[serde(default)]
    pub skip_offset: Option<String>,
    #[serde(default = "default_countdown_ms")]
    pub countdown_duration_ms: u64,
    #[serde(default)]
    pub rewarded: bool,
    #[serde(default)]
    pub tracking_urls: HashMap<TrackingEvent, Vec<String>>,
    #[serde(default)]
    pub companion_ads: Vec<CompanionAdConfig>,
    #[serde(default)]
    pub icon: Option<IconConfig>,
    #[serde(default)]
    pub viewability_vendors: Vec<ViewabilityVendor>,
    #[serde(default)]
    pub custom_cta_text: Option<String>,
    #[serde(default)]
    pub custom_skip_text: Option<String>,
    #[serde(default)]
    pub custom_close_icon_url: Option<String>,
}

fn default_countdown_ms() -> u64 {
    DEFAULT_COUNTDOWN_DURATION_MS
}

impl VideoAdConfig {
    /// Parse the serialized configuration handed over by the ad response
    /// decoding layer.
    pub fn from_json(serialized: &str) -> Result<Self> {
        let config: VideoAdConfig = serde_json::from_str(serialized)?;
        if config.disk_media_path.is_empty() {
            return Err(AdError::MissingMediaFile);
        }
        Ok(config)
    }

    pub fn urls_for(&self, event: TrackingEvent) -> &[String] {
        self.tracking_urls
            .get(&event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn countdown_duration(&self) -> Duration {
        Duration::from_millis(self.countdown_duration_ms)
    }
}

/// State persisted across host teardown and restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    /// Last known playback position in milliseconds, -1 when unset.
    pub position_ms: i64,
    pub config: VideoAdConfig,
}

impl SavedState {
    pub fn from_json(serialized: &str) -> Result<Self> {
        Ok(serde_json::from_str(serialized)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn position(&self) -> Option<Duration> {
        if self.position_ms < 0 {
            None
        } else {
            Some(Duration::from_millis(self.position_ms as u64))
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> VideoAdConfig {
    VideoAdConfig {
        disk_media_path: "/data/ads/creative.mp4".to_string(),
        clickthrough_url: None,
        skip_offset: None,
        countdown_duration_ms: DEFAULT_COUNTDOWN_DURATION_MS,
        rewarded: false,
        tracking_urls: HashMap::new(),
        companion_ads: Vec::new(),
        icon: None,
        viewability_vendors: Vec::new(),
        custom_cta_text: None,
        custom_skip_text: None,
        custom_close_icon_url: None,
    }
}
