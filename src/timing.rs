//! Skip/close timing policy.
//!
//! Computes the delay after which the close control becomes available, from
//! the media duration, the rewarded-ad rules and the VAST skipoffset
//! attribute. Evaluated once, as soon as the engine reports the duration.

use std::time::Duration;

use crate::config::VideoAdConfig;

/// Close delay applied to videos of at least [`SHORT_VIDEO_CUTOFF`] length.
pub const DEFAULT_CLOSE_DELAY: Duration = Duration::from_secs(5);

/// Videos shorter than this stay unskippable for their full length.
pub const SHORT_VIDEO_CUTOFF: Duration = Duration::from_secs(16);

/// Compute the delay after which the close control becomes available.
pub fn close_button_delay(
    video_duration: Duration,
    config: &VideoAdConfig,
    has_companion: bool,
) -> Duration {
    let countdown = config.countdown_duration();

    // Rewarded videos are never independently skippable; the skipoffset
    // attribute does not apply to them.
    if config.rewarded {
        return if has_companion {
            countdown
        } else {
            countdown.min(video_duration)
        };
    }

    let mut delay = if video_duration < SHORT_VIDEO_CUTOFF {
        video_duration
    } else {
        DEFAULT_CLOSE_DELAY
    };

    if let Some(raw) = config.skip_offset.as_deref() {
        match parse_skip_offset(raw, video_duration) {
            Some(offset) => delay = offset,
            None => log::warn!(
                "failed to parse skipoffset {:?}, keeping {}ms close delay",
                raw,
                delay.as_millis()
            ),
        }
    }

    delay
}

/// Parse a VAST skipoffset attribute: `HH:MM:SS`, `HH:MM:SS.mmm`, `<n>%` of
/// the duration, or bare milliseconds.
fn parse_skip_offset(raw: &str, duration: Duration) -> Option<Duration> {
    let raw = raw.trim();
    if let Some(percent) = raw.strip_suffix('%') {
        let value: f64 = percent.trim().parse().ok()?;
        if !(0.0..=100.0).contains(&value) {
            return None;
        }
        let ms = duration.as_millis() as f64 * value / 100.0;
        return Some(Duration::from_millis(ms.round() as u64));
    }
    if raw.contains(':') {
        return parse_clock_offset(raw);
    }
    raw.parse::<u64>().ok().map(Duration::from_millis)
}

fn parse_clock_offset(raw: &str) -> Option<Duration> {
    let mut parts = raw.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds = parts.next()?;
    if parts.next().is_some() || minutes >= 60 {
        return None;
    }

    let (whole, millis) = match seconds.split_once('.') {
        Some((whole, frac)) => {
            if frac.is_empty() || frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // ".5" means 500ms, ".05" means 50ms.
            let scale = 10u64.pow((3 - frac.len()) as u32);
            let frac: u64 = frac.parse().ok()?;
            (whole, frac * scale)
        }
        None => (seconds, 0),
    };
    let seconds: u64 = whole.parse().ok()?;
    if seconds >= 60 {
        return None;
    }

    Some(Duration::from_millis(
        (hours * 3600 + minutes * 60 + seconds) * 1000 + millis,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn short_video_stays_unskippable_for_its_full_length() {
        let cfg = config::test_config();
        assert_eq!(close_button_delay(ms(9_000), &cfg, false), ms(9_000));
    }

    #[test]
    fn long_video_defaults_to_five_seconds() {
        let cfg = config::test_config();
        assert_eq!(close_button_delay(ms(20_000), &cfg, false), ms(5_000));
    }

    #[test]
    fn percentage_offset_overrides_the_default() {
        let mut cfg = config::test_config();
        cfg.skip_offset = Some("50%".to_string());
        assert_eq!(close_button_delay(ms(10_000), &cfg, false), ms(5_000));
    }

    #[test]
    fn clock_offset_overrides_the_default() {
        let mut cfg = config::test_config();
        cfg.skip_offset = Some("00:00:07".to_string());
        assert_eq!(close_button_delay(ms(20_000), &cfg, false), ms(7_000));
    }

    #[test]
    fn clock_offset_with_millis() {
        let mut cfg = config::test_config();
        cfg.skip_offset = Some("00:00:07.250".to_string());
        assert_eq!(close_button_delay(ms(20_000), &cfg, false), ms(7_250));
    }

    #[test]
    fn bare_milliseconds_offset() {
        let mut cfg = config::test_config();
        cfg.skip_offset = Some("4500".to_string());
        assert_eq!(close_button_delay(ms(20_000), &cfg, false), ms(4_500));
    }

    #[test]
    fn unparseable_offset_falls_back_to_the_default() {
        let mut cfg = config::test_config();
        cfg.skip_offset = Some("soon".to_string());
        assert_eq!(close_button_delay(ms(20_000), &cfg, false), ms(5_000));

        cfg.skip_offset = Some("00:99:00".to_string());
        assert_eq!(close_button_delay(ms(20_000), &cfg, false), ms(5_000));

        cfg.skip_offset = Some("150%".to_string());
        assert_eq!(close_button_delay(ms(9_000), &cfg, false), ms(9_000));
    }

    #[test]
    fn rewarded_with_companion_uses_the_countdown_duration() {
        let mut cfg = config::test_config();
        cfg.rewarded = true;
        cfg.countdown_duration_ms = 30_000;
        assert_eq!(close_button_delay(ms(5_000), &cfg, true), ms(30_000));
        assert_eq!(close_button_delay(ms(120_000), &cfg, true), ms(30_000));
    }

    #[test]
    fn rewarded_without_companion_caps_at_the_video_duration() {
        let mut cfg = config::test_config();
        cfg.rewarded = true;
        cfg.countdown_duration_ms = 30_000;
        assert_eq!(close_button_delay(ms(3_000), &cfg, false), ms(3_000));
        assert_eq!(close_button_delay(ms(45_000), &cfg, false), ms(30_000));
    }

    #[test]
    fn rewarded_ignores_the_skipoffset_attribute() {
        let mut cfg = config::test_config();
        cfg.rewarded = true;
        cfg.countdown_duration_ms = 30_000;
        cfg.skip_offset = Some("25%".to_string());
        assert_eq!(close_button_delay(ms(40_000), &cfg, false), ms(30_000));
    }
}
