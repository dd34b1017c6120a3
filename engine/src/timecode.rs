//! Human-readable play-head positions.

use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

/// Elapsed time at `fraction` of `length`.
///
/// The fraction is clamped into `[0, 1]`; a non-finite fraction maps to zero.
pub fn elapsed(fraction: f64, length: Duration) -> Duration {
    if !fraction.is_finite() {
        return Duration::ZERO;
    }
    length.mul_f64(fraction.clamp(0.0, 1.0))
}

/// Format `position` as `mm:ss`, or `hh:mm:ss` when `total` is an hour or
/// longer, so every timecode for one piece of media has the same width.
pub fn format_timecode(position: Duration, total: Duration) -> String {
    let secs = position.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if total >= HOUR {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{:02}:{seconds:02}", secs / 60)
    }
}

/// Format the elapsed time at `fraction` of `length`.
pub fn format_elapsed(fraction: f64, length: Duration) -> String {
    format_timecode(elapsed(fraction, length), length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_media_uses_minutes() {
        let length = Duration::from_secs(20 * 60);
        assert_eq!(format_elapsed(0.0, length), "00:00");
        assert_eq!(format_elapsed(0.5, length), "10:00");
        assert_eq!(format_elapsed(1.0, length), "20:00");
        assert_eq!(format_timecode(Duration::from_secs(62), length), "01:02");
    }

    #[test]
    fn long_media_uses_hours() {
        let length = Duration::from_secs(2 * 3600);
        assert_eq!(format_elapsed(0.0, length), "00:00:00");
        assert_eq!(format_elapsed(0.75, length), "01:30:00");
        assert_eq!(format_timecode(Duration::from_secs(3725), length), "01:02:05");
    }

    #[test]
    fn out_of_range_fractions_clamp() {
        let length = Duration::from_secs(100);
        assert_eq!(elapsed(1.5, length), length);
        assert_eq!(elapsed(-1.0, length), Duration::ZERO);
        assert_eq!(elapsed(f64::NAN, length), Duration::ZERO);
    }

    #[test]
    fn unknown_length_is_zero() {
        assert_eq!(format_elapsed(0.5, Duration::ZERO), "00:00");
    }
}
