//! Time labels and progress arithmetic for the controls.

/// Formats seconds as `MM:SS`.
///
/// The minutes field is not wrapped into hours, so long media reads
/// `75:00` rather than `01:15:00`. Non-finite and negative input reads
/// `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return String::from("00:00");
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{minutes:02}:{secs:02}")
}

/// Fraction of the timeline to fill, `0.0` while the duration is unknown.
pub fn progress(current: f64, duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        current / duration
    } else {
        0.0
    }
}

/// Maps a pointer position on the track to a media time.
///
/// Pointer positions outside the track map outside `0..=duration`; the
/// value is not clamped.
pub fn seek_target(pointer_x: f64, track_left: f64, track_width: f64, duration: f64) -> f64 {
    (pointer_x - track_left) / track_width * duration
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(65.0), "01:05");
        assert_eq!(format_time(125.0), "02:05");
        assert_eq!(format_time(59.99), "00:59");
    }

    #[test]
    fn formats_zero() {
        assert_eq!(format_time(0.0), "00:00");
    }

    #[test]
    fn non_finite_is_zero() {
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(f64::INFINITY), "00:00");
        assert_eq!(format_time(f64::NEG_INFINITY), "00:00");
    }

    #[test]
    fn minutes_grow_past_an_hour() {
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(6005.0), "100:05");
    }

    #[test]
    fn progress_fraction() {
        assert_eq!(progress(30.0, 125.0), 0.24);
        assert_eq!(progress(10.0, 0.0), 0.0);
        assert_eq!(progress(10.0, f64::NAN), 0.0);
    }

    #[test]
    fn seek_target_is_proportional() {
        assert_eq!(seek_target(150.0, 100.0, 200.0, 120.0), 30.0);
        assert_eq!(seek_target(100.0, 100.0, 200.0, 120.0), 0.0);
        assert_eq!(seek_target(300.0, 100.0, 200.0, 120.0), 120.0);
    }

    #[test]
    fn seek_target_is_unclamped() {
        assert_eq!(seek_target(50.0, 100.0, 200.0, 120.0), -30.0);
    }
}
