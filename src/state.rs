//! UI-side mirror of the media's playback properties.

use crate::config::DEFAULT_VOLUME;
use std::fmt;

/// Volume level, always within `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Volume(f64);

impl Volume {
    /// Creates a volume level, clamping to the valid range.
    ///
    /// NaN is treated as silence.
    #[must_use]
    pub fn new(volume: f64) -> Self {
        if volume.is_nan() {
            return Volume(0.0);
        }
        Volume(volume.clamp(0.0, 1.0))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether the level renders as muted.
    #[must_use]
    pub fn is_silent(self) -> bool {
        self.0 == 0.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Volume(DEFAULT_VOLUME)
    }
}

/// The fixed set of selectable playback speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackRate {
    Half,
    ThreeQuarters,
    #[default]
    Normal,
    OneAndHalf,
    Double,
}

impl PlaybackRate {
    /// All rates in the order the speed menu lists them.
    pub const ALL: [PlaybackRate; 5] = [
        PlaybackRate::Double,
        PlaybackRate::OneAndHalf,
        PlaybackRate::Normal,
        PlaybackRate::ThreeQuarters,
        PlaybackRate::Half,
    ];

    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            PlaybackRate::Half => 0.5,
            PlaybackRate::ThreeQuarters => 0.75,
            PlaybackRate::Normal => 1.0,
            PlaybackRate::OneAndHalf => 1.5,
            PlaybackRate::Double => 2.0,
        }
    }

    /// Maps a raw rate back to a menu entry, if it is one.
    #[must_use]
    pub fn from_value(rate: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| (r.value() - rate).abs() < f64::EPSILON)
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackRate::Normal => write!(f, "Normal"),
            rate => write!(f, "{}x", rate.value()),
        }
    }
}

/// Everything the controls render from.
///
/// This is a best-effort copy: the media stays the source of truth for
/// position and rate, and the mirror catches up on the next event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Seconds.
    pub current_time: f64,
    /// Seconds; zero until metadata has loaded.
    pub duration: f64,
    pub volume: Volume,
    pub rate: PlaybackRate,
    pub speed_menu_open: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState {
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: Volume::default(),
            rate: PlaybackRate::default(),
            speed_menu_open: false,
        }
    }
}

impl PlaybackState {
    /// Whether the duration is usable for seeking and progress.
    pub fn duration_known(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_on_mount() {
        let state = PlaybackState::default();
        assert!(!state.is_playing);
        assert!(!state.speed_menu_open);
        assert_eq!(state.volume.value(), 0.5);
        assert_eq!(state.rate, PlaybackRate::Normal);
        assert_eq!(state.current_time, 0.0);
        assert!(!state.duration_known());
    }

    #[test]
    fn volume_clamps() {
        assert_eq!(Volume::new(1.5).value(), 1.0);
        assert_eq!(Volume::new(-0.2).value(), 0.0);
        assert_eq!(Volume::new(f64::NAN).value(), 0.0);
        assert_eq!(Volume::new(0.3).value(), 0.3);
    }

    #[test]
    fn zero_volume_is_silent() {
        assert!(Volume::new(0.0).is_silent());
        assert!(!Volume::new(0.01).is_silent());
    }

    #[test]
    fn menu_order_is_fastest_first() {
        let values: Vec<f64> = PlaybackRate::ALL.iter().map(|r| r.value()).collect();
        assert_eq!(values, vec![2.0, 1.5, 1.0, 0.75, 0.5]);
    }

    #[test]
    fn labels() {
        assert_eq!(PlaybackRate::Normal.to_string(), "Normal");
        assert_eq!(PlaybackRate::Double.to_string(), "2x");
        assert_eq!(PlaybackRate::OneAndHalf.to_string(), "1.5x");
        assert_eq!(PlaybackRate::ThreeQuarters.to_string(), "0.75x");
        assert_eq!(PlaybackRate::Half.to_string(), "0.5x");
    }

    #[test]
    fn from_value_only_accepts_menu_rates() {
        assert_eq!(PlaybackRate::from_value(0.75), Some(PlaybackRate::ThreeQuarters));
        assert_eq!(PlaybackRate::from_value(1.25), None);
    }

    #[test]
    fn non_finite_duration_is_unknown() {
        let state = PlaybackState {
            duration: f64::INFINITY,
            ..PlaybackState::default()
        };
        assert!(!state.duration_known());
    }
}
