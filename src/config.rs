//! Player defaults and the settings builder.

use crate::Error;
use iced::Size;
use std::time::Duration;

/// The video loaded when no other source is given.
pub const DEFAULT_SOURCE: &str =
    "https://github.com/natodevelopers/minionsfilm/releases/download/minionsfilm/output.mp4";

/// Volume pushed to the media on mount.
pub const DEFAULT_VOLUME: f64 = 0.5;

/// Distance covered by the back/forward transport buttons, in seconds.
pub const SKIP_STEP_SECS: f64 = 5.0;

/// How often the media is polled for time progress.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Window size while playing in picture-in-picture.
pub const PIP_SIZE: Size = Size::new(480.0, 270.0);

/// Configuration applied when a [`Player`](crate::Player) is mounted.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub initial_volume: f64,
    pub skip_step: f64,
    pub tick_interval: Duration,
    pub pip_size: Size,
    pub source: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            initial_volume: DEFAULT_VOLUME,
            skip_step: SKIP_STEP_SECS,
            tick_interval: TICK_INTERVAL,
            pip_size: PIP_SIZE,
            source: DEFAULT_SOURCE.to_owned(),
        }
    }
}

impl Settings {
    /// Sets the volume the player starts with, clamped to `0.0..=1.0`.
    pub fn initial_volume(self, initial_volume: f64) -> Self {
        Settings {
            initial_volume: initial_volume.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Sets how many seconds the transport buttons skip.
    pub fn skip_step(self, skip_step: f64) -> Self {
        Settings { skip_step, ..self }
    }

    /// Sets how often time progress is polled from the media.
    pub fn tick_interval(self, tick_interval: Duration) -> Self {
        Settings {
            tick_interval,
            ..self
        }
    }

    /// Sets the window size used for picture-in-picture.
    pub fn pip_size(self, pip_size: Size) -> Self {
        Settings { pip_size, ..self }
    }

    /// Sets the media source.
    pub fn source(self, source: impl Into<String>) -> Self {
        Settings {
            source: source.into(),
            ..self
        }
    }

    /// The parsed media source.
    pub fn source_url(&self) -> Result<url::Url, Error> {
        url::Url::parse(&self.source).map_err(|_| Error::Uri)
    }
}
