//! The playback object the controls drive.

use crate::listener::Listeners;
use crate::PlayRejected;
use futures::future::BoxFuture;
use iced::widget::image;

/// Settles once the media has actually started playing, or refused to.
pub type PlayFuture = BoxFuture<'static, Result<(), PlayRejected>>;

/// Lifecycle events a media primitive emits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    /// The playback position moved.
    TimeProgress { current_time: f64 },
    /// Duration (and dimensions) became known.
    MetadataReady { duration: f64 },
}

impl MediaEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MediaEvent::TimeProgress { .. } => EventKind::TimeProgress,
            MediaEvent::MetadataReady { .. } => EventKind::MetadataReady,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TimeProgress,
    MetadataReady,
}

/// An audiovisual playback object.
///
/// All times are in seconds. Implementations are expected to clamp
/// positions they cannot represent; callers pass values through unchecked.
pub trait Media {
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Zero until metadata has loaded.
    fn duration(&self) -> f64;

    fn volume(&self) -> f64;

    fn set_volume(&mut self, volume: f64);

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&mut self, rate: f64);

    fn paused(&self) -> bool;

    fn muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    /// Requests playback. `paused()` reports `false` as soon as this is
    /// called; the returned future reports whether playback really began.
    fn play(&mut self) -> PlayFuture;

    fn pause(&mut self);

    /// Registry through which [`MediaEvent`]s are delivered.
    fn listeners(&self) -> &Listeners;

    /// Gives the media a chance to emit pending events.
    fn poll(&mut self) {}

    /// The most recent video frame, if there is one to show.
    fn frame(&self) -> Option<image::Handle> {
        None
    }
}
