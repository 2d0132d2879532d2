//! A video player widget for Iced with its own playback controls.
//!
//! [`Player`] wraps any [`Media`] implementation and renders a timeline,
//! transport buttons, a volume slider, a speed menu and toggles for
//! picture-in-picture and fullscreen. With the `gstreamer` feature enabled,
//! [`Video`] provides a `playbin`-backed media primitive.

pub mod config;
pub mod exclusive;
pub mod listener;
pub mod media;
mod player;
pub mod state;
mod sync;
pub mod testing;
pub mod time;
mod timeline;
#[cfg(feature = "gstreamer")]
mod video;

#[cfg(feature = "gstreamer")]
use gstreamer as gst;
use thiserror::Error;

pub use config::Settings;
pub use exclusive::{Exclusive, HolderId, Slot};
pub use media::{Media, MediaEvent, PlayFuture};
pub use player::{Message, PendingPlay, PlayTicket, Player};
pub use state::{PlaybackRate, PlaybackState, Volume};
pub use timeline::{SeekRequest, Timeline};
#[cfg(feature = "gstreamer")]
pub use video::Video;

/// The only failure a play request can settle with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("playback start rejected: {0}")]
pub struct PlayRejected(pub String);

#[derive(Debug, Error)]
pub enum Error {
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    Glib(#[from] glib::Error),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    Bool(#[from] glib::BoolError),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    StateChange(#[from] gst::StateChangeError),
    #[error("failed to get the gstreamer bus")]
    Bus,
    #[error("failed to cast gstreamer element")]
    Cast,
    #[error("invalid URI")]
    Uri,
    #[error("failed to lock internal sync primitive")]
    Lock,
    #[error("no holder to release")]
    NotHeld,
}
