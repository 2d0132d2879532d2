//! In-memory media primitive for tests and headless use.
//!
//! [`FakeMedia`] behaves like a browser media element: it clamps positions
//! to the known duration, flips `paused` as soon as playback is requested and
//! leaves the play request pending until [`FakeMedia::resolve_play`] or
//! [`FakeMedia::reject_play`] settles it.

use crate::listener::Listeners;
use crate::media::{Media, MediaEvent, PlayFuture};
use crate::PlayRejected;
use futures::channel::oneshot;
use futures::FutureExt;
use std::collections::VecDeque;

const ABORTED_BY_PAUSE: &str = "aborted by pause";

/// A call made on the media, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    Play,
    Pause,
    SetMuted(bool),
    SetVolume(f64),
    SetRate(f64),
    /// The value as given, before clamping.
    SetCurrentTime(f64),
}

pub struct FakeMedia {
    current_time: f64,
    duration: f64,
    volume: f64,
    rate: f64,
    paused: bool,
    muted: bool,
    listeners: Listeners,
    pending: VecDeque<oneshot::Sender<Result<(), PlayRejected>>>,
    calls: Vec<Call>,
}

impl Default for FakeMedia {
    fn default() -> Self {
        FakeMedia {
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            rate: 1.0,
            paused: true,
            muted: false,
            listeners: Listeners::new(),
            pending: VecDeque::new(),
            calls: Vec::new(),
        }
    }
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Number of play requests still waiting to settle.
    pub fn pending_plays(&self) -> usize {
        self.pending.len()
    }

    /// Makes the duration known and emits `MetadataReady`.
    pub fn load_metadata(&mut self, duration: f64) {
        self.duration = duration;
        self.listeners.emit(MediaEvent::MetadataReady { duration });
    }

    /// Moves the playhead as playback would and emits `TimeProgress`.
    pub fn advance_to(&mut self, seconds: f64) {
        self.current_time = seconds;
        self.listeners.emit(MediaEvent::TimeProgress {
            current_time: seconds,
        });
    }

    /// Settles the oldest pending play request successfully.
    ///
    /// Returns `false` if nothing was pending.
    pub fn resolve_play(&mut self) -> bool {
        self.settle(Ok(()))
    }

    /// Rejects the oldest pending play request; the media falls back to paused.
    pub fn reject_play(&mut self, reason: &str) -> bool {
        self.paused = true;
        self.settle(Err(PlayRejected(reason.to_owned())))
    }

    fn settle(&mut self, result: Result<(), PlayRejected>) -> bool {
        match self.pending.pop_front() {
            // a dropped receiver means nobody awaits the result anymore
            Some(sender) => {
                let _ = sender.send(result);
                true
            }
            None => false,
        }
    }

    fn clamp_time(&self, seconds: f64) -> f64 {
        let upper = if self.duration > 0.0 {
            self.duration
        } else {
            f64::INFINITY
        };
        seconds.clamp(0.0, upper)
    }
}

impl Media for FakeMedia {
    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.calls.push(Call::SetCurrentTime(seconds));
        self.current_time = self.clamp_time(seconds);
        self.listeners.emit(MediaEvent::TimeProgress {
            current_time: self.current_time,
        });
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.calls.push(Call::SetVolume(volume));
        self.volume = volume;
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.calls.push(Call::SetRate(rate));
        self.rate = rate;
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.calls.push(Call::SetMuted(muted));
        self.muted = muted;
    }

    fn play(&mut self) -> PlayFuture {
        self.calls.push(Call::Play);
        self.paused = false;

        let (sender, receiver) = oneshot::channel();
        self.pending.push_back(sender);
        receiver
            .map(|settled| {
                settled.unwrap_or_else(|_| Err(PlayRejected(String::from("media dropped"))))
            })
            .boxed()
    }

    /// Pausing aborts every play request still in flight.
    fn pause(&mut self) {
        self.calls.push(Call::Pause);
        self.paused = true;
        while self.settle(Err(PlayRejected(String::from(ABORTED_BY_PAUSE)))) {}
    }

    fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}
