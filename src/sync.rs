use crate::listener::Guard;
use crate::media::{EventKind, Media, MediaEvent};
use crate::state::{PlaybackRate, PlaybackState};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Keeps the mirrored [`PlaybackState`] in step with media events.
///
/// Both subscriptions are released when the mirror drops.
pub(crate) struct Mirror {
    _time: Guard,
    _metadata: Guard,
}

impl Mirror {
    /// Pushes the mirrored volume to `media`, adopts its rate when that is a
    /// menu entry and starts listening.
    pub(crate) fn mount<M: Media + ?Sized>(
        media: &mut M,
        state: &Rc<RefCell<PlaybackState>>,
    ) -> Self {
        let volume = state.borrow().volume;
        media.set_volume(volume.value());
        if let Some(rate) = PlaybackRate::from_value(media.playback_rate()) {
            state.borrow_mut().rate = rate;
        }

        let time = on_event(media, EventKind::TimeProgress, state, |state, event| {
            if let MediaEvent::TimeProgress { current_time } = event {
                state.current_time = current_time;
            }
        });
        let metadata = on_event(media, EventKind::MetadataReady, state, |state, event| {
            if let MediaEvent::MetadataReady { duration } = event {
                state.duration = duration;
            }
        });

        Mirror {
            _time: time,
            _metadata: metadata,
        }
    }
}

fn on_event<M, F>(
    media: &M,
    kind: EventKind,
    state: &Rc<RefCell<PlaybackState>>,
    apply: F,
) -> Guard
where
    M: Media + ?Sized,
    F: Fn(&mut PlaybackState, MediaEvent) + 'static,
{
    let state: Weak<RefCell<PlaybackState>> = Rc::downgrade(state);
    media.listeners().subscribe(kind, move |event| {
        if let Some(state) = state.upgrade() {
            apply(&mut state.borrow_mut(), *event);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMedia;

    #[test]
    fn mount_pushes_volume() {
        let mut media = FakeMedia::new();
        let state = Rc::new(RefCell::new(PlaybackState::default()));
        let _mirror = Mirror::mount(&mut media, &state);
        assert_eq!(media.volume(), 0.5);
    }

    #[test]
    fn mount_adopts_menu_rate() {
        let mut media = FakeMedia::new();
        media.set_playback_rate(1.5);
        let state = Rc::new(RefCell::new(PlaybackState::default()));
        let _mirror = Mirror::mount(&mut media, &state);
        assert_eq!(state.borrow().rate, PlaybackRate::OneAndHalf);
    }

    #[test]
    fn mount_keeps_rate_outside_menu() {
        let mut media = FakeMedia::new();
        media.set_playback_rate(1.25);
        let state = Rc::new(RefCell::new(PlaybackState::default()));
        let _mirror = Mirror::mount(&mut media, &state);
        assert_eq!(state.borrow().rate, PlaybackRate::Normal);
    }

    #[test]
    fn events_update_mirror() {
        let mut media = FakeMedia::new();
        let state = Rc::new(RefCell::new(PlaybackState::default()));
        let _mirror = Mirror::mount(&mut media, &state);

        media.load_metadata(125.0);
        assert_eq!(state.borrow().duration, 125.0);

        media.advance_to(30.0);
        assert_eq!(state.borrow().current_time, 30.0);
    }

    #[test]
    fn dropping_mirror_detaches_listeners() {
        let mut media = FakeMedia::new();
        let state = Rc::new(RefCell::new(PlaybackState::default()));
        let mirror = Mirror::mount(&mut media, &state);
        assert_eq!(media.listeners().len(), 2);

        drop(mirror);
        assert!(media.listeners().is_empty());

        media.advance_to(10.0);
        assert_eq!(state.borrow().current_time, 0.0);
    }
}
