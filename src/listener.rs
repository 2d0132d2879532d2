//! Observer registration for media events.
//!
//! Subscribing hands back a [`Guard`]; the listener stays registered for as
//! long as the guard lives and is removed when it drops, unwinding included.

use crate::media::{EventKind, MediaEvent};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback = Box<dyn FnMut(&MediaEvent)>;

struct Entry {
    id: u64,
    kind: EventKind,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Listener registry owned by a media primitive.
///
/// Callbacks run synchronously from [`Listeners::emit`] and must not
/// subscribe or drop guards of the same registry while running.
#[derive(Clone, Default)]
pub struct Listeners(Rc<RefCell<Registry>>);

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for events of `kind`.
    #[must_use = "the listener is removed as soon as the guard drops"]
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> Guard
    where
        F: FnMut(&MediaEvent) + 'static,
    {
        let mut registry = self.0.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            kind,
            callback: Box::new(callback),
        });

        Guard {
            id,
            registry: Rc::downgrade(&self.0),
        }
    }

    /// Delivers `event` to every listener registered for its kind.
    pub fn emit(&self, event: MediaEvent) {
        let kind = event.kind();
        let mut registry = self.0.borrow_mut();
        for entry in registry.entries.iter_mut().filter(|e| e.kind == kind) {
            (entry.callback)(&event);
        }
    }

    /// Number of live listeners.
    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps one listener registered.
pub struct Guard {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for Guard {
    fn drop(&mut self) {
        // registry already gone with its media
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let Ok(mut registry) = registry.try_borrow_mut() else {
            log::warn!("listener {} dropped during emit; left registered", self.id);
            return;
        };
        registry.entries.retain(|e| e.id != self.id);
    }
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn emit_reaches_matching_listeners_only() {
        let listeners = Listeners::new();
        let seen = Rc::new(Cell::new(0.0));
        let other = Rc::new(Cell::new(false));

        let _time = {
            let seen = Rc::clone(&seen);
            listeners.subscribe(EventKind::TimeProgress, move |event| {
                if let MediaEvent::TimeProgress { current_time } = *event {
                    seen.set(current_time);
                }
            })
        };
        let _meta = {
            let other = Rc::clone(&other);
            listeners.subscribe(EventKind::MetadataReady, move |_| other.set(true))
        };

        listeners.emit(MediaEvent::TimeProgress { current_time: 12.5 });
        assert_eq!(seen.get(), 12.5);
        assert!(!other.get());
    }

    #[test]
    fn dropping_guard_deregisters() {
        let listeners = Listeners::new();
        let hits = Rc::new(Cell::new(0));

        let guard = {
            let hits = Rc::clone(&hits);
            listeners.subscribe(EventKind::TimeProgress, move |_| hits.set(hits.get() + 1))
        };
        assert_eq!(listeners.len(), 1);

        listeners.emit(MediaEvent::TimeProgress { current_time: 1.0 });
        drop(guard);
        listeners.emit(MediaEvent::TimeProgress { current_time: 2.0 });

        assert_eq!(hits.get(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn guard_outliving_registry_is_harmless() {
        let listeners = Listeners::new();
        let guard = listeners.subscribe(EventKind::MetadataReady, |_| {});
        drop(listeners);
        drop(guard);
    }

    #[test]
    fn guard_released_on_unwind() {
        let listeners = Listeners::new();
        let registry = listeners.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = registry.subscribe(EventKind::TimeProgress, |_| {});
            panic!("unmount failed");
        }));

        assert!(result.is_err());
        assert!(listeners.is_empty());
    }
}
