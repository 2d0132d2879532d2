//! Process-wide presentation modes that only one player can hold at a time.
//!
//! Picture-in-picture and fullscreen are singletons: at most one holder per
//! process. [`Exclusive`] is the capability a player uses to query, take and
//! give them back; [`Slot`] is the in-process implementation.

use crate::Error;
use std::sync::{Arc, Mutex, OnceLock};

/// Identifies whoever holds an exclusive mode.
pub type HolderId = u64;

pub trait Exclusive {
    /// Who currently holds the mode.
    fn holder(&self) -> Result<Option<HolderId>, Error>;

    /// Takes the mode for `holder`, replacing any previous holder.
    fn request(&self, holder: HolderId) -> Result<(), Error>;

    /// Gives the mode back. Fails with [`Error::NotHeld`] if nobody holds it.
    fn release(&self) -> Result<(), Error>;
}

/// A shareable single-holder slot.
///
/// Clones refer to the same slot.
#[derive(Debug, Clone, Default)]
pub struct Slot(Arc<Mutex<Option<HolderId>>>);

impl Slot {
    /// An isolated slot, not shared with the process-wide ones.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide picture-in-picture slot.
    pub fn picture_in_picture() -> Self {
        static SLOT: OnceLock<Slot> = OnceLock::new();
        SLOT.get_or_init(Slot::new).clone()
    }

    /// The process-wide fullscreen slot.
    pub fn fullscreen() -> Self {
        static SLOT: OnceLock<Slot> = OnceLock::new();
        SLOT.get_or_init(Slot::new).clone()
    }
}

impl Exclusive for Slot {
    fn holder(&self) -> Result<Option<HolderId>, Error> {
        Ok(*self.0.lock().map_err(|_| Error::Lock)?)
    }

    fn request(&self, holder: HolderId) -> Result<(), Error> {
        let mut slot = self.0.lock().map_err(|_| Error::Lock)?;
        if let Some(previous) = slot.replace(holder) {
            if previous != holder {
                log::debug!("exclusive mode moved from {previous} to {holder}");
            }
        }
        Ok(())
    }

    fn release(&self) -> Result<(), Error> {
        self.0
            .lock()
            .map_err(|_| Error::Lock)?
            .take()
            .map(|_| ())
            .ok_or(Error::NotHeld)
    }
}

impl<T: Exclusive + ?Sized> Exclusive for Box<T> {
    fn holder(&self) -> Result<Option<HolderId>, Error> {
        (**self).holder()
    }

    fn request(&self, holder: HolderId) -> Result<(), Error> {
        (**self).request(holder)
    }

    fn release(&self) -> Result<(), Error> {
        (**self).release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_and_release() {
        let slot = Slot::new();
        assert_eq!(slot.holder().unwrap(), None);

        slot.request(3).unwrap();
        assert_eq!(slot.holder().unwrap(), Some(3));

        slot.release().unwrap();
        assert_eq!(slot.holder().unwrap(), None);
    }

    #[test]
    fn release_without_holder_fails() {
        let slot = Slot::new();
        assert!(matches!(slot.release(), Err(Error::NotHeld)));
    }

    #[test]
    fn request_replaces_previous_holder() {
        let slot = Slot::new();
        slot.request(1).unwrap();
        slot.request(2).unwrap();
        assert_eq!(slot.holder().unwrap(), Some(2));
    }

    #[test]
    fn clones_share_the_slot() {
        let slot = Slot::new();
        let other = slot.clone();
        slot.request(9).unwrap();
        assert_eq!(other.holder().unwrap(), Some(9));
    }

    #[test]
    fn process_wide_slots_are_shared_and_distinct() {
        let pip = Slot::picture_in_picture();
        let fullscreen = Slot::fullscreen();
        assert!(Arc::ptr_eq(&pip.0, &Slot::picture_in_picture().0));
        assert!(!Arc::ptr_eq(&pip.0, &fullscreen.0));
    }

    #[test]
    fn poisoned_slot_reports_lock_error() {
        let slot = Slot::new();
        let inner = Arc::clone(&slot.0);
        let _ = std::thread::spawn(move || {
            let _guard = inner.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(matches!(slot.holder(), Err(Error::Lock)));
        assert!(matches!(slot.request(1), Err(Error::Lock)));
    }
}
