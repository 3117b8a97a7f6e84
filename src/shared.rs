//! State that the driver and a coroutine take turns with.

use std::{fmt, sync::Arc};

use parking_lot::{Mutex, MutexGuard};

/// A handle to game state shared between the driver and its coroutines.
///
/// Coroutines run on their own threads, so Rust needs the state to be `Send + Sync`, but they never run at the
/// same time as the driver. So the lock inside is never supposed to be contended, and if it is, that's a bug:
/// most likely a guard held across a yield. Rather than quietly blocking (and deadlocking, since the other side
/// is waiting for the yield), [`Self::borrow`] panics, the same way `RefCell` does.
pub struct Shared<T>(Arc<Mutex<T>>);

impl<T> Shared<T> {
    /// Start sharing some state.
    pub fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    /// Get at the state.
    ///
    /// # Panics
    ///
    /// If something else is still holding it.
    #[track_caller]
    pub fn borrow(&self) -> MutexGuard<'_, T> {
        match self.try_borrow() {
            Some(guard) => guard,
            None => panic!("shared state is held on both sides of a yield"),
        }
    }

    /// Get at the state, or `None` if something else is still holding it.
    pub fn try_borrow(&self) -> Option<MutexGuard<'_, T>> {
        self.0.try_lock()
    }

    /// Run `f` on the state, releasing it afterwards. Panics like [`Self::borrow`].
    #[track_caller]
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.borrow())
    }

    /// How many handles to this state exist right now.
    pub fn handles(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_borrow() {
            Some(value) => f.debug_tuple("Shared").field(&*value).finish(),
            None => f.write_str("Shared(<held>)"),
        }
    }
}
