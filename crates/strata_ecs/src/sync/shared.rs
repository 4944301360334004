//! # Shared Manager
//!
//! A manager behind a `parking_lot::RwLock`, plus a counter of completed
//! mutation phases.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ecs::{Manager, Schema};

/// Manager shared between threads.
///
/// Cloning shares the same manager.
///
/// ## Usage
///
/// ```rust,ignore
/// let shared = SharedManager::new(Manager::<Game>::new()?);
///
/// // Mutation phase (exclusive)
/// shared.mutate(|manager| {
///     manager.refresh();
///     manager.update_system::<Mover>(&mut dt);
/// });
///
/// // Read phase (any number of threads)
/// let reader = shared.clone();
/// std::thread::spawn(move || {
///     reader.read().for_matching_ref::<Moving>(|slot, (pos, _)| draw(slot, pos));
/// });
/// ```
pub struct SharedManager<S: Schema> {
    inner: Arc<RwLock<Manager<S>>>,
    frame: Arc<AtomicU64>,
}

impl<S: Schema> SharedManager<S> {
    /// Wraps `manager` for shared use.
    #[must_use]
    pub fn new(manager: Manager<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(manager)),
            frame: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enters a read phase. Blocks while a mutation phase is running.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Manager<S>> {
        self.inner.read()
    }

    /// Enters a mutation phase. Blocks until every reader has left.
    ///
    /// Does not advance [`SharedManager::frame`]; see
    /// [`SharedManager::mutate`].
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Manager<S>> {
        self.inner.write()
    }

    /// Runs one mutation phase and advances the frame counter.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Manager<S>) -> R) -> R {
        let mut manager = self.inner.write();
        let result = f(&mut manager);
        self.frame.fetch_add(1, Ordering::Release);
        result
    }

    /// Number of completed mutation phases.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame.load(Ordering::Acquire)
    }

    /// Returns the manager if this is the last reference to it.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged if other clones are still alive.
    pub fn try_unwrap(self) -> Result<Manager<S>, Self> {
        let Self { inner, frame } = self;
        Arc::try_unwrap(inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner, frame })
    }
}

impl<S: Schema> Clone for SharedManager<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            frame: Arc::clone(&self.frame),
        }
    }
}

impl<S: Schema> std::fmt::Debug for SharedManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedManager")
            .field("frame", &self.frame())
            .finish_non_exhaustive()
    }
}
