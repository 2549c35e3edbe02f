//! Cache lock management.
//!
//! A single exclusive lock guards the shared module caches of a resolution
//! session. Two entry points scope it:
//!
//! - [`CacheLockingManager::use_cache`] runs an action with the lock held,
//!   acquiring it only if the calling thread does not already hold it.
//! - [`CacheLockingManager::long_running_operation`] runs an action with the
//!   lock released, restoring the caller's lock state afterwards.
//!
//! # Invariants
//!
//! - Lock state is restored on every exit path, including errors and panics
//!   (RAII guards).
//! - A long-running operation never escalates or de-escalates the caller's
//!   lock state beyond its own scope.
//! - Ownership is per thread; nested `use_cache` calls on the owning thread
//!   run inline.

use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::error::ResolveError;

/// An action run under one of the lock entry points.
pub type LockAction<'a> = &'a mut dyn FnMut() -> Result<(), ResolveError>;

/// Scopes access to the shared resolution caches.
///
/// `operation` is a human-readable description used for diagnostics only.
pub trait CacheLockingManager: Send + Sync {
    /// Run `action` with the cache lock held by the calling thread.
    fn use_cache(&self, operation: &str, action: LockAction<'_>) -> Result<(), ResolveError>;

    /// Run `action` with the cache lock not held by the calling thread.
    fn long_running_operation(
        &self,
        operation: &str,
        action: LockAction<'_>,
    ) -> Result<(), ResolveError>;
}

/// In-process reentrant cache lock.
#[derive(Debug, Default)]
pub struct DefaultCacheLockingManager {
    state: Mutex<LockState>,
    available: Condvar,
}

#[derive(Debug, Default)]
struct LockState {
    owner: Option<ThreadId>,
    operation: Option<String>,
}

impl DefaultCacheLockingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        self.state.lock().owner == Some(thread::current().id())
    }

    pub fn is_held(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    /// Description of the operation currently holding the lock.
    pub fn current_operation(&self) -> Option<String> {
        self.state.lock().operation.clone()
    }

    fn acquire(&self, operation: &str) {
        let mut state = self.state.lock();
        while state.owner.is_some() {
            tracing::trace!(operation, holder = ?state.operation, "waiting for cache lock");
            self.available.wait(&mut state);
        }
        state.owner = Some(thread::current().id());
        state.operation = Some(operation.to_string());
        tracing::trace!(operation, "acquired cache lock");
    }

    /// Release the lock, returning the description it was held for.
    fn release(&self) -> String {
        let mut state = self.state.lock();
        state.owner = None;
        let operation = state.operation.take().unwrap_or_default();
        drop(state);
        tracing::trace!(operation = %operation, "released cache lock");
        self.available.notify_one();
        operation
    }
}

impl CacheLockingManager for DefaultCacheLockingManager {
    fn use_cache(&self, operation: &str, action: LockAction<'_>) -> Result<(), ResolveError> {
        let _access = CacheAccess::enter(self, operation);
        action()
    }

    fn long_running_operation(
        &self,
        operation: &str,
        action: LockAction<'_>,
    ) -> Result<(), ResolveError> {
        let _released = LockReleased::enter(self, operation);
        action()
    }
}

/// Holds the lock for a scope unless the current thread already held it.
struct CacheAccess<'a> {
    manager: &'a DefaultCacheLockingManager,
    acquired: bool,
}

impl<'a> CacheAccess<'a> {
    fn enter(manager: &'a DefaultCacheLockingManager, operation: &str) -> Self {
        let acquired = !manager.is_held_by_current_thread();
        if acquired {
            manager.acquire(operation);
        }
        Self { manager, acquired }
    }
}

impl Drop for CacheAccess<'_> {
    fn drop(&mut self) {
        if self.acquired {
            self.manager.release();
        }
    }
}

/// Releases the lock for a scope if the current thread held it.
///
/// On exit the lock is reacquired under the description it was held for.
struct LockReleased<'a> {
    manager: &'a DefaultCacheLockingManager,
    resume: Option<String>,
}

impl<'a> LockReleased<'a> {
    fn enter(manager: &'a DefaultCacheLockingManager, operation: &str) -> Self {
        let resume = if manager.is_held_by_current_thread() {
            tracing::debug!(operation, "releasing cache lock for long running operation");
            Some(manager.release())
        } else {
            None
        };
        Self { manager, resume }
    }
}

impl Drop for LockReleased<'_> {
    fn drop(&mut self) {
        if let Some(operation) = self.resume.take() {
            self.manager.acquire(&operation);
        }
    }
}
