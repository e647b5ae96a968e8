// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exception kinds a test has declared as expected while it runs.
//!
//! Instrumentation that intercepts assertion libraries registers expected
//! exceptions through an [`ExpectedExceptionHook`]. The listener drains the
//! registered kinds when the test finishes, and clears them after every finish
//! event whatever the outcome.

use smol_str::SmolStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A cloneable handle through which expected exceptions are registered.
#[derive(Clone, Debug, Default)]
pub struct ExpectedExceptionHook {
    kinds: Arc<Mutex<Vec<SmolStr>>>,
}

impl ExpectedExceptionHook {
    /// Registers an exception kind as expected by the running test.
    pub fn add_expected_exception(&self, kind: impl Into<SmolStr>) {
        self.lock().push(kind.into());
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SmolStr>> {
        // A panic while holding the lock can't leave the list half-updated.
        self.kinds.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The listener-owned side of the expected-exception registry.
#[derive(Debug, Default)]
pub struct ExpectedExceptions {
    hook: ExpectedExceptionHook,
}

impl ExpectedExceptions {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle for registering expected exceptions.
    pub fn hook(&self) -> ExpectedExceptionHook {
        self.hook.clone()
    }

    /// Returns the registered kinds in registration order, without clearing.
    pub fn snapshot(&self) -> Vec<SmolStr> {
        self.hook.lock().clone()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.hook.lock().is_empty()
    }

    /// Forgets all registered kinds.
    pub fn clear(&self) {
        self.hook.lock().clear();
    }

    /// Returns a guard that clears the registry when dropped.
    ///
    /// The guard holds its own handle, so the registry stays usable while the
    /// guard is alive.
    pub fn clear_guard(&self) -> ClearOnDrop {
        ClearOnDrop {
            hook: self.hook.clone(),
        }
    }
}

/// Clears the expected-exception registry on drop.
///
/// Returned by [`ExpectedExceptions::clear_guard`].
#[derive(Debug)]
#[must_use = "the registry is cleared when the guard is dropped"]
pub struct ClearOnDrop {
    hook: ExpectedExceptionHook,
}

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        self.hook.lock().clear();
    }
}
