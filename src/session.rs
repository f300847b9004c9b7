//! Session gate: the authorization-failure collaborator.
//!
//! The feed components never interpret a 403 themselves; they forward it
//! through this interface, which owns the logged-out transition (clearing a
//! stored cookie, closing a session file, flipping UI state). The core
//! depends on nothing beyond the callback.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Invoked whenever a mutating call comes back 403.
pub trait SessionGate: Send + Sync + fmt::Debug {
    /// Force the logged-out state
    fn force_logout(&self);
}

/// Gate wrapping an arbitrary callback.
pub struct CallbackGate {
    callback: Box<dyn Fn() + Send + Sync>,
}

impl CallbackGate {
    /// Wrap `callback` as a gate
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl SessionGate for CallbackGate {
    fn force_logout(&self) {
        (self.callback)();
    }
}

impl fmt::Debug for CallbackGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackGate").finish_non_exhaustive()
    }
}

/// Gate that only counts invocations; for tests and headless use.
#[derive(Debug, Default)]
pub struct RecordingGate {
    count: AtomicUsize,
}

impl RecordingGate {
    /// Create a gate with zero recorded logouts
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times a forced logout fired
    pub fn logout_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl SessionGate for RecordingGate {
    fn force_logout(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn test_callback_gate_invokes_closure() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let gate = CallbackGate::new(move || flag.store(true, Ordering::SeqCst));

        gate.force_logout();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_recording_gate_counts() {
        let gate = RecordingGate::new();
        gate.force_logout();
        gate.force_logout();
        assert_eq!(gate.logout_count(), 2);
    }
}
