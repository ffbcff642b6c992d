//! Setup-phase tracking.
//!
//! A freshly decorated client is in its setup phase until either the owner
//! calls [`crate::AuthGate::finish_setup`] or the zero-delay task spawned at
//! construction gets polled. Guarded commands used during the phase fail in
//! the caller's own stack; later ones are reported on the error channel.
//!
//! The task is only spawned on a current-thread runtime, where it cannot run
//! before the constructing task yields. Elsewhere the phase stays open until
//! closed explicitly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::RuntimeFlavor;

use crate::observability::GateEvent;

#[derive(Debug, Clone)]
pub(crate) struct SetupPhase {
    open: Arc<AtomicBool>,
}

impl SetupPhase {
    pub(crate) fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Returns whether this call closed the phase.
    pub(crate) fn close(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }

    /// Close the phase from a task on the current runtime.
    ///
    /// Returns `false` when there is no current-thread tokio runtime; the
    /// phase then stays open until closed explicitly.
    pub(crate) fn schedule_close(&self) -> bool {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return false;
        };
        if handle.runtime_flavor() != RuntimeFlavor::CurrentThread {
            return false;
        }
        let phase = self.clone();
        handle.spawn(async move {
            if phase.close() {
                tracing::debug!(
                    event = GateEvent::SetupClosed.as_str(),
                    trigger = "deferred",
                    "client setup phase closed"
                );
            }
        });
        true
    }
}
