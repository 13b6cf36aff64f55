//! Per-tab operation flags.
//!
//! At most one operation of each kind runs per tab. A duplicate request
//! while its kind is running is dropped rather than queued.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use pagemind_protocols::{OperationFlags, OperationKind};

/// Tracks which operation kinds are running for one tab.
pub struct OperationStateMachine {
    running: Mutex<BTreeMap<OperationKind, bool>>,
    summarized: AtomicBool,
}

impl Default for OperationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationStateMachine {
    pub fn new() -> Self {
        Self {
            running: Mutex::new(OperationKind::ALL.iter().map(|k| (*k, false)).collect()),
            summarized: AtomicBool::new(false),
        }
    }

    /// Mark `kind` running and return a guard that clears it on drop.
    ///
    /// Returns `None` when `kind` is already running.
    pub fn begin(&self, kind: OperationKind) -> Option<OperationGuard<'_>> {
        if !self.try_start(kind) {
            debug!("Dropping duplicate {} request", kind);
            return None;
        }
        Some(OperationGuard {
            machine: self,
            kind,
        })
    }

    /// Atomically set the flag for `kind`. False if it was already set.
    pub fn try_start(&self, kind: OperationKind) -> bool {
        let mut running = self.running.lock();
        let flag = running.entry(kind).or_insert(false);
        if *flag {
            return false;
        }
        *flag = true;
        true
    }

    /// Clear the flag for `kind` unconditionally.
    pub fn finish(&self, kind: OperationKind) {
        self.running.lock().insert(kind, false);
    }

    pub fn is_running(&self, kind: OperationKind) -> bool {
        self.running.lock().get(&kind).copied().unwrap_or(false)
    }

    pub fn all_idle(&self) -> bool {
        !self.running.lock().values().any(|r| *r)
    }

    pub fn mark_summarized(&self) {
        self.summarized.store(true, Ordering::SeqCst);
    }

    pub fn is_summarized(&self) -> bool {
        self.summarized.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> OperationFlags {
        let running = self.running.lock().clone();
        let all_idle = !running.values().any(|r| *r);
        OperationFlags {
            running,
            summarized: self.is_summarized(),
            all_idle,
        }
    }
}

/// Clears its operation flag when dropped.
pub struct OperationGuard<'a> {
    machine: &'a OperationStateMachine,
    kind: OperationKind,
}

impl OperationGuard<'_> {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.machine.finish(self.kind);
    }
}
