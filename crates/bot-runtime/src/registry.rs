//! # In-Flight Registry
//!
//! Targets currently being measured. Acquiring a target is one atomic
//! test-and-insert; the returned guard releases it on drop, including
//! during panic unwinding.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::EventId;

/// Shared set of targets under measurement.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    targets: Arc<Mutex<HashSet<EventId>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `target`. Returns `None` if it is already claimed.
    pub fn try_acquire(&self, target: EventId) -> Option<InFlightGuard> {
        if !self.targets.lock().insert(target) {
            return None;
        }
        Some(InFlightGuard {
            target,
            targets: Arc::clone(&self.targets),
        })
    }

    pub fn is_measuring(&self, target: &EventId) -> bool {
        self.targets.lock().contains(target)
    }

    pub fn len(&self) -> usize {
        self.targets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.lock().is_empty()
    }
}

/// Releases its target when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    target: EventId,
    targets: Arc<Mutex<HashSet<EventId>>>,
}

impl InFlightGuard {
    pub fn target(&self) -> EventId {
        self.target
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.targets.lock().remove(&self.target);
    }
}
