//! Serializes package regeneration per assignment.
//!
//! Two requests regenerating the same assignment would otherwise race on the
//! final attach; requests for different assignments never wait on each other.
//! An entry lives only while someone holds or waits for its lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

type Registry = HashMap<i64, Arc<Mutex<()>>>;

#[derive(Clone, Default)]
pub struct AssignmentLocks {
    locks: Arc<StdMutex<Registry>>,
}

/// Held for the duration of one regeneration.
pub struct AssignmentGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<StdMutex<Registry>>,
    assignment_id: i64,
}

impl AssignmentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(locks: &StdMutex<Registry>) -> MutexGuard<'_, Registry> {
        locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until no other holder regenerates `assignment_id`.
    pub async fn acquire(&self, assignment_id: i64) -> AssignmentGuard {
        let lock = Self::registry(&self.locks)
            .entry(assignment_id)
            .or_default()
            .clone();
        AssignmentGuard {
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
            assignment_id,
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        Self::registry(&self.locks).len()
    }
}

impl Drop for AssignmentGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut registry = AssignmentLocks::registry(&self.locks);
        // Only the registry still points at the lock: nobody holds or awaits it.
        if registry
            .get(&self.assignment_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            registry.remove(&self.assignment_id);
        }
    }
}
