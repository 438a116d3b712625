//! In-flight guard for redelivered inbound events

use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set of event ids currently being handled
///
/// Between a successful admission and its release no other admission with
/// the same id succeeds.
#[derive(Clone, Default)]
pub struct DedupGuard {
    in_flight: Arc<DashSet<String>>,
    closed: Arc<AtomicBool>,
}

impl DedupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of an inbound message
    pub fn message_key(chat_id: i64, message_id: i32) -> String {
        format!("{}:{}", chat_id, message_id)
    }

    /// Marks `id` in flight; false if it already is or the guard is closed
    pub fn try_admit(&self, id: &str) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        self.in_flight.insert(id.to_string())
    }

    pub fn release(&self, id: &str) {
        self.in_flight.remove(id);
    }

    /// Admits `id` for the lifetime of the returned handle
    pub fn admit(&self, id: impl Into<String>) -> Option<Admission> {
        let id = id.into();
        if self.try_admit(&id) {
            Some(Admission {
                guard: self.clone(),
                id,
            })
        } else {
            log::debug!("Event {} already in flight, skipping", id);
            None
        }
    }

    /// Stops admitting new events
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

/// Releases its id when dropped
#[derive(Debug)]
pub struct Admission {
    guard: DedupGuard,
    id: String,
}

impl Admission {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.guard.release(&self.id);
    }
}

impl std::fmt::Debug for DedupGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupGuard")
            .field("in_flight", &self.in_flight.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
