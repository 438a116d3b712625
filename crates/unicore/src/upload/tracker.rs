use dashmap::DashMap;
use std::sync::Arc;
use tokio::time::Instant;

use crate::import::RecordKind;

/// Upload state of one user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadSession {
    /// Kind the next file will be imported as; last write wins
    pub expected_kind: Option<RecordKind>,
    pub files_seen_in_burst: u32,
    pub burst_started_at: Option<Instant>,
}

/// Per-user upload sessions
///
/// Critical sections are single map operations and never span an `.await`.
#[derive(Clone, Default)]
pub struct UploadTracker {
    sessions: Arc<DashMap<i64, UploadSession>>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the kind the user's next file is imported as, replacing any previous one
    pub fn begin_expecting(&self, user_id: i64, kind: RecordKind) {
        let mut session = self.sessions.entry(user_id).or_default();
        if let Some(previous) = session.expected_kind.replace(kind) {
            if previous != kind {
                log::debug!("User {} switched pending upload from {} to {}", user_id, previous, kind);
            }
        }
    }

    pub fn resolve_expected(&self, user_id: i64) -> Option<RecordKind> {
        self.sessions.get(&user_id).and_then(|s| s.expected_kind)
    }

    /// Counts a file into the user's current burst
    ///
    /// The expectation check and the count happen under one entry lock. Returns
    /// the expected kind and the burst size including this file (1 means a new
    /// burst started), or `None` without touching the map when nothing is
    /// expected.
    pub fn record_file_arrival(&self, user_id: i64) -> Option<(RecordKind, u32)> {
        let mut session = self.sessions.get_mut(&user_id)?;
        let kind = session.expected_kind?;
        if session.files_seen_in_burst == 0 {
            session.burst_started_at = Some(Instant::now());
        }
        session.files_seen_in_burst += 1;
        Some((kind, session.files_seen_in_burst))
    }

    /// Drops the user's expectation and burst
    pub fn clear(&self, user_id: i64) {
        self.sessions.remove(&user_id);
    }

    /// Ends the user's burst, clearing the session
    ///
    /// Returns the number of files seen, or `None` if the session was cleared
    /// while the burst was open.
    pub fn settle(&self, user_id: i64) -> Option<u32> {
        self.sessions
            .remove(&user_id)
            .map(|(_, session)| session.files_seen_in_burst)
            .filter(|files| *files > 0)
    }

    pub fn session(&self, user_id: i64) -> Option<UploadSession> {
        self.sessions.get(&user_id).map(|s| s.clone())
    }
}
