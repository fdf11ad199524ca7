//! Server-held session records.
//!
//! Maps session ids to their [`SessionRecord`]. A session is created on the
//! first successful document extraction, destroyed on form submission, and
//! expires after an idle window. Concurrent writes from the same session
//! are not serialized beyond the map lock: the last writer for a document
//! type wins.

use std::collections::HashMap;
use std::sync::Arc;

use docverify_core::{DocumentType, FieldSet, SessionRecord};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

pub type SessionId = String;

struct SessionEntry {
    record: SessionRecord,
    last_seen: Instant,
}

/// Keyed store of active sessions.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.duration_since(entry.last_seen) > self.idle_timeout
    }

    /// Snapshot of a live session's record. Refreshes its idle timer;
    /// an expired session is dropped and reported as absent.
    pub async fn get(&self, session_id: &str) -> Option<SessionRecord> {
        let mut w = self.sessions.write().await;
        let now = Instant::now();
        let expired = self.is_expired(w.get(session_id)?, now);
        if expired {
            w.remove(session_id);
            debug!(session = %session_id, "Session expired on access");
            return None;
        }
        let entry = w.get_mut(session_id)?;
        entry.last_seen = now;
        Some(entry.record.clone())
    }

    /// Store a document's fields, creating the session if needed.
    /// Returns true when a new session was created.
    pub async fn store_document(
        &self,
        session_id: &str,
        doc_type: DocumentType,
        fields: FieldSet,
    ) -> bool {
        let mut w = self.sessions.write().await;
        let now = Instant::now();

        if w.get(session_id).is_some_and(|e| self.is_expired(e, now)) {
            w.remove(session_id);
        }
        let created = !w.contains_key(session_id);
        let entry = w.entry(session_id.to_string()).or_insert_with(|| SessionEntry {
            record: SessionRecord::new(),
            last_seen: now,
        });
        entry.last_seen = now;
        let replaced = entry.record.insert(doc_type.clone(), fields).is_some();

        debug!(
            session = %session_id,
            doc_type = %doc_type,
            created,
            replaced,
            documents = entry.record.len(),
            "Stored document fields"
        );
        created
    }

    /// Drop a session. Returns whether it existed.
    pub async fn destroy(&self, session_id: &str) -> bool {
        let mut w = self.sessions.write().await;
        w.remove(session_id).is_some()
    }

    /// Remove every session idle past the timeout. Returns how many went.
    pub async fn reap_expired(&self) -> usize {
        let mut w = self.sessions.write().await;
        let now = Instant::now();
        let before = w.len();
        w.retain(|_, entry| now.duration_since(entry.last_seen) <= self.idle_timeout);
        before - w.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Start a background loop that reaps expired sessions.
    pub fn spawn_reaper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let reaped = store.reap_expired().await;
                if reaped > 0 {
                    info!(reaped, "Reaped expired sessions");
                }
            }
        })
    }
}
