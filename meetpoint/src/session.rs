//! Per-session state.
//!
//! A [`Session`] remembers the last [`MeetingPlan`] computed for one user so
//! that a front end can redraw it without planning again. Sessions are
//! immutable values; updating one produces a new record that replaces the
//! old one in the [`SessionStore`].

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use crate::planner::MeetingPlan;

/// Default maximum number of live sessions.
pub const DEFAULT_SESSION_CAPACITY: u64 = 1000;

/// Default idle time before a session expires.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// State retained for one user session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    plan: Option<Arc<MeetingPlan>>,
}

impl Session {
    /// A session with nothing computed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of this session holding `plan`.
    pub fn with_plan(&self, plan: MeetingPlan) -> Self {
        Self {
            plan: Some(Arc::new(plan)),
        }
    }

    /// The last computed plan, if any.
    pub fn plan(&self) -> Option<&MeetingPlan> {
        self.plan.as_deref()
    }
}

/// Bounded, idle-expiring map from session id to [`Session`].
pub struct SessionStore {
    sessions: Cache<String, Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY, DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    /// Create a store holding at most `capacity` sessions, each dropped after
    /// `time_to_idle` without access.
    pub fn new(capacity: u64, time_to_idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(time_to_idle)
                .build(),
        }
    }

    /// Start an empty session and return its id.
    pub fn create(&self) -> String {
        let id = new_session_id();
        self.sessions.insert(id.clone(), Session::new());
        tracing::debug!(session_id = %id, "Session created");
        id
    }

    /// Look up a session.
    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id)
    }

    /// Store `session` under `id`, replacing any previous record.
    pub fn put(&self, id: impl Into<String>, session: Session) {
        self.sessions.insert(id.into(), session);
    }

    /// Drop a session.
    pub fn remove(&self, id: &str) {
        self.sessions.invalidate(id);
    }

    /// Approximate number of live sessions.
    pub fn len(&self) -> u64 {
        self.sessions.run_pending_tasks();
        self.sessions.entry_count()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Random 64-bit session id, hex encoded.
fn new_session_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}
