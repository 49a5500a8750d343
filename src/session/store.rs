use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};

use super::storage::ExpiringStore;
use crate::config::{ChatConfig, DEFAULT_MAX_HISTORY, DEFAULT_WELCOME_MESSAGE};
use crate::error::{Result, SmartCustomError};
use crate::models::{Message, Session};

#[derive(Default)]
struct StoreState {
    sessions: HashMap<String, Session>,
    // user id -> session ids in creation order
    by_user: HashMap<String, Vec<String>>,
}

impl StoreState {
    fn index(&mut self, session: &Session) {
        if let Some(user_id) = session.user_id.as_deref() {
            let ids = self.by_user.entry(user_id.to_string()).or_default();
            if !ids.iter().any(|id| id == &session.session_id) {
                ids.push(session.session_id.clone());
            }
        }
    }

    /// Drop a session together with its index entry.
    fn remove(&mut self, session_id: &str) -> Option<Session> {
        let session = self.sessions.remove(session_id)?;
        if let Some(user_id) = session.user_id.as_deref() {
            if let Some(ids) = self.by_user.get_mut(user_id) {
                ids.retain(|id| id != session_id);
                if ids.is_empty() {
                    self.by_user.remove(user_id);
                }
            }
        }
        Some(session)
    }
}

/// In-memory sessions keyed by id, plus a per-user index.
///
/// Both maps live behind a single lock, so every public operation updates
/// them together.
pub struct SessionStore {
    state: RwLock<StoreState>,
    max_history: usize,
    welcome_message: String,
}

impl SessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            max_history: max_history.max(1),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.max_history).with_welcome_message(config.welcome_message.clone())
    }

    pub fn with_welcome_message(mut self, welcome_message: impl Into<String>) -> Self {
        self.welcome_message = welcome_message.into();
        self
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn len(&self) -> usize {
        self.read_state().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a session with a system welcome message. An empty user id is
    /// treated as anonymous and not indexed.
    pub fn create(&self, user_id: Option<&str>, title: &str) -> Session {
        let user_id = user_id.filter(|u| !u.is_empty()).map(str::to_string);
        let mut session = Session::new(user_id, title);
        let welcome = Message::system(session.session_id.as_str(), self.welcome_message.as_str());
        session.push_message(welcome, self.max_history);

        let mut state = self.write_state();
        state.index(&session);
        state
            .sessions
            .insert(session.session_id.clone(), session.clone());
        debug!(session_id = %session.session_id, user_id = ?session.user_id, "Created session");
        session
    }

    /// Store an existing session, replacing any session with the same id.
    ///
    /// The session is normalized the way `create` builds one: an empty user id
    /// becomes anonymous, `updated_at` is raised to at least `created_at` and
    /// the history is capped.
    pub fn insert(&self, mut session: Session) -> Option<Session> {
        session.user_id = session.user_id.filter(|u| !u.is_empty());
        if session.updated_at < session.created_at {
            session.updated_at = session.created_at;
        }
        if session.messages.len() > self.max_history {
            let excess = session.messages.len() - self.max_history;
            session.messages.drain(..excess);
        }
        let mut state = self.write_state();
        let previous = state.remove(&session.session_id);
        state.index(&session);
        state
            .sessions
            .insert(session.session_id.clone(), session);
        previous
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.read_state().sessions.get(session_id).cloned()
    }

    /// Append a message, trimming the oldest ones past the history cap.
    pub fn append_message(&self, session_id: &str, mut message: Message) -> Result<Session> {
        let mut state = self.write_state();
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SmartCustomError::SessionNotFound(session_id.to_string()))?;
        message.session_id = session_id.to_string();
        session.push_message(message, self.max_history);
        Ok(session.clone())
    }

    /// Mark every message in the session read. Returns how many changed.
    pub fn mark_read(&self, session_id: &str) -> usize {
        let mut state = self.write_state();
        let Some(session) = state.sessions.get_mut(session_id) else {
            return 0;
        };
        let mut changed = 0;
        for message in session.messages.iter_mut().filter(|m| !m.read) {
            message.mark_read();
            changed += 1;
        }
        if changed > 0 {
            session.touch(Local::now());
        }
        changed
    }

    /// Active sessions owned by a user, oldest first.
    pub fn list_by_user(&self, user_id: &str) -> Vec<Session> {
        let state = self.read_state();
        let Some(ids) = state.by_user.get(user_id) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| state.sessions.get(id))
            .filter(|session| session.active)
            .cloned()
            .collect()
    }

    pub fn delete(&self, session_id: &str) -> bool {
        let removed = self.write_state().remove(session_id).is_some();
        if removed {
            debug!(session_id = %session_id, "Deleted session");
        }
        removed
    }

    pub fn sweep_expired(&self, idle_timeout: Duration) -> usize {
        self.sweep_expired_at(idle_timeout, Local::now())
    }

    /// Remove sessions last updated before `now - idle_timeout`.
    ///
    /// Candidates are collected under a read lock, then each one is re-checked
    /// and removed under its own short write lock.
    pub fn sweep_expired_at(&self, idle_timeout: Duration, now: DateTime<Local>) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(idle_timeout)
            .ok()
            .and_then(|timeout| now.checked_sub_signed(timeout))
        else {
            return 0;
        };

        let mut removed = 0;
        for session_id in self.idle_candidates(cutoff) {
            if self.remove_if_idle(&session_id, cutoff) {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "Swept expired sessions");
        }
        removed
    }

    fn idle_candidates(&self, cutoff: DateTime<Local>) -> Vec<String> {
        self.read_state()
            .sessions
            .values()
            .filter(|session| session.is_idle_since(cutoff))
            .map(|session| session.session_id.clone())
            .collect()
    }

    // The session may have been touched or deleted since it was scanned.
    fn remove_if_idle(&self, session_id: &str, cutoff: DateTime<Local>) -> bool {
        let mut state = self.write_state();
        let still_idle = state
            .sessions
            .get(session_id)
            .is_some_and(|session| session.is_idle_since(cutoff));
        still_idle && state.remove(session_id).is_some()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl ExpiringStore for SessionStore {
    fn sweep_expired(&self, idle_timeout: Duration) -> usize {
        SessionStore::sweep_expired(self, idle_timeout)
    }
}
