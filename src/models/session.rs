use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
    pub active: bool,
}

impl Session {
    pub fn new(user_id: Option<String>, title: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            user_id,
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            active: true,
        }
    }

    /// Append a message and drop the oldest ones so at most `max_history` remain.
    pub fn push_message(&mut self, message: Message, max_history: usize) {
        self.messages.push(message);
        if self.messages.len() > max_history {
            let excess = self.messages.len() - max_history;
            self.messages.drain(..excess);
        }
        self.touch(Local::now());
    }

    /// Never moves `updated_at` backwards.
    pub fn touch(&mut self, now: DateTime<Local>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub fn is_idle_since(&self, cutoff: DateTime<Local>) -> bool {
        self.updated_at < cutoff
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}
