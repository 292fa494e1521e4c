use std::collections::HashMap;

use tokio::time::{Duration, Instant};

use crate::domain::{ChatId, UserId};

/// Whether the next photo from a conversation goes into the gallery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    AwaitingPhoto,
}

/// Conversation identity: the chat plus the sender in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

/// Per-conversation context handed to the command interpreter for one event.
#[derive(Debug)]
pub struct UploadSession {
    state: UploadState,
    last_activity: Instant,
}

impl UploadSession {
    fn new(now: Instant) -> Self {
        Self {
            state: UploadState::Idle,
            last_activity: now,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn is_awaiting(&self) -> bool {
        self.state == UploadState::AwaitingPhoto
    }

    /// Arm the session for the next photo. Calling it again is a no-op.
    pub fn begin_upload(&mut self) {
        self.state = UploadState::AwaitingPhoto;
    }

    /// Single gate for inbound photos: true (and back to idle) only when armed.
    pub fn consume_if_awaiting(&mut self) -> bool {
        if self.state != UploadState::AwaitingPhoto {
            return false;
        }
        self.state = UploadState::Idle;
        true
    }
}

/// Owns every live conversation context. Contexts are created on the first
/// event and dropped after `idle_timeout` without activity.
#[derive(Debug)]
pub struct SessionRegistry {
    idle_timeout: Duration,
    sessions: HashMap<ConversationKey, UploadSession>,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            sessions: HashMap::new(),
        }
    }

    pub fn session_mut(&mut self, key: ConversationKey) -> &mut UploadSession {
        self.session_mut_at(key, Instant::now())
    }

    pub fn session_mut_at(&mut self, key: ConversationKey, now: Instant) -> &mut UploadSession {
        let session = self
            .sessions
            .entry(key)
            .or_insert_with(|| UploadSession::new(now));
        session.last_activity = now;
        session
    }

    pub fn get(&self, key: &ConversationKey) -> Option<&UploadSession> {
        self.sessions.get(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop idle contexts; returns how many were evicted.
    pub fn evict_idle(&mut self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    pub fn evict_idle_at(&mut self, now: Instant) -> usize {
        let before = self.sessions.len();
        let timeout = self.idle_timeout;
        self.sessions
            .retain(|_, s| now.saturating_duration_since(s.last_activity) < timeout);
        before - self.sessions.len()
    }
}
