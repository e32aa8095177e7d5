//! Per-user conversation state and the keyed store holding it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::category::ClassificationResult;
use crate::model::{FacilityKind, UserId};
use crate::ports::{ChatRole, ChatTurn};

/// Where a conversation stands with respect to the next location event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing pending.
    Idle,
    /// A photo was classified; the next location finds a matching bin.
    AwaitingLocationForClassification,
    /// A facility kind was selected; the next location searches it.
    AwaitingLocationForMode,
}

/// Mutable state of one user's conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Facility kind explicitly selected by the user.
    pub mode: Option<FacilityKind>,
    /// Classification awaiting the user's location.
    pub pending_classification: Option<ClassificationResult>,
    /// Language of the most recent inbound event.
    pub language_code: String,
    /// Recent free-chat turns, oldest first.
    pub history: Vec<ChatTurn>,
}

impl ConversationState {
    /// Current phase; a pending classification outranks a selected mode.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.pending_classification.is_some() {
            Phase::AwaitingLocationForClassification
        } else if self.mode.is_some() {
            Phase::AwaitingLocationForMode
        } else {
            Phase::Idle
        }
    }

    /// Drop both follow-up fields.
    pub fn reset(&mut self) {
        self.mode = None;
        self.pending_classification = None;
    }

    /// Append a chat turn, keeping at most `limit` turns.
    pub fn remember(&mut self, role: ChatRole, content: String, limit: usize) {
        self.history.push(ChatTurn { role, content });
        let excess = self.history.len().saturating_sub(limit);
        self.history.drain(..excess);
    }
}

/// State of one user plus the time of their latest event.
#[derive(Debug)]
struct Session {
    state: Arc<Mutex<ConversationState>>,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            last_seen: Instant::now(),
        }
    }
}

/// Concurrent map from user id to that user's conversation state.
///
/// Each entry sits behind its own async mutex: holding it serialises a user's
/// events while other users proceed independently. Idle entries are dropped by
/// [`SessionStore::evict_idle`]; an evicted user starts over as [`Phase::Idle`].
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, Session>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state of `user`, creating it on first use.
    pub async fn lock(&self, user: &UserId) -> OwnedMutexGuard<ConversationState> {
        // Clone the Arc so the map shard is released before awaiting the user lock.
        let state = {
            let mut session = self.sessions.entry(user.clone()).or_default();
            session.last_seen = Instant::now();
            Arc::clone(&session.state)
        };
        state.lock_owned().await
    }

    /// Forget users whose last event is at least `max_idle` old.
    ///
    /// Sessions that are locked or awaiting their lock are kept. Returns the
    /// number of evicted users.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut evicted = 0;
        self.sessions.retain(|_, session| {
            let keep =
                Arc::strong_count(&session.state) > 1 || session.last_seen.elapsed() < max_idle;
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    /// Copy of the current state of `user`, if one exists.
    pub async fn snapshot(&self, user: &UserId) -> Option<ConversationState> {
        let entry = self
            .sessions
            .get(user)
            .map(|session| Arc::clone(&session.value().state))?;
        let state = entry.lock().await;
        Some(state.clone())
    }

    /// Number of users seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no user has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_outranks_mode() {
        let mut state = ConversationState::default();
        assert_eq!(state.phase(), Phase::Idle);

        state.mode = Some(FacilityKind::BulkyWaste);
        assert_eq!(state.phase(), Phase::AwaitingLocationForMode);

        state.pending_classification = Some(ClassificationResult::from_label("plastic bottle"));
        assert_eq!(state.phase(), Phase::AwaitingLocationForClassification);

        state.reset();
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn history_is_bounded() {
        let mut state = ConversationState::default();
        for turn in 0..5 {
            state.remember(ChatRole::User, format!("message {turn}"), 3);
        }
        let contents: Vec<_> = state.history.iter().map(|turn| turn.content.as_str()).collect();
        assert_eq!(contents, ["message 2", "message 3", "message 4"]);
    }

    #[tokio::test]
    async fn state_is_created_lazily_per_user() {
        let store = SessionStore::new();
        let alice = UserId::from("alice");
        assert!(store.snapshot(&alice).await.is_none());

        {
            let mut state = store.lock(&alice).await;
            state.mode = Some(FacilityKind::CollectionYard);
        }

        let snapshot = store.snapshot(&alice).await.expect("created on lock");
        assert_eq!(snapshot.mode, Some(FacilityKind::CollectionYard));
        assert!(store.snapshot(&UserId::from("bob")).await.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_unless_in_use() {
        let store = SessionStore::new();
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        store.lock(&alice).await.mode = Some(FacilityKind::SmartBin);
        let bob_state = store.lock(&bob).await;

        assert_eq!(store.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(store.len(), 2);

        assert_eq!(store.evict_idle(Duration::ZERO), 1);
        assert!(store.snapshot(&alice).await.is_none());
        drop(bob_state);
        assert!(store.snapshot(&bob).await.is_some());

        let recreated = store.lock(&alice).await;
        assert_eq!(recreated.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn distinct_users_do_not_block_each_other() {
        let store = Arc::new(SessionStore::new());
        let _alice = store.lock(&UserId::from("alice")).await;

        let other = Arc::clone(&store);
        let bob = tokio::time::timeout(std::time::Duration::from_secs(1), async move {
            other.lock(&UserId::from("bob")).await;
        })
        .await;
        assert!(bob.is_ok(), "bob must not wait for alice");
    }
}
