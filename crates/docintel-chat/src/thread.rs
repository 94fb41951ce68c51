//! Append-only conversation log.
//!
//! Turns are kept in insertion order and never mutated. Assistant turns carry
//! an explicit `reply_to` back-reference to the user turn they answer, so
//! pairing does not depend on array adjacency.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use docintel_core::types::{AssistantReply, Role, Turn, TurnId};

/// One rendered result card: the question and its answer, if it has arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPair {
    pub user: Turn,
    pub assistant: Option<Turn>,
}

impl TurnPair {
    pub fn is_pending(&self) -> bool {
        self.assistant.is_none()
    }
}

/// Shared handle to one conversation log. Clones see the same log.
#[derive(Debug, Clone, Default)]
pub struct ThreadStore {
    turns: Arc<Mutex<Vec<Turn>>>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<Turn>> {
        self.turns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a user turn. Always succeeds.
    pub fn append_user(&self, text: impl Into<String>) -> TurnId {
        let turn = Turn::user(text);
        let id = turn.id;
        self.log().push(turn);
        id
    }

    /// Append an assistant turn answering `reply_to`. Always succeeds.
    pub fn append_assistant(&self, reply_to: TurnId, reply: AssistantReply) -> TurnId {
        let turn = Turn::assistant(reply_to, reply);
        let id = turn.id;
        self.log().push(turn);
        id
    }

    /// Every user turn in order, each with its answer if one exists.
    ///
    /// A fresh snapshot each call; it can be recomputed any number of times.
    pub fn pairs(&self) -> Vec<TurnPair> {
        let turns = self.log();

        let mut replies: HashMap<TurnId, &Turn> = HashMap::new();
        for turn in turns.iter().filter(|t| t.role == Role::Assistant) {
            if let Some(parent) = turn.reply_to {
                replies.entry(parent).or_insert(turn);
            }
        }

        turns
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|user| TurnPair {
                user: user.clone(),
                assistant: replies.get(&user.id).map(|t| (*t).clone()),
            })
            .collect()
    }

    /// True while the newest question has no answer yet.
    pub fn awaiting_response(&self) -> bool {
        let turns = self.log();
        let Some(last_user) = turns.iter().rev().find(|t| t.role == Role::User) else {
            return false;
        };
        !turns
            .iter()
            .any(|t| t.role == Role::Assistant && t.reply_to == Some(last_user.id))
    }

    pub fn contains(&self, id: TurnId) -> bool {
        self.log().iter().any(|t| t.id == id)
    }

    /// Snapshot of the raw log.
    pub fn turns(&self) -> Vec<Turn> {
        self.log().clone()
    }

    pub fn len(&self) -> usize {
        self.log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log().is_empty()
    }

    /// Clear the log. Called when a new document replaces the active one.
    pub fn reset(&self) {
        let mut turns = self.log();
        tracing::debug!(cleared = turns.len(), "Conversation thread reset");
        turns.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
