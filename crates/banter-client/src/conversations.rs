//! Per-peer conversation store.
//!
//! Received chat messages, keyed by peer username and kept in arrival
//! order. The message synchronizer appends; the interactive loop reads
//! owned copies. Retention is a capped ring per peer: once a conversation
//! reaches the history limit, the oldest message is evicted for each new
//! one, so a chatty peer cannot grow memory without bound.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

/// One received message as kept in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Username of the peer the message came from.
    pub sender: String,

    /// Message text as received.
    pub body: String,
}

/// Concurrent-safe handle to the conversation store.
///
/// Cheap to clone; all clones share the same conversations.
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    /// Per-peer retention cap, fixed at construction.
    limit: usize,
    conversations: HashMap<String, VecDeque<StoredMessage>>,
}

impl ConversationStore {
    /// Default per-peer retention cap.
    pub const DEFAULT_HISTORY_LIMIT: usize = 512;

    /// Create a store with the default per-peer cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_limit(Self::DEFAULT_HISTORY_LIMIT)
    }

    /// Create a store keeping at most `limit` messages per peer.
    ///
    /// A limit of zero is clamped to one so an append is never a no-op.
    #[must_use]
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                limit: limit.max(1),
                conversations: HashMap::new(),
            })),
        }
    }

    /// Append a message received from `from`.
    ///
    /// The conversation is created on first use. If it is at the cap, the
    /// oldest message is evicted first; other peers are unaffected.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned (a task panicked while holding
    /// the lock).
    #[allow(clippy::expect_used)]
    pub fn append(&self, from: &str, body: impl Into<String>) {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        let limit = inner.limit;

        let messages = inner.conversations.entry(from.to_owned()).or_default();
        if messages.len() == limit {
            messages.pop_front();
        }
        messages.push_back(StoredMessage { sender: from.to_owned(), body: body.into() });

        debug_assert!(messages.len() <= limit);
    }

    /// Owned copy of the conversation with `peer`, oldest first.
    ///
    /// Empty if no message from that peer has been stored.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned (a task panicked while holding
    /// the lock).
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn messages(&self, peer: &str) -> Vec<StoredMessage> {
        self.inner
            .lock()
            .expect("Mutex poisoned")
            .conversations
            .get(peer)
            .map(|messages| messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Peers with at least one stored message, sorted by username.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned (a task panicked while holding
    /// the lock).
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> =
            self.inner.lock().expect("Mutex poisoned").conversations.keys().cloned().collect();
        peers.sort_unstable();
        peers
    }

    /// Number of stored messages from `peer`.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned (a task panicked while holding
    /// the lock).
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn message_count(&self, peer: &str) -> usize {
        self.inner
            .lock()
            .expect("Mutex poisoned")
            .conversations
            .get(peer)
            .map_or(0, VecDeque::len)
    }

    /// Whether no messages have been stored at all.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned (a task panicked while holding
    /// the lock).
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().expect("Mutex poisoned").conversations.is_empty()
    }

    /// The per-peer retention cap this store was built with.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned (a task panicked while holding
    /// the lock).
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn history_limit(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").limit
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_empty() {
        let store = ConversationStore::new();
        assert!(store.is_empty());
        assert!(store.peers().is_empty());
        assert!(store.messages("bob").is_empty());
        assert_eq!(store.message_count("bob"), 0);
        assert_eq!(store.history_limit(), ConversationStore::DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn append_creates_conversation_lazily() {
        let store = ConversationStore::new();
        store.append("bob", "hi");

        assert!(!store.is_empty());
        assert_eq!(store.peers(), vec!["bob"]);
        assert_eq!(store.message_count("bob"), 1);
    }

    #[test]
    fn messages_keep_arrival_order() {
        let store = ConversationStore::new();
        for body in ["one", "two", "three"] {
            store.append("bob", body);
        }

        let bodies: Vec<_> =
            store.messages("bob").into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec!["one", "two", "three"]);
    }

    #[test]
    fn messages_are_tagged_with_sender() {
        let store = ConversationStore::new();
        store.append("bob", "hi");

        let messages = store.messages("bob");
        assert_eq!(messages[0], StoredMessage { sender: "bob".to_owned(), body: "hi".to_owned() });
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let store = ConversationStore::with_history_limit(3);
        for body in ["a", "b", "c", "d", "e"] {
            store.append("bob", body);
        }

        let bodies: Vec<_> =
            store.messages("bob").into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec!["c", "d", "e"]);
        assert_eq!(store.message_count("bob"), 3);
    }

    #[test]
    fn eviction_is_per_peer() {
        let store = ConversationStore::with_history_limit(2);
        store.append("alice", "only one");
        for body in ["a", "b", "c"] {
            store.append("bob", body);
        }

        assert_eq!(store.message_count("alice"), 1);
        assert_eq!(store.message_count("bob"), 2);
        assert_eq!(store.messages("alice")[0].body, "only one");
    }

    #[test]
    fn zero_limit_is_clamped() {
        let store = ConversationStore::with_history_limit(0);
        store.append("bob", "hi");

        assert_eq!(store.history_limit(), 1);
        assert_eq!(store.message_count("bob"), 1);
    }

    #[test]
    fn peers_are_sorted() {
        let store = ConversationStore::new();
        for peer in ["mallory", "alice", "bob"] {
            store.append(peer, "hi");
        }

        assert_eq!(store.peers(), vec!["alice", "bob", "mallory"]);
    }

    #[test]
    fn clones_share_state() {
        let store = ConversationStore::new();
        let writer = store.clone();

        writer.append("bob", "hi");
        assert_eq!(store.message_count("bob"), 1);
    }
}
