//! Shared friend registry.
//!
//! A `username -> Friend` map shared between the presence synchronizer
//! (writer) and the interactive loop (reader, plus command-path writes for
//! add/remove/refresh). Every access goes through one mutex at whole-map
//! granularity, and readers receive owned snapshots rather than references
//! into the map, so a concurrent replace never invalidates a reader.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use banter_proto::payloads::friends::{FriendEntry, Presence};

/// A friend and their last observed presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Friend {
    /// Unique username; the registry key.
    pub username: String,

    /// Last presence reported by the server. Updated by presence stream
    /// events and full list refreshes; never guessed locally.
    pub presence: Presence,
}

impl Friend {
    /// Friend whose presence has not been observed yet.
    #[must_use]
    pub fn unknown(username: impl Into<String>) -> Self {
        Self { username: username.into(), presence: Presence::Unknown }
    }
}

impl From<FriendEntry> for Friend {
    fn from(entry: FriendEntry) -> Self {
        Self { username: entry.username, presence: entry.status }
    }
}

/// Concurrent-safe handle to the friend registry.
///
/// Cheap to clone; all clones share the same map. The raw map never leaves
/// this module, only owned snapshots of it do.
#[derive(Clone, Default)]
pub struct FriendRegistry {
    inner: Arc<Mutex<HashMap<String, Friend>>>,
}

impl FriendRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire registry with the given friends.
    ///
    /// The swap happens under one critical section: a concurrent reader
    /// observes either the old map or the new one, never a mix. Usernames
    /// absent from `friends` are gone afterwards, stale presence included.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned (a task panicked while
    /// holding the lock).
    #[allow(clippy::expect_used)]
    pub fn replace_all(&self, friends: Vec<Friend>) {
        let map = friends.into_iter().map(|f| (f.username.clone(), f)).collect();
        *self.inner.lock().expect("Mutex poisoned") = map;
    }

    /// Insert a friend unless the username is already present.
    ///
    /// An existing entry keeps its current presence; a freshly added friend
    /// typically starts at [`Presence::Unknown`]. Returns `true` if the
    /// entry was inserted.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned (a task panicked while
    /// holding the lock).
    #[allow(clippy::expect_used)]
    pub fn insert(&self, friend: Friend) -> bool {
        let mut map = self.inner.lock().expect("Mutex poisoned");
        match map.entry(friend.username.clone()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(friend);
                true
            },
        }
    }

    /// Remove a friend. Returns `true` if an entry existed.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned (a task panicked while
    /// holding the lock).
    #[allow(clippy::expect_used)]
    pub fn remove(&self, username: &str) -> bool {
        self.inner.lock().expect("Mutex poisoned").remove(username).is_some()
    }

    /// Apply a presence update to an existing friend.
    ///
    /// Returns `false` if the username is not in the registry; the update
    /// is dropped rather than creating an entry out of order. The update
    /// is atomic: no reader sees the friend half-written.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned (a task panicked while
    /// holding the lock).
    #[allow(clippy::expect_used)]
    pub fn apply_presence(&self, username: &str, status: Presence) -> bool {
        match self.inner.lock().expect("Mutex poisoned").get_mut(username) {
            Some(friend) => {
                friend.presence = status;
                true
            },
            None => false,
        }
    }

    /// Owned snapshot of all friends, sorted by username.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned (a task panicked while
    /// holding the lock).
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn snapshot(&self) -> Vec<Friend> {
        let mut friends: Vec<Friend> =
            self.inner.lock().expect("Mutex poisoned").values().cloned().collect();
        friends.sort_by(|a, b| a.username.cmp(&b.username));
        friends
    }

    /// Current presence of a friend, if registered.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned (a task panicked while
    /// holding the lock).
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn presence_of(&self, username: &str) -> Option<Presence> {
        self.inner.lock().expect("Mutex poisoned").get(username).map(|f| f.presence)
    }

    /// Whether a username is registered.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned (a task panicked while
    /// holding the lock).
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn contains(&self, username: &str) -> bool {
        self.inner.lock().expect("Mutex poisoned").contains_key(username)
    }

    /// Number of registered friends.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned (a task panicked while
    /// holding the lock).
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").len()
    }

    /// Whether the registry holds no friends.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
