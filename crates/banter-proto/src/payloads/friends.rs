//! Friends list and presence payload types.

use serde::{Deserialize, Serialize};

/// Presence status as reported by the server.
///
/// `Unknown` is the client-side default for friends the server has not yet
/// reported on (e.g. just-added friends).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    /// No presence information available.
    #[default]
    Unknown,
    /// User is connected.
    Online,
    /// User is disconnected.
    Offline,
    /// User is connected but idle.
    Away,
}

/// Reference to a user by name. Request body for add/remove friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRef {
    /// Target username.
    pub username: String,
}

/// One entry of the friends list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendEntry {
    /// Friend's username.
    pub username: String,
    /// Presence at the time the list was assembled.
    pub status: Presence,
}

/// Full friends list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendList {
    /// All friends of the authenticated user.
    pub friends: Vec<FriendEntry>,
}

/// Presence change event, delivered on the presence feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    /// User whose presence changed.
    pub username: String,
    /// New presence status.
    pub status: Presence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friend_list_serde() {
        let list = FriendList {
            friends: vec![
                FriendEntry { username: "bob".to_string(), status: Presence::Offline },
                FriendEntry { username: "carol".to_string(), status: Presence::Online },
            ],
        };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&list, &mut bytes).expect("encode");

        let decoded: FriendList = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(list, decoded);
    }

    #[test]
    fn presence_update_serde() {
        let update = PresenceUpdate { username: "bob".to_string(), status: Presence::Away };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&update, &mut bytes).expect("encode");

        let decoded: PresenceUpdate = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(update, decoded);
    }

    #[test]
    fn presence_defaults_to_unknown() {
        assert_eq!(Presence::default(), Presence::Unknown);
    }
}
