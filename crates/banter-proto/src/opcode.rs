//! Operation codes identifying frame payload types.

/// Frame operation code.
///
/// The opcode in the frame header decides how payload bytes are decoded.
/// Codes are grouped by range: session (0x000x), generic replies (0x001x),
/// chat (0x002x), friends and presence (0x003x), errors (0x00FF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    // Session
    /// Credentials login request.
    Login = 0x0001,
    /// Login response carrying the session token.
    LoginReply = 0x0002,
    /// Account registration request.
    Register = 0x0003,

    // Generic replies
    /// Success acknowledgement (zero-byte payload).
    Ack = 0x0010,

    // Chat
    /// Send a chat message to another user.
    SendMessage = 0x0020,
    /// Subscribe to the incoming message feed.
    SubscribeMessages = 0x0021,
    /// Server-pushed incoming chat message.
    InboundMessage = 0x0022,

    // Friends and presence
    /// Add a user to the friends list.
    AddFriend = 0x0030,
    /// Remove a user from the friends list.
    RemoveFriend = 0x0031,
    /// Request the full friends list.
    ListFriends = 0x0032,
    /// Full friends list response.
    FriendList = 0x0033,
    /// Subscribe to the presence feed.
    SubscribePresence = 0x0034,
    /// Server-pushed presence change.
    PresenceUpdate = 0x0035,

    // Error frame
    /// Error response.
    Error = 0x00FF,
}

impl Opcode {
    /// Raw u16 wire value.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Parse a wire value. `None` if unrecognized.
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Login),
            0x0002 => Some(Self::LoginReply),
            0x0003 => Some(Self::Register),
            0x0010 => Some(Self::Ack),
            0x0020 => Some(Self::SendMessage),
            0x0021 => Some(Self::SubscribeMessages),
            0x0022 => Some(Self::InboundMessage),
            0x0030 => Some(Self::AddFriend),
            0x0031 => Some(Self::RemoveFriend),
            0x0032 => Some(Self::ListFriends),
            0x0033 => Some(Self::FriendList),
            0x0034 => Some(Self::SubscribePresence),
            0x0035 => Some(Self::PresenceUpdate),
            0x00FF => Some(Self::Error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Opcode; 14] = [
        Opcode::Login,
        Opcode::LoginReply,
        Opcode::Register,
        Opcode::Ack,
        Opcode::SendMessage,
        Opcode::SubscribeMessages,
        Opcode::InboundMessage,
        Opcode::AddFriend,
        Opcode::RemoveFriend,
        Opcode::ListFriends,
        Opcode::FriendList,
        Opcode::SubscribePresence,
        Opcode::PresenceUpdate,
        Opcode::Error,
    ];

    #[test]
    fn opcode_round_trip() {
        for opcode in ALL {
            assert_eq!(Opcode::from_u16(opcode.to_u16()), Some(opcode));
        }
    }

    #[test]
    fn unknown_opcode_rejected() {
        assert_eq!(Opcode::from_u16(0x0000), None);
        assert_eq!(Opcode::from_u16(0x1234), None);
        assert_eq!(Opcode::from_u16(0xFFFF), None);
    }
}
