//! Chat message payload types.

use serde::{Deserialize, Serialize};

/// Outgoing direct message.
///
/// Transient: constructed per send, not retained after the call completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Recipient username.
    pub to: String,
    /// Message text.
    pub data: String,
}

/// Server-pushed incoming message, delivered on the message feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Sender username.
    pub from: String,
    /// Message text.
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_serde() {
        let msg = OutboundMessage { to: "bob".to_string(), data: "hi".to_string() };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&msg, &mut bytes).expect("encode");

        let decoded: OutboundMessage = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(msg, decoded);
    }

    #[test]
    fn inbound_serde() {
        let msg = InboundMessage { from: "bob".to_string(), data: "hello back".to_string() };

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&msg, &mut bytes).expect("encode");

        let decoded: InboundMessage = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(msg, decoded);
    }
}
