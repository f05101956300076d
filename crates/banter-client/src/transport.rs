//! Transport seam between the client core and the network.
//!
//! The [`Transport`] trait decouples the command adapter and the stream
//! synchronizers from any particular connection. The production
//! implementation is the QUIC connection behind the `quic` feature; tests
//! drive the same core through channel-backed implementations.

use std::future::Future;

use banter_proto::Frame;
use tokio::sync::mpsc;

use crate::error::{RemoteError, StreamError};

/// Receiving side of an open subscription stream.
///
/// Yields server-pushed frames in arrival order. `Ok(None)` is the clean
/// end of the stream; an error is terminal. A source is consumed by exactly
/// one pump task and is not polled again after `None` or an error.
pub trait FrameSource: Send + 'static {
    /// Receive the next pushed frame.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] if the stream reset or the connection was
    /// lost mid-stream.
    fn next_frame(&mut self) -> impl Future<Output = Result<Option<Frame>, StreamError>> + Send;
}

/// Connection the client core talks through.
///
/// Two call shapes cover every remote operation:
///
/// - **Unary call**: send one request frame, await its single reply frame.
///   The reply echoes the request id; callers reject replies that do not.
/// - **Subscription**: send one request frame, receive pushed frames until
///   the server ends the stream.
///
/// Implementations are cheap to clone; clones share the underlying
/// connection.
pub trait Transport: Clone + Send + Sync + 'static {
    /// Stream type produced by [`Transport::subscribe`].
    type Source: FrameSource;

    /// Issue a unary call.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Transport`] if the connection fails before
    /// the reply arrives.
    fn call(&self, request: Frame) -> impl Future<Output = Result<Frame, RemoteError>> + Send;

    /// Open a subscription stream.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Transport`] if the stream cannot be opened
    /// or the request cannot be sent.
    fn subscribe(
        &self,
        request: Frame,
    ) -> impl Future<Output = Result<Self::Source, StreamError>> + Send;
}

/// Channel-backed frame source for tests and in-process harnesses.
///
/// Dropping every sender ends the stream cleanly.
impl FrameSource for mpsc::Receiver<Frame> {
    async fn next_frame(&mut self) -> Result<Option<Frame>, StreamError> {
        Ok(self.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use banter_proto::{FrameHeader, Opcode};

    use super::*;

    #[tokio::test]
    async fn channel_source_yields_frames_in_order() {
        let (tx, mut rx) = mpsc::channel(4);

        for opcode in [Opcode::PresenceUpdate, Opcode::InboundMessage] {
            let frame = Frame::new(FrameHeader::new(opcode), bytes::Bytes::new());
            tx.send(frame).await.expect("send");
        }

        let first = rx.next_frame().await.expect("recv").expect("frame");
        assert_eq!(first.header.opcode_enum(), Some(Opcode::PresenceUpdate));

        let second = rx.next_frame().await.expect("recv").expect("frame");
        assert_eq!(second.header.opcode_enum(), Some(Opcode::InboundMessage));
    }

    #[tokio::test]
    async fn dropped_sender_is_clean_close() {
        let (tx, mut rx) = mpsc::channel::<Frame>(1);
        drop(tx);

        assert_eq!(rx.next_frame().await, Ok(None));
    }
}
