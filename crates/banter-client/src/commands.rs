//! Command channel adapter.
//!
//! Thin typed wrappers over the transport's unary call. Each command stamps
//! the supplied call context into the request header, sends one frame, and
//! maps the single reply into a typed result. Failures are returned to the
//! caller as they are; nothing here retries.

use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use banter_proto::{
    Frame, FrameHeader, Payload, ProtocolError,
    payloads::{
        chat::OutboundMessage,
        friends::FriendRef,
        session::{Login, Register},
    },
};
use tracing::debug;

use crate::{
    error::{RemoteError, StreamError},
    registry::Friend,
    session::{AuthToken, CallContext, hash_password},
    transport::Transport,
};

/// Registration form collected by the interactive loop.
///
/// The password never leaves the process in clear: [`Commands::register`]
/// hashes it before building the wire payload, and `Debug` keeps it out of
/// logs.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterProfile {
    /// Contact email address.
    pub email: String,
    /// Desired unique username.
    pub username: String,
    /// Cleartext password, hashed at send time.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl std::fmt::Debug for RegisterProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterProfile")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// Typed wrappers around the remote command operations.
///
/// Stateless apart from a request id counter; cheap to clone, clones share
/// the counter and the transport.
#[derive(Clone)]
pub struct Commands<T> {
    transport: T,
    next_request_id: Arc<AtomicU32>,
}

impl<T: Transport> Commands<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        Self { transport, next_request_id: Arc::new(AtomicU32::new(1)) }
    }

    /// Log in with an already-hashed password.
    ///
    /// Anonymous call; the header carries no token yet.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Rejected`] with
    /// [`banter_proto::ErrorPayload::INVALID_CREDENTIALS`] when the server
    /// refuses the pair.
    pub async fn login(
        &self,
        username: &str,
        password_hash: Vec<u8>,
    ) -> Result<AuthToken, RemoteError> {
        let payload =
            Payload::Login(Login { username: username.to_owned(), password_hash });
        let reply = self.issue(payload, CallContext::anonymous()).await?;

        match Payload::from_frame(&reply)? {
            Payload::LoginReply(login) => Ok(AuthToken::from(login.token)),
            Payload::Error(err) => Err(err.into()),
            _ => Err(RemoteError::UnexpectedReply {
                expected: "LoginReply",
                opcode: reply.header.opcode(),
            }),
        }
    }

    /// Create an account.
    ///
    /// Hashes the profile's password and sends the registration request
    /// anonymously. A success reply carries no data; logging in afterwards
    /// is a separate call.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Rejected`] with
    /// [`banter_proto::ErrorPayload::ALREADY_EXISTS`] when the username or
    /// email is taken.
    pub async fn register(&self, profile: RegisterProfile) -> Result<(), RemoteError> {
        let payload = Payload::Register(Register {
            email: profile.email,
            username: profile.username,
            password_hash: hash_password(&profile.password),
            first_name: profile.first_name,
            last_name: profile.last_name,
        });
        let reply = self.issue(payload, CallContext::anonymous()).await?;
        expect_ack(&reply)
    }

    /// Send a chat message to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Rejected`] when the recipient is unknown or
    /// the context carries no valid token.
    pub async fn send_message(
        &self,
        ctx: CallContext,
        to: &str,
        data: &str,
    ) -> Result<(), RemoteError> {
        let payload = Payload::SendMessage(OutboundMessage {
            to: to.to_owned(),
            data: data.to_owned(),
        });
        let reply = self.issue(payload, ctx).await?;
        expect_ack(&reply)
    }

    /// Add `username` to the friends list.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Rejected`] when the username is unknown or
    /// already a friend.
    pub async fn add_friend(&self, ctx: CallContext, username: &str) -> Result<(), RemoteError> {
        let payload = Payload::AddFriend(FriendRef { username: username.to_owned() });
        let reply = self.issue(payload, ctx).await?;
        expect_ack(&reply)
    }

    /// Remove `username` from the friends list.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Rejected`] when the username is not a friend.
    pub async fn remove_friend(&self, ctx: CallContext, username: &str) -> Result<(), RemoteError> {
        let payload = Payload::RemoveFriend(FriendRef { username: username.to_owned() });
        let reply = self.issue(payload, ctx).await?;
        expect_ack(&reply)
    }

    /// Fetch the full friends list.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::UnexpectedReply`] if the server answers with
    /// anything but a friend list or an error frame.
    pub async fn list_friends(&self, ctx: CallContext) -> Result<Vec<Friend>, RemoteError> {
        let reply = self.issue(Payload::ListFriends, ctx).await?;

        match Payload::from_frame(&reply)? {
            Payload::FriendList(list) => {
                Ok(list.friends.into_iter().map(Friend::from).collect())
            },
            Payload::Error(err) => Err(err.into()),
            _ => Err(RemoteError::UnexpectedReply {
                expected: "FriendList",
                opcode: reply.header.opcode(),
            }),
        }
    }

    /// Open the presence subscription stream.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Transport`] if the stream cannot be opened.
    pub async fn subscribe_presence(&self, ctx: CallContext) -> Result<T::Source, StreamError> {
        let request = self.request_frame(Payload::SubscribePresence, ctx)?;
        debug!(request_id = request.header.request_id(), "opening presence subscription");
        self.transport.subscribe(request).await
    }

    /// Open the incoming message subscription stream.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Transport`] if the stream cannot be opened.
    pub async fn subscribe_messages(&self, ctx: CallContext) -> Result<T::Source, StreamError> {
        let request = self.request_frame(Payload::SubscribeMessages, ctx)?;
        debug!(request_id = request.header.request_id(), "opening message subscription");
        self.transport.subscribe(request).await
    }

    /// One unary round trip: build the frame, send it, await the reply.
    ///
    /// The reply must echo the request id stamped here; one correlated to
    /// any other request is rejected before its payload is decoded.
    async fn issue(&self, payload: Payload, ctx: CallContext) -> Result<Frame, RemoteError> {
        let request = self.request_frame(payload, ctx)?;
        let sent = request.header.request_id();
        debug!(opcode = request.header.opcode(), request_id = sent, "issuing command");

        let reply = self.transport.call(request).await?;
        let received = reply.header.request_id();
        if received != sent {
            return Err(RemoteError::MismatchedReply { sent, received });
        }
        Ok(reply)
    }

    /// Build a request frame: fresh request id, context stamped in.
    fn request_frame(
        &self,
        payload: Payload,
        ctx: CallContext,
    ) -> Result<Frame, ProtocolError> {
        let mut header = FrameHeader::new(payload.opcode());
        header.set_request_id(self.next_request_id.fetch_add(1, Ordering::Relaxed));
        ctx.stamp(&mut header);
        payload.into_frame(header)
    }
}

/// Map a reply frame that should be a plain acknowledgement.
fn expect_ack(reply: &Frame) -> Result<(), RemoteError> {
    match Payload::from_frame(reply)? {
        Payload::Ack => Ok(()),
        Payload::Error(err) => Err(err.into()),
        _ => Err(RemoteError::UnexpectedReply {
            expected: "Ack",
            opcode: reply.header.opcode(),
        }),
    }
}
