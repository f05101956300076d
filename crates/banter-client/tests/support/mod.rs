//! Scripted in-process chat server backing the integration scenarios.
//!
//! Implements [`Transport`] over channels: unary calls are answered by a
//! one-account server with real login/friend semantics, and the two
//! subscription feeds are channels the test pushes frames into. No network
//! is involved, so every scenario is deterministic.

use std::sync::{Arc, Mutex};

use banter_client::{RemoteError, StreamError, Transport, hash_password};
use banter_proto::{
    ErrorPayload, Frame, FrameHeader, Opcode, Payload,
    payloads::{
        chat::{InboundMessage, OutboundMessage},
        friends::{FriendEntry, Presence, PresenceUpdate},
        session::LoginReply,
    },
};
use tokio::sync::mpsc;

const TOKEN: [u8; 16] = [0xA7; 16];

/// In-process server with exactly one registered account.
#[derive(Clone)]
pub struct TestServer {
    inner: Arc<Inner>,
}

struct Inner {
    username: String,
    password_hash: Vec<u8>,

    friends: Mutex<Vec<FriendEntry>>,
    sent: Mutex<Vec<OutboundMessage>>,
    added: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    registered: Mutex<Vec<String>>,

    presence_tx: Mutex<Option<mpsc::Sender<Frame>>>,
    presence_rx: Mutex<Option<mpsc::Receiver<Frame>>>,
    message_tx: Mutex<Option<mpsc::Sender<Frame>>>,
    message_rx: Mutex<Option<mpsc::Receiver<Frame>>>,
}

impl TestServer {
    /// Server that accepts exactly this username/password pair.
    pub fn new(username: &str, password: &str) -> Self {
        let (presence_tx, presence_rx) = mpsc::channel(32);
        let (message_tx, message_rx) = mpsc::channel(32);

        Self {
            inner: Arc::new(Inner {
                username: username.to_owned(),
                password_hash: hash_password(password),
                friends: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                added: Mutex::new(Vec::new()),
                removed: Mutex::new(Vec::new()),
                registered: Mutex::new(Vec::new()),
                presence_tx: Mutex::new(Some(presence_tx)),
                presence_rx: Mutex::new(Some(presence_rx)),
                message_tx: Mutex::new(Some(message_tx)),
                message_rx: Mutex::new(Some(message_rx)),
            }),
        }
    }

    /// Replace the server-side friends list answered to ListFriends.
    pub fn set_friends(&self, friends: &[(&str, Presence)]) {
        *self.inner.friends.lock().unwrap() = friends
            .iter()
            .map(|(username, status)| FriendEntry {
                username: (*username).to_owned(),
                status: *status,
            })
            .collect();
    }

    /// Push a presence update onto the presence feed.
    pub async fn push_presence(&self, username: &str, status: Presence) {
        let frame = Payload::PresenceUpdate(PresenceUpdate {
            username: username.to_owned(),
            status,
        })
        .into_frame(FrameHeader::new(Opcode::PresenceUpdate))
        .unwrap();

        let tx = self.inner.presence_tx.lock().unwrap().clone();
        tx.expect("presence feed closed").send(frame).await.unwrap();
    }

    /// Push an inbound chat message onto the message feed.
    pub async fn push_message(&self, from: &str, data: &str) {
        let frame = Payload::InboundMessage(InboundMessage {
            from: from.to_owned(),
            data: data.to_owned(),
        })
        .into_frame(FrameHeader::new(Opcode::InboundMessage))
        .unwrap();

        let tx = self.inner.message_tx.lock().unwrap().clone();
        tx.expect("message feed closed").send(frame).await.unwrap();
    }

    /// End the presence feed cleanly (frames already pushed still arrive).
    pub fn close_presence_feed(&self) {
        self.inner.presence_tx.lock().unwrap().take();
    }

    /// End the message feed cleanly (frames already pushed still arrive).
    pub fn close_message_feed(&self) {
        self.inner.message_tx.lock().unwrap().take();
    }

    /// Messages the server accepted from SendMessage calls.
    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.inner.sent.lock().unwrap().clone()
    }

    /// Usernames accepted from AddFriend calls.
    pub fn added_friends(&self) -> Vec<String> {
        self.inner.added.lock().unwrap().clone()
    }

    /// Usernames accepted from RemoveFriend calls.
    pub fn removed_friends(&self) -> Vec<String> {
        self.inner.removed.lock().unwrap().clone()
    }

    /// Usernames accepted from Register calls.
    pub fn registered_accounts(&self) -> Vec<String> {
        self.inner.registered.lock().unwrap().clone()
    }
}

impl Transport for TestServer {
    type Source = mpsc::Receiver<Frame>;

    async fn call(&self, request: Frame) -> Result<Frame, RemoteError> {
        let inner = &self.inner;

        match Payload::from_frame(&request)? {
            Payload::Login(login) => {
                if login.username == inner.username
                    && login.password_hash == inner.password_hash
                {
                    reply(&request, Payload::LoginReply(LoginReply { token: TOKEN }))
                } else {
                    reply(&request, Payload::Error(ErrorPayload::invalid_credentials()))
                }
            },

            Payload::Register(register) => {
                if register.username == inner.username {
                    reply(
                        &request,
                        Payload::Error(ErrorPayload::already_exists("username taken")),
                    )
                } else {
                    inner.registered.lock().unwrap().push(register.username);
                    reply(&request, Payload::Ack)
                }
            },

            other => {
                if request.header.token() != Some(TOKEN) {
                    return reply(&request, Payload::Error(ErrorPayload::auth_required()));
                }

                match other {
                    Payload::SendMessage(message) => {
                        inner.sent.lock().unwrap().push(message);
                        reply(&request, Payload::Ack)
                    },

                    Payload::AddFriend(friend) => {
                        let mut friends = inner.friends.lock().unwrap();
                        if friends.iter().any(|f| f.username == friend.username) {
                            drop(friends);
                            return reply(
                                &request,
                                Payload::Error(ErrorPayload::already_exists("already a friend")),
                            );
                        }
                        friends.push(FriendEntry {
                            username: friend.username.clone(),
                            status: Presence::Unknown,
                        });
                        drop(friends);

                        inner.added.lock().unwrap().push(friend.username);
                        reply(&request, Payload::Ack)
                    },

                    Payload::RemoveFriend(friend) => {
                        let mut friends = inner.friends.lock().unwrap();
                        let before = friends.len();
                        friends.retain(|f| f.username != friend.username);
                        let removed = friends.len() < before;
                        drop(friends);

                        if removed {
                            inner.removed.lock().unwrap().push(friend.username);
                            reply(&request, Payload::Ack)
                        } else {
                            reply(
                                &request,
                                Payload::Error(ErrorPayload::unknown_user(friend.username)),
                            )
                        }
                    },

                    Payload::ListFriends => {
                        let friends = inner.friends.lock().unwrap().clone();
                        reply(
                            &request,
                            Payload::FriendList(banter_proto::payloads::friends::FriendList {
                                friends,
                            }),
                        )
                    },

                    unexpected => reply(
                        &request,
                        Payload::Error(ErrorPayload::invalid_payload(format!(
                            "not a command: {:#06x}",
                            unexpected.opcode().to_u16()
                        ))),
                    ),
                }
            },
        }
    }

    async fn subscribe(&self, request: Frame) -> Result<Self::Source, StreamError> {
        let authorized = request.header.token() == Some(TOKEN);

        match request.header.opcode_enum() {
            Some(Opcode::SubscribePresence) => {
                if !authorized {
                    return Ok(rejected_feed(ErrorPayload::auth_required()));
                }
                Ok(self
                    .inner
                    .presence_rx
                    .lock()
                    .unwrap()
                    .take()
                    .unwrap_or_else(|| {
                        rejected_feed(ErrorPayload::internal("presence feed already taken"))
                    }))
            },

            Some(Opcode::SubscribeMessages) => {
                if !authorized {
                    return Ok(rejected_feed(ErrorPayload::auth_required()));
                }
                Ok(self
                    .inner
                    .message_rx
                    .lock()
                    .unwrap()
                    .take()
                    .unwrap_or_else(|| {
                        rejected_feed(ErrorPayload::internal("message feed already taken"))
                    }))
            },

            _ => Ok(rejected_feed(ErrorPayload::invalid_payload("not a subscription"))),
        }
    }
}

/// Reply frame echoing the request id.
fn reply(request: &Frame, payload: Payload) -> Result<Frame, RemoteError> {
    let mut header = FrameHeader::new(payload.opcode());
    header.set_request_id(request.header.request_id());
    Ok(payload.into_frame(header)?)
}

/// Feed that delivers one error frame and then ends.
fn rejected_feed(err: ErrorPayload) -> mpsc::Receiver<Frame> {
    let (tx, rx) = mpsc::channel(1);
    let frame = Payload::Error(err)
        .into_frame(FrameHeader::new(Opcode::Error))
        .unwrap();
    tx.try_send(frame).unwrap();
    rx
}
