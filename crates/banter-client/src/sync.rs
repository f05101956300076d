//! Stream synchronizers.
//!
//! Two long-lived pump tasks keep local state in step with the server: the
//! presence synchronizer merges the presence feed into the friend registry,
//! and the message synchronizer appends the message feed to the
//! conversation store. Each runs until its stream ends and never
//! reconnects; the terminal outcome stays observable through a watch
//! channel.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use banter_proto::{Frame, Payload};
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace, warn};

use crate::{
    conversations::ConversationStore,
    error::StreamError,
    registry::FriendRegistry,
    transport::FrameSource,
};

/// Lifecycle of a stream synchronizer.
///
/// Moves strictly forward: `Idle` until started, `Streaming` while the pump
/// consumes the feed, `Closed` once the stream ends for any reason. There
/// is no transition out of `Closed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Not started yet.
    #[default]
    Idle,

    /// Pump task is consuming the stream.
    Streaming,

    /// Stream ended; no reconnect is attempted.
    Closed {
        /// Terminal error, `None` after a clean server close.
        error: Option<StreamError>,
    },
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Streaming => f.write_str("streaming"),
            Self::Closed { error: None } => f.write_str("closed"),
            Self::Closed { error: Some(err) } => write!(f, "closed: {err}"),
        }
    }
}

/// Advisory signals emitted by the message synchronizer.
///
/// Best-effort: a dropped or lagged notification never affects what is in
/// the conversation store, it only means the UI repaints later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A message from this peer was appended to its conversation.
    MessageReceived {
        /// Username the message came from.
        from: String,
    },
}

/// Presence stream synchronizer.
///
/// Consumes `PresenceUpdate` frames and patches the friend registry.
/// Updates for usernames the registry does not hold are dropped, so
/// presence alone never creates a friend out of order.
#[derive(Clone)]
pub struct PresenceSync {
    registry: FriendRegistry,
    started: Arc<AtomicBool>,
    state: watch::Sender<SyncState>,
}

impl PresenceSync {
    /// Create an idle synchronizer writing into `registry`.
    #[must_use]
    pub fn new(registry: FriendRegistry) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self { registry, started: Arc::new(AtomicBool::new(false)), state }
    }

    /// Spawn the pump task over an already-opened presence stream.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::AlreadyStarted`] on every call after the
    /// first; the running pump is undisturbed and nothing is spawned.
    pub fn start<S: FrameSource>(&self, source: S) -> Result<(), StreamError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(StreamError::AlreadyStarted);
        }

        self.state.send_replace(SyncState::Streaming);
        tokio::spawn(run_presence_pump(source, self.registry.clone(), self.state.clone()));
        Ok(())
    }

    /// Whether `start` has been called.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Watch handle observing the synchronizer lifecycle.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }
}

/// Notification stream synchronizer.
///
/// Consumes `InboundMessage` frames, appends them to the conversation
/// store in stream order, and emits an advisory [`Notification`] per
/// message.
#[derive(Clone)]
pub struct MessageSync {
    conversations: ConversationStore,
    notify: broadcast::Sender<Notification>,
    started: Arc<AtomicBool>,
    state: watch::Sender<SyncState>,
}

impl MessageSync {
    /// Create an idle synchronizer writing into `conversations`.
    ///
    /// `notify` carries the advisory signals; it may have zero receivers.
    #[must_use]
    pub fn new(conversations: ConversationStore, notify: broadcast::Sender<Notification>) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self { conversations, notify, started: Arc::new(AtomicBool::new(false)), state }
    }

    /// Spawn the pump task over an already-opened message stream.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::AlreadyStarted`] on every call after the
    /// first; the running pump is undisturbed and nothing is spawned.
    pub fn start<S: FrameSource>(&self, source: S) -> Result<(), StreamError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(StreamError::AlreadyStarted);
        }

        self.state.send_replace(SyncState::Streaming);
        tokio::spawn(run_message_pump(
            source,
            self.conversations.clone(),
            self.notify.clone(),
            self.state.clone(),
        ));
        Ok(())
    }

    /// Whether `start` has been called.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Watch handle observing the synchronizer lifecycle.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }
}

async fn run_presence_pump<S: FrameSource>(
    mut source: S,
    registry: FriendRegistry,
    state: watch::Sender<SyncState>,
) {
    let error = loop {
        match source.next_frame().await {
            Ok(Some(frame)) => {
                if let Some(err) = apply_presence_frame(&frame, &registry) {
                    break Some(err);
                }
            },
            Ok(None) => break None,
            Err(err) => break Some(err),
        }
    };

    match &error {
        Some(err) => warn!(error = %err, "presence stream closed"),
        None => debug!("presence stream ended"),
    }
    state.send_replace(SyncState::Closed { error });
}

/// Merge one presence frame into the registry. `Some` is a terminal error.
fn apply_presence_frame(frame: &Frame, registry: &FriendRegistry) -> Option<StreamError> {
    match Payload::from_frame(frame) {
        Ok(Payload::PresenceUpdate(update)) => {
            if registry.apply_presence(&update.username, update.status) {
                debug!(username = %update.username, status = ?update.status, "presence updated");
            } else {
                trace!(username = %update.username, "dropped presence update for unknown username");
            }
            None
        },
        Ok(Payload::Error(err)) => Some(StreamError::from(err)),
        Ok(_) => Some(StreamError::UnexpectedFrame {
            expected: "PresenceUpdate",
            opcode: frame.header.opcode(),
        }),
        Err(err) => Some(StreamError::Protocol(err)),
    }
}

async fn run_message_pump<S: FrameSource>(
    mut source: S,
    conversations: ConversationStore,
    notify: broadcast::Sender<Notification>,
    state: watch::Sender<SyncState>,
) {
    let error = loop {
        match source.next_frame().await {
            Ok(Some(frame)) => {
                if let Some(err) = apply_message_frame(&frame, &conversations, &notify) {
                    break Some(err);
                }
            },
            Ok(None) => break None,
            Err(err) => break Some(err),
        }
    };

    match &error {
        Some(err) => warn!(error = %err, "message stream closed"),
        None => debug!("message stream ended"),
    }
    state.send_replace(SyncState::Closed { error });
}

/// Append one inbound message frame. `Some` is a terminal error.
fn apply_message_frame(
    frame: &Frame,
    conversations: &ConversationStore,
    notify: &broadcast::Sender<Notification>,
) -> Option<StreamError> {
    match Payload::from_frame(frame) {
        Ok(Payload::InboundMessage(message)) => {
            debug!(from = %message.from, bytes = message.data.len(), "message received");
            conversations.append(&message.from, message.data);

            // Advisory only: send fails when nobody is subscribed.
            let _ = notify.send(Notification::MessageReceived { from: message.from });
            None
        },
        Ok(Payload::Error(err)) => Some(StreamError::from(err)),
        Ok(_) => Some(StreamError::UnexpectedFrame {
            expected: "InboundMessage",
            opcode: frame.header.opcode(),
        }),
        Err(err) => Some(StreamError::Protocol(err)),
    }
}
