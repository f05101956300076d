//! Banter client core.
//!
//! Live-state synchronization layer for the Banter chat client: it owns the
//! authenticated session, issues commands, and keeps local state in step
//! with the two server-pushed feeds (incoming messages and friend
//! presence) while the interactive loop concurrently reads and mutates
//! that state.
//!
//! # Architecture
//!
//! Commands are one-shot request/reply calls issued through the
//! [`Transport`] seam with the session's credentials stamped into the
//! frame header. Independently, two pump tasks consume the long-lived
//! subscription streams and merge their events into shared, mutex-guarded
//! stores. Readers always get owned snapshots, so the interactive loop
//! never holds a lock while rendering.
//!
//! # Components
//!
//! - [`Client`]: facade owning everything below, the surface for the
//!   interactive loop
//! - [`Session`]: write-once authenticated identity and call context
//! - [`Commands`]: typed wrappers around the remote command operations
//! - [`FriendRegistry`] / [`ConversationStore`]: shared state written by
//!   the synchronizers and read by the loop
//! - [`PresenceSync`] / [`MessageSync`]: the stream synchronizers
//! - [`Transport`] / [`FrameSource`]: the seam a connection implements
//!
//! # QUIC (optional)
//!
//! With the `quic` feature enabled, this crate also provides:
//! - [`quic::connect`]: connect to a server
//! - [`quic::Connection`]: the production [`Transport`] implementation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod commands;
mod conversations;
mod error;
mod registry;
mod session;
mod sync;
mod transport;

#[cfg(feature = "quic")]
pub mod quic;

pub use banter_proto::payloads::friends::Presence;
pub use client::{Client, ClientConfig};
pub use commands::{Commands, RegisterProfile};
pub use conversations::{ConversationStore, StoredMessage};
pub use error::{AuthError, RemoteError, StreamError};
pub use registry::{Friend, FriendRegistry};
pub use session::{AuthToken, CallContext, Session, hash_password};
pub use sync::{MessageSync, Notification, PresenceSync, SyncState};
pub use transport::{FrameSource, Transport};
