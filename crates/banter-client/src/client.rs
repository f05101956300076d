//! Client facade.
//!
//! [`Client`] owns the session, the command adapter, the two shared stores,
//! and the two stream synchronizers, and exposes the whole surface the
//! interactive loop needs. The loop issues commands and reads snapshots;
//! the synchronizers write into the same stores from their pump tasks.

use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::{
    commands::{Commands, RegisterProfile},
    conversations::{ConversationStore, StoredMessage},
    error::{AuthError, RemoteError, StreamError},
    registry::{Friend, FriendRegistry},
    session::Session,
    sync::{MessageSync, Notification, PresenceSync, SyncState},
    transport::Transport,
};

/// Tunables for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-peer conversation retention cap.
    pub history_limit: usize,

    /// Capacity of the advisory notification channel. Slow receivers lag
    /// and miss signals; stored state is unaffected.
    pub notify_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            history_limit: ConversationStore::DEFAULT_HISTORY_LIMIT,
            notify_capacity: 64,
        }
    }
}

/// Live-state synchronization core for one connection.
///
/// Commands go out through the transport with the session's credentials;
/// the presence and message feeds come back in through the synchronizers.
/// Every query returns an owned snapshot, safe to hold across awaits.
#[derive(Clone)]
pub struct Client<T: Transport> {
    session: Session,
    commands: Commands<T>,
    registry: FriendRegistry,
    conversations: ConversationStore,
    presence_sync: PresenceSync,
    message_sync: MessageSync,
    notify: broadcast::Sender<Notification>,
}

impl<T: Transport> Client<T> {
    /// Client with default configuration over `transport`.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Client with explicit configuration over `transport`.
    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        let registry = FriendRegistry::new();
        let conversations = ConversationStore::with_history_limit(config.history_limit);
        let (notify, _) = broadcast::channel(config.notify_capacity.max(1));

        Self {
            session: Session::new(),
            commands: Commands::new(transport),
            presence_sync: PresenceSync::new(registry.clone()),
            message_sync: MessageSync::new(conversations.clone(), notify.clone()),
            registry,
            conversations,
            notify,
        }
    }

    /// Authenticate and freeze the session identity.
    ///
    /// Fetching the friends list and starting the synchronizers are
    /// separate calls, so each failure surfaces on its own.
    ///
    /// # Errors
    ///
    /// See [`Session::authenticate`].
    pub async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        self.session.authenticate(&self.commands, username, password).await?;
        info!(username = %username, "logged in");
        Ok(())
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// See [`Commands::register`].
    pub async fn register(&self, profile: RegisterProfile) -> Result<(), RemoteError> {
        self.commands.register(profile).await
    }

    /// Fetch the friends list and replace the registry with it.
    ///
    /// Returns the number of friends now registered. On failure the
    /// registry keeps its previous contents.
    ///
    /// # Errors
    ///
    /// See [`Commands::list_friends`].
    pub async fn refresh_friends(&self) -> Result<usize, RemoteError> {
        let friends = self.commands.list_friends(self.session.call_context()).await?;
        let count = friends.len();
        self.registry.replace_all(friends);
        debug!(count, "friends list refreshed");
        Ok(count)
    }

    /// Send a chat message to `to`.
    ///
    /// The outbound message is not retained locally; conversations hold
    /// received messages only.
    ///
    /// # Errors
    ///
    /// See [`Commands::send_message`].
    pub async fn send_message(&self, to: &str, data: &str) -> Result<(), RemoteError> {
        self.commands.send_message(self.session.call_context(), to, data).await
    }

    /// Add a friend; on success the registry gains an entry with unknown
    /// presence (the next full refresh or presence update fills it in).
    ///
    /// # Errors
    ///
    /// See [`Commands::add_friend`].
    pub async fn add_friend(&self, username: &str) -> Result<(), RemoteError> {
        self.commands.add_friend(self.session.call_context(), username).await?;
        self.registry.insert(Friend::unknown(username));
        Ok(())
    }

    /// Remove a friend; on success the registry entry is gone even if a
    /// presence update for it raced the removal.
    ///
    /// # Errors
    ///
    /// See [`Commands::remove_friend`].
    pub async fn remove_friend(&self, username: &str) -> Result<(), RemoteError> {
        self.commands.remove_friend(self.session.call_context(), username).await?;
        self.registry.remove(username);
        Ok(())
    }

    /// Open the presence feed and start its synchronizer.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::AlreadyStarted`] on every call after the
    /// first; no stream is opened in that case.
    pub async fn start_presence_sync(&self) -> Result<(), StreamError> {
        if self.presence_sync.is_started() {
            return Err(StreamError::AlreadyStarted);
        }
        let source = self.commands.subscribe_presence(self.session.call_context()).await?;
        self.presence_sync.start(source)
    }

    /// Open the message feed and start its synchronizer.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::AlreadyStarted`] on every call after the
    /// first; no stream is opened in that case.
    pub async fn start_message_sync(&self) -> Result<(), StreamError> {
        if self.message_sync.is_started() {
            return Err(StreamError::AlreadyStarted);
        }
        let source = self.commands.subscribe_messages(self.session.call_context()).await?;
        self.message_sync.start(source)
    }

    /// Snapshot of all friends, sorted by username.
    #[must_use]
    pub fn friends(&self) -> Vec<Friend> {
        self.registry.snapshot()
    }

    /// Snapshot of the conversation with `peer`, oldest first.
    #[must_use]
    pub fn conversation(&self, peer: &str) -> Vec<StoredMessage> {
        self.conversations.messages(peer)
    }

    /// Peers with at least one received message, sorted.
    #[must_use]
    pub fn conversation_peers(&self) -> Vec<String> {
        self.conversations.peers()
    }

    /// Whether a login has completed.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Watch handle for the presence synchronizer lifecycle.
    #[must_use]
    pub fn presence_sync_state(&self) -> watch::Receiver<SyncState> {
        self.presence_sync.state()
    }

    /// Watch handle for the message synchronizer lifecycle.
    #[must_use]
    pub fn message_sync_state(&self) -> watch::Receiver<SyncState> {
        self.message_sync.state()
    }

    /// New receiver for advisory notifications.
    ///
    /// Signals sent before this call are not replayed.
    #[must_use]
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notify.subscribe()
    }
}
