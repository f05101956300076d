//! Authenticated session state.
//!
//! A [`Session`] starts unauthenticated and is written exactly once by a
//! successful login. After that it is frozen: concurrent tasks read the
//! token without locking, and a second login attempt fails instead of
//! replacing the identity mid-flight.

use std::sync::{Arc, OnceLock};

use banter_proto::FrameHeader;
use sha2::{Digest, Sha256};

use crate::{commands::Commands, error::AuthError, transport::Transport};

/// Opaque session token issued by the server on successful login.
///
/// The raw bytes travel only in frame headers; `Debug` never prints them.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AuthToken([u8; 16]);

impl AuthToken {
    /// Raw token bytes for stamping into a frame header.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; 16] {
        self.0
    }
}

impl From<[u8; 16]> for AuthToken {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthToken(<redacted>)")
    }
}

/// Outgoing call metadata derived from the session.
///
/// Stamped into every request header; carries the token when the session
/// is authenticated and nothing otherwise. Anonymous contexts are still
/// valid for login and registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallContext {
    token: Option<AuthToken>,
}

impl From<AuthToken> for CallContext {
    fn from(token: AuthToken) -> Self {
        Self { token: Some(token) }
    }
}

impl CallContext {
    /// Context without credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// Whether this context carries a session token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Stamp this context's credentials into an outgoing header.
    ///
    /// Anonymous contexts clear the token field so a reused header cannot
    /// leak a previous call's credentials.
    pub fn stamp(&self, header: &mut FrameHeader) {
        match self.token {
            Some(token) => header.set_token(token.as_bytes()),
            None => header.clear_token(),
        }
    }
}

/// Write-once authenticated session.
///
/// Cheap to clone; all clones observe the same token cell. The cell is a
/// [`OnceLock`], so the first successful login wins and every later write
/// attempt fails with [`AuthError::AlreadyAuthenticated`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<OnceLock<AuthToken>>,
}

impl Session {
    /// Create an unauthenticated session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a login has completed on this session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.get().is_some()
    }

    /// The stored token, if authenticated.
    #[must_use]
    pub fn token(&self) -> Option<AuthToken> {
        self.token.get().copied()
    }

    /// Call metadata for outgoing requests.
    ///
    /// Unauthenticated sessions produce an anonymous context; the server
    /// rejects authenticated-only operations issued with one.
    #[must_use]
    pub fn call_context(&self) -> CallContext {
        CallContext { token: self.token() }
    }

    /// Log in and freeze the session identity.
    ///
    /// Hashes the password, issues the login call, and stores the returned
    /// token. On any failure the session stays unauthenticated and the
    /// caller decides whether to retry.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AlreadyAuthenticated`] if a token is already stored
    /// - [`AuthError::BadCredentials`] if the server rejects the credentials
    /// - [`AuthError::Remote`] for transport or protocol failures
    pub async fn authenticate<T: Transport>(
        &self,
        commands: &Commands<T>,
        username: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if self.is_authenticated() {
            return Err(AuthError::AlreadyAuthenticated);
        }

        let digest = hash_password(password);
        let token =
            commands.login(username, digest).await.map_err(AuthError::from_remote)?;

        self.store(token)
    }

    /// Store the token returned by a successful login.
    fn store(&self, token: AuthToken) -> Result<(), AuthError> {
        self.token.set(token).map_err(|_| AuthError::AlreadyAuthenticated)
    }
}

/// One-way transform applied to passwords before they leave the process.
///
/// Pure and deterministic: the server stores and compares digests, never
/// cleartext. This is the only cryptographic operation in the client.
#[must_use]
pub fn hash_password(password: &str) -> Vec<u8> {
    Sha256::digest(password.as_bytes()).to_vec()
}
