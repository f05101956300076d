//! Session payload types: login and account registration.

use serde::{Deserialize, Serialize};

/// Credentials login request.
///
/// Sent anonymously; the server answers with [`LoginReply`] or an error
/// frame (`INVALID_CREDENTIALS`). The password never travels in the clear:
/// clients send its one-way digest.
///
/// # Security
///
/// - **Debug Redaction**: The `Debug` impl redacts `password_hash` to
///   prevent accidental logging of credentials. Always use custom `Debug`
///   implementations for types containing secrets.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    /// Account username.
    pub username: String,
    /// One-way digest of the password (SHA-256, 32 bytes).
    pub password_hash: Vec<u8>,
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .field("password_hash", &format!("<redacted {} bytes>", self.password_hash.len()))
            .finish()
    }
}

/// Successful login response.
///
/// Carries the session token the client must stamp into the header of every
/// authenticated call.
///
/// # Security
///
/// - **Debug Redaction**: The `Debug` impl redacts the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginReply {
    /// Session token for subsequent authenticated calls.
    pub token: [u8; 16],
}

impl std::fmt::Debug for LoginReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginReply").field("token", &"<redacted 16 bytes>").finish()
    }
}

/// Account registration request.
///
/// Sent anonymously; the server answers with `Ack` or an error frame
/// (`ALREADY_EXISTS`, `INVALID_PAYLOAD`). Registering does not log the
/// account in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    /// Contact email address.
    pub email: String,
    /// Desired username.
    pub username: String,
    /// One-way digest of the password (SHA-256, 32 bytes).
    pub password_hash: Vec<u8>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl std::fmt::Debug for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Register")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password_hash", &format!("<redacted {} bytes>", self.password_hash.len()))
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}
