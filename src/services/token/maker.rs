use chrono::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::payload::Payload;

/// Errors returned by token creation and verification.
///
/// `Invalid` deliberately carries no detail: a wrong key, a flipped byte and a
/// garbage string must all look the same to the caller.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid key size: must be exactly {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    #[error("failed to generate token id: {0}")]
    Random(String),

    #[error("token duration out of range")]
    DurationOutOfRange,

    #[error("failed to encrypt token: {0}")]
    Encrypt(String),

    #[error("invalid token")]
    Invalid,

    #[error("token has expired")]
    Expired,
}

/// Issues and verifies opaque access tokens.
///
/// Implementations are shared by every request handler (`Arc<dyn TokenMaker>`),
/// so they must be usable concurrently without locking.
pub trait TokenMaker: Send + Sync + std::fmt::Debug {
    /// Create a token for `user_id` valid for `duration` from now.
    fn create_token(&self, user_id: Uuid, duration: Duration) -> Result<String, TokenError>;

    /// Decrypt `token`, then reject it if it has expired.
    fn verify_token(&self, token: &str) -> Result<Payload, TokenError>;
}
