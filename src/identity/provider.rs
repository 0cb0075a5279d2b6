//! Identity provider seam.

use async_trait::async_trait;

use crate::error::WalletResult;
use crate::identity::types::{SignOptions, SignedPayload, UserMetadata};

/// Operations consumed from the passwordless identity provider.
///
/// The provider owns email verification, session persistence and key
/// custody. Implementations must be safe to share across tasks.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether a session already exists. Never prompts the user.
    async fn is_logged_in(&self) -> WalletResult<bool>;

    /// Metadata for the current session.
    async fn get_metadata(&self) -> WalletResult<UserMetadata>;

    /// Start passwordless login and suspend until the emailed link is
    /// followed or the provider gives up.
    async fn login_with_email(&self, email: &str) -> WalletResult<()>;

    /// End the session with the provider.
    async fn logout(&self) -> WalletResult<()>;

    /// Sign the serialized unsigned transaction with the custodial key.
    async fn sign_transaction(
        &self,
        unsigned_tx: &[u8],
        options: SignOptions,
    ) -> WalletResult<SignedPayload>;
}
