//! Session management.
//!
//! # State Transitions
//! ```text
//! ANONYMOUS → AUTHENTICATED: login verified and metadata resolved
//! AUTHENTICATED → ANONYMOUS: logout (always, even if the provider call fails)
//! login failure: stays ANONYMOUS
//! ```

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::blockchain::types::Pubkey;
use crate::error::{AuthError, InputError, WalletError, WalletResult};
use crate::identity::provider::IdentityProvider;
use crate::identity::types::{Identity, UserMetadata};
use crate::observability::metrics;

/// Snapshot of the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(Arc<Identity>),
}

/// Result of a logout. Local state is cleared in both cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// Provider confirmed the logout.
    Clean,
    /// Provider call failed; surface this as a warning.
    LocalOnly(WalletError),
}

/// Loose `local@domain.tld` shape check. The provider does the real validation.
pub fn validate_email(email: &str) -> Result<&str, InputError> {
    let email = email.trim();
    let invalid = || InputError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let well_formed = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);

    if well_formed {
        Ok(email)
    } else {
        Err(invalid())
    }
}

fn identity_from(metadata: UserMetadata) -> Result<Identity, AuthError> {
    let account_address = metadata.public_address.parse::<Pubkey>().map_err(|e| {
        AuthError::MalformedMetadata(format!(
            "public address '{}': {}",
            metadata.public_address, e
        ))
    })?;
    Ok(Identity {
        email: metadata.email,
        account_address,
    })
}

/// Tracks the authenticated identity on top of an [`IdentityProvider`].
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    current: ArcSwapOption<Identity>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            current: ArcSwapOption::empty(),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.current.load_full() {
            Some(identity) => SessionState::Authenticated(identity),
            None => SessionState::Anonymous,
        }
    }

    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.current.load_full()
    }

    /// The active identity, or `AuthError::NotAuthenticated`.
    pub fn require_identity(&self) -> WalletResult<Arc<Identity>> {
        self.identity().ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    /// Adopt an existing provider session, if any. Never prompts.
    pub async fn check_session(&self) -> WalletResult<Option<Arc<Identity>>> {
        let result = self.resolve_existing().await;
        metrics::record_session_event("check", metrics::outcome_label(&result));

        let identity = result?;
        match &identity {
            Some(identity) => {
                tracing::info!(email = %identity.email, account = %identity.account_address, "Existing session found");
                self.current.store(Some(identity.clone()));
            }
            None => {
                tracing::debug!("No existing session");
                self.current.store(None);
            }
        }
        Ok(identity)
    }

    async fn resolve_existing(&self) -> WalletResult<Option<Arc<Identity>>> {
        if !self.provider.is_logged_in().await? {
            return Ok(None);
        }
        let metadata = self.provider.get_metadata().await?;
        Ok(Some(Arc::new(identity_from(metadata)?)))
    }

    /// Passwordless login. Suspends until the provider reports verification.
    pub async fn login(&self, email: &str) -> WalletResult<Arc<Identity>> {
        let result = self.login_inner(email).await;
        metrics::record_session_event("login", metrics::outcome_label(&result));

        match &result {
            Ok(identity) => {
                tracing::info!(email = %identity.email, account = %identity.account_address, "Login verified");
                self.current.store(Some(identity.clone()));
            }
            Err(e) => tracing::warn!(error = %e, "Login failed"),
        }
        result
    }

    async fn login_inner(&self, email: &str) -> WalletResult<Arc<Identity>> {
        let email = validate_email(email)?;
        self.provider.login_with_email(email).await?;
        let metadata = self.provider.get_metadata().await?;
        Ok(Arc::new(identity_from(metadata)?))
    }

    /// End the session. Local state is always cleared.
    pub async fn logout(&self) -> LogoutOutcome {
        let result = self.provider.logout().await;
        metrics::record_session_event("logout", metrics::outcome_label(&result));
        let previous = self.current.swap(None);

        match result {
            Ok(()) => {
                tracing::info!(had_session = previous.is_some(), "Logged out");
                LogoutOutcome::Clean
            }
            Err(e) => {
                tracing::warn!(error = %e, "Provider logout failed; local session cleared");
                LogoutOutcome::LocalOnly(e)
            }
        }
    }
}
