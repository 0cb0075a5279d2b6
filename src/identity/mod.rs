//! Identity subsystem.
//!
//! # Data Flow
//! ```text
//! email
//!     → session.rs (validate, drive the login state machine)
//!     → provider.rs (IdentityProvider trait)
//!     → relay.rs (HTTP relay adapter) or a test double
//!     → Identity { email, account_address }
//! ```
//!
//! # Security Constraints
//! - No private keys here; signing is delegated to the provider
//! - Session tokens stay inside the provider adapter

pub mod provider;
pub mod relay;
pub mod session;
pub mod types;

pub use provider::IdentityProvider;
pub use relay::RelayIdentityProvider;
pub use session::{LogoutOutcome, SessionManager, SessionState};
pub use types::{Identity, SignOptions, SignedPayload, UserMetadata};
