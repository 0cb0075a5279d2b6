//! Passwordless-email Solana wallet client library.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                     WalletApp                         │
//!   user action ──┼─▶ on_login / on_request_funds / on_send_transaction  │
//!                 │        │                │                 │         │
//!                 │        ▼                ▼                 ▼         │
//!                 │  ┌──────────┐   ┌──────────────┐   ┌─────────────┐  │
//!                 │  │ session  │   │   airdrop    │   │  transfer   │  │
//!                 │  │ manager  │   │ + balance    │   │ build/sign  │  │
//!                 │  └────┬─────┘   └──────┬───────┘   └──┬───────┬──┘  │
//!                 └───────┼────────────────┼──────────────┼───────┼─────┘
//!                         ▼                ▼              │       ▼
//!                 IdentityProvider      NetworkRpc ◀──────┘  IdentityProvider
//!                 (login, metadata)     (JSON-RPC)           (remote signing)
//! ```
//!
//! The client never holds private keys. Signing is delegated to the identity
//! provider and every signed payload is checked before submission.

pub mod app;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod identity;
pub mod observability;
pub mod wallet;

pub use app::{ViewState, WalletApp};
pub use config::schema::ClientConfig;
pub use error::{WalletError, WalletResult};
