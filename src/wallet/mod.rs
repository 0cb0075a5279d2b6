//! Wallet services.
//!
//! # Data Flow
//! ```text
//! account address
//!     → balance.rs (query, format)
//!     → airdrop.rs (request → confirm → refresh, single-flight per account)
//!     → transfer.rs (validate → blockhash → build → remote sign → reassemble → submit)
//! ```
//!
//! # Constraints
//! - Input is validated before any network or provider call
//! - Services keep no cached balances or blockhashes

pub mod airdrop;
pub mod balance;
pub mod transfer;

pub use airdrop::{AirdropPhase, AirdropRequester};
pub use balance::{format_sol, parse_account, BalanceService};
pub use transfer::{parse_amount, reassemble, validate_transfer, TransferService};
