//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Pubkey / Hash / Signature (types.rs)
//!     → transaction.rs (build, serialize, decode, verify)
//!     → rpc.rs (NetworkRpc seam)
//!     → client.rs (JSON-RPC with timeouts and read failover)
//! ```
//!
//! # Constraints
//! - No private keys are held here
//! - All RPC calls have configurable timeouts
//! - Writes are sent once; only reads fail over

pub mod client;
pub mod rpc;
pub mod transaction;
pub mod types;

pub use client::SolanaRpcClient;
pub use rpc::NetworkRpc;
pub use transaction::Transaction;
pub use types::{ConfirmationStatus, Hash, Pubkey, Signature, TransactionId, LAMPORTS_PER_SOL};
