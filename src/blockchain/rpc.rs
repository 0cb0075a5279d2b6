//! Network RPC seam.
//!
//! Services hold an `Arc<dyn NetworkRpc>` so tests can substitute a fake
//! endpoint. [`crate::blockchain::SolanaRpcClient`] is the production implementation.

use async_trait::async_trait;

use crate::blockchain::types::{ConfirmationStatus, Hash, Pubkey, TransactionId};
use crate::error::WalletResult;

/// Operations consumed from the network RPC endpoint.
#[async_trait]
pub trait NetworkRpc: Send + Sync {
    /// Balance in lamports.
    async fn get_balance(&self, account: &Pubkey) -> WalletResult<u64>;

    /// Ask the test-network faucet for `lamports`.
    async fn request_airdrop(&self, account: &Pubkey, lamports: u64) -> WalletResult<TransactionId>;

    /// Suspend until `id` reaches the configured commitment or the wait window closes.
    async fn confirm_transaction(&self, id: &TransactionId) -> WalletResult<ConfirmationStatus>;

    /// Current freshness token for new transactions.
    async fn get_latest_blockhash(&self) -> WalletResult<Hash>;

    /// Submit fully serialized wire bytes.
    async fn send_raw_transaction(&self, bytes: &[u8]) -> WalletResult<TransactionId>;
}
