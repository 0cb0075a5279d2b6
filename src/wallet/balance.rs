//! Balance queries and display formatting.

use std::sync::Arc;

use crate::blockchain::rpc::NetworkRpc;
use crate::blockchain::types::{Pubkey, LAMPORTS_PER_SOL};
use crate::error::{InputError, WalletResult};

/// Parse a user-supplied account address.
pub fn parse_account(input: &str) -> Result<Pubkey, InputError> {
    input.trim().parse::<Pubkey>().map_err(|e| InputError::InvalidAccount {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Lamports as a SOL string with trailing zeros trimmed, e.g. `"3 SOL"`, `"0.5 SOL"`.
pub fn format_sol(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let frac = lamports % LAMPORTS_PER_SOL;
    if frac == 0 {
        return format!("{} SOL", whole);
    }
    let digits = format!("{:09}", frac);
    format!("{}.{} SOL", whole, digits.trim_end_matches('0'))
}

/// Reads balances from the network. Holds no balance state of its own.
#[derive(Clone)]
pub struct BalanceService {
    rpc: Arc<dyn NetworkRpc>,
}

impl BalanceService {
    pub fn new(rpc: Arc<dyn NetworkRpc>) -> Self {
        Self { rpc }
    }

    /// Raw lamport balance. Safe to call at any time.
    pub async fn get_balance(&self, account: &Pubkey) -> WalletResult<u64> {
        let lamports = self.rpc.get_balance(account).await?;
        tracing::debug!(account = %account, lamports, "Balance fetched");
        Ok(lamports)
    }

    /// Validate `account` first, then query. No RPC call for malformed input.
    pub async fn get_balance_str(&self, account: &str) -> WalletResult<u64> {
        let account = parse_account(account)?;
        self.get_balance(&account).await
    }
}
