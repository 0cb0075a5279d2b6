//! Presentation state for the wallet shell.

use crate::blockchain::types::{Pubkey, TransactionId};
use crate::config::Cluster;
use crate::wallet::balance::format_sol;

/// Snapshot of everything the shell renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub email: Option<String>,
    pub address: Option<Pubkey>,
    /// Last balance read from the network; `None` until the first read.
    pub balance_lamports: Option<u64>,
    /// Disables the airdrop action while set.
    pub airdrop_pending: bool,
    /// Disables the send action while set.
    pub sending_transaction: bool,
    pub last_transfer: Option<TransactionId>,
    pub last_error: Option<String>,
    pub warning: Option<String>,
}

impl ViewState {
    pub fn is_authenticated(&self) -> bool {
        self.address.is_some()
    }

    /// Balance as shown to the user, e.g. `"3 SOL"`.
    pub fn balance_display(&self) -> Option<String> {
        self.balance_lamports.map(format_sol)
    }

    /// Drop everything tied to the previous identity.
    pub(crate) fn clear_identity(&mut self) {
        self.email = None;
        self.address = None;
        self.balance_lamports = None;
        self.last_transfer = None;
    }
}

/// Explorer link for a submitted transaction.
pub fn explorer_url(base_url: &str, id: &TransactionId, cluster: Cluster) -> String {
    let base = base_url.trim_end_matches('/');
    match cluster.explorer_param() {
        Some(param) => format!("{}/tx/{}?cluster={}", base, id, param),
        None => format!("{}/tx/{}", base, id),
    }
}
