//! Test-network funding with single-flight per account.
//!
//! # Flow
//! ```text
//! fund_and_refresh(account)
//!     → claim in-flight slot (second caller fails fast)
//!     → request_airdrop
//!     → await_confirmation
//!     → BalanceService::get_balance
//!     → release slot (also on error or cancellation)
//! ```

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::blockchain::rpc::NetworkRpc;
use crate::blockchain::types::{ConfirmationStatus, Pubkey, TransactionId};
use crate::error::{SubmissionError, WalletError, WalletResult};
use crate::observability::metrics;
use crate::wallet::balance::BalanceService;

/// Releases an account's in-flight slot when dropped.
struct InFlightGuard {
    in_flight: Arc<DashMap<Pubkey, AirdropPhase>>,
    account: Pubkey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.account);
    }
}

/// Where an in-flight airdrop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirdropPhase {
    Requesting,
    Confirming,
    Refreshing,
}

/// Requests airdrops and waits for them to land.
#[derive(Clone)]
pub struct AirdropRequester {
    rpc: Arc<dyn NetworkRpc>,
    balance: BalanceService,
    amount_lamports: u64,
    in_flight: Arc<DashMap<Pubkey, AirdropPhase>>,
}

impl AirdropRequester {
    pub fn new(rpc: Arc<dyn NetworkRpc>, balance: BalanceService, amount_lamports: u64) -> Self {
        Self {
            rpc,
            balance,
            amount_lamports,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Lamports requested by [`fund_and_refresh`](Self::fund_and_refresh).
    pub fn amount_lamports(&self) -> u64 {
        self.amount_lamports
    }

    /// Phase of the airdrop running for `account`, if any.
    pub fn phase(&self, account: &Pubkey) -> Option<AirdropPhase> {
        self.in_flight.get(account).map(|r| *r.value())
    }

    pub async fn request_airdrop(&self, account: &Pubkey, lamports: u64) -> WalletResult<TransactionId> {
        let id = self.rpc.request_airdrop(account, lamports).await?;
        tracing::info!(account = %account, lamports, tx = %id, "Airdrop requested");
        Ok(id)
    }

    pub async fn await_confirmation(&self, id: &TransactionId) -> WalletResult<ConfirmationStatus> {
        let status = self.rpc.confirm_transaction(id).await?;
        tracing::debug!(tx = %id, status = ?status, "Airdrop confirmation finished");
        Ok(status)
    }

    fn claim(&self, account: &Pubkey) -> WalletResult<InFlightGuard> {
        match self.in_flight.entry(*account) {
            Entry::Occupied(_) => Err(WalletError::InFlight(format!("airdrop for {}", account))),
            Entry::Vacant(slot) => {
                slot.insert(AirdropPhase::Requesting);
                Ok(InFlightGuard {
                    in_flight: self.in_flight.clone(),
                    account: *account,
                })
            }
        }
    }

    fn advance(&self, account: &Pubkey, phase: AirdropPhase) {
        if let Some(mut entry) = self.in_flight.get_mut(account) {
            *entry = phase;
        }
    }

    /// Request, wait for confirmation, then re-query the balance.
    ///
    /// Returns the refreshed balance. A concurrent call for the same account
    /// fails with [`WalletError::InFlight`] and sends nothing.
    pub async fn fund_and_refresh(&self, account: &Pubkey) -> WalletResult<u64> {
        let _guard = self.claim(account)?;
        let result = self.fund_and_refresh_inner(account).await;
        metrics::record_airdrop(metrics::outcome_label(&result));
        result
    }

    async fn fund_and_refresh_inner(&self, account: &Pubkey) -> WalletResult<u64> {
        let id = self.request_airdrop(account, self.amount_lamports).await?;

        self.advance(account, AirdropPhase::Confirming);
        match self.await_confirmation(&id).await? {
            ConfirmationStatus::Confirmed { slot } => {
                tracing::info!(tx = %id, slot, "Airdrop confirmed");
            }
            ConfirmationStatus::Failed(reason) => {
                return Err(SubmissionError::Rejected(reason).into());
            }
            ConfirmationStatus::TimedOut { waited_secs } => {
                return Err(WalletError::Timeout {
                    id: id.to_string(),
                    secs: waited_secs,
                });
            }
        }

        self.advance(account, AirdropPhase::Refreshing);
        self.balance.get_balance(account).await
    }
}
