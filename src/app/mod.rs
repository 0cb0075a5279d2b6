//! Wallet application shell.
//!
//! # Event Flow
//! ```text
//! user action
//!     → WalletApp::on_* handler (one action, one async operation)
//!     → session / balance / airdrop / transfer services
//!     → ViewState (flags, balance, last result, last error)
//! ```
//!
//! # State Rules
//! - `airdrop_pending` and `sending_transaction` disable their action; a
//!   second trigger while set fails with `WalletError::InFlight`
//! - Flags reset on completion, failure and cancellation
//! - The view lock is never held across an await

pub mod view;

pub use view::{explorer_url, ViewState};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::Instrument;

use crate::blockchain::rpc::NetworkRpc;
use crate::blockchain::types::{Pubkey, TransactionId};
use crate::config::{ClientConfig, Cluster};
use crate::error::{InputError, WalletError, WalletResult};
use crate::identity::provider::IdentityProvider;
use crate::identity::session::{LogoutOutcome, SessionManager};
use crate::identity::types::Identity;
use crate::observability::spans;
use crate::wallet::airdrop::AirdropRequester;
use crate::wallet::balance::BalanceService;
use crate::wallet::transfer::{parse_amount, TransferService};

type FlagFn = fn(&mut ViewState) -> &mut bool;

/// Holds a view flag set for the lifetime of one operation.
struct PendingFlag<'a> {
    view: &'a Mutex<ViewState>,
    flag: FlagFn,
}

impl<'a> PendingFlag<'a> {
    fn acquire(view: &'a Mutex<ViewState>, flag: FlagFn, action: &str) -> WalletResult<Self> {
        let mut state = lock(view);
        let slot = flag(&mut state);
        if *slot {
            return Err(WalletError::InFlight(action.to_string()));
        }
        *slot = true;
        Ok(Self { view, flag })
    }
}

impl Drop for PendingFlag<'_> {
    fn drop(&mut self) {
        let mut view = lock(self.view);
        *(self.flag)(&mut view) = false;
    }
}

fn lock(view: &Mutex<ViewState>) -> MutexGuard<'_, ViewState> {
    view.lock().unwrap_or_else(PoisonError::into_inner)
}

fn airdrop_flag(view: &mut ViewState) -> &mut bool {
    &mut view.airdrop_pending
}

fn sending_flag(view: &mut ViewState) -> &mut bool {
    &mut view.sending_transaction
}

/// The wallet: services plus the state the user sees.
pub struct WalletApp {
    session: SessionManager,
    balance: BalanceService,
    airdrop: AirdropRequester,
    transfer: TransferService,
    cluster: Cluster,
    explorer_base: String,
    view: Mutex<ViewState>,
}

impl WalletApp {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        rpc: Arc<dyn NetworkRpc>,
        config: &ClientConfig,
    ) -> Self {
        let balance = BalanceService::new(rpc.clone());
        Self {
            session: SessionManager::new(identity.clone()),
            airdrop: AirdropRequester::new(rpc.clone(), balance.clone(), config.airdrop.amount_lamports),
            transfer: TransferService::new(rpc, identity),
            balance,
            cluster: config.network.cluster,
            explorer_base: config.explorer.base_url.clone(),
            view: Mutex::new(ViewState::default()),
        }
    }

    /// Copy of the current view.
    pub fn view(&self) -> ViewState {
        lock(&self.view).clone()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn cluster(&self) -> Cluster {
        self.cluster
    }

    /// Explorer link for `id` on the configured cluster.
    pub fn explorer_link(&self, id: &TransactionId) -> String {
        explorer_url(&self.explorer_base, id, self.cluster)
    }

    /// Record the outcome in the view and hand it back.
    fn settle<T>(&self, result: WalletResult<T>) -> WalletResult<T> {
        let mut view = lock(&self.view);
        match &result {
            Ok(_) => view.last_error = None,
            Err(e) => view.last_error = Some(e.to_string()),
        }
        result
    }

    fn show_identity(&self, identity: &Identity) {
        let mut view = lock(&self.view);
        view.email = Some(identity.email.clone());
        view.address = Some(identity.account_address);
        view.warning = None;
    }

    fn set_balance(&self, lamports: u64) {
        lock(&self.view).balance_lamports = Some(lamports);
    }

    async fn refresh_balance(&self, account: &Pubkey) -> WalletResult<u64> {
        let lamports = self.balance.get_balance(account).await?;
        self.set_balance(lamports);
        Ok(lamports)
    }

    /// Adopt an existing session without prompting and load its balance.
    ///
    /// Returns `None` when nobody is logged in.
    pub async fn on_startup(&self) -> WalletResult<Option<Arc<Identity>>> {
        let result = self.startup().instrument(spans::action_span("startup")).await;
        self.settle(result)
    }

    async fn startup(&self) -> WalletResult<Option<Arc<Identity>>> {
        let Some(identity) = self.session.check_session().await? else {
            return Ok(None);
        };
        self.show_identity(&identity);
        self.refresh_balance(&identity.account_address).await?;
        Ok(Some(identity))
    }

    /// Passwordless login, then an initial balance read.
    ///
    /// The session stays anonymous if the provider does not confirm. A
    /// failed balance read after a successful login is reported but the
    /// session is kept.
    pub async fn on_login(&self, email: &str) -> WalletResult<Arc<Identity>> {
        let result = self.login(email).instrument(spans::action_span("login")).await;
        self.settle(result)
    }

    async fn login(&self, email: &str) -> WalletResult<Arc<Identity>> {
        let identity = self.session.login(email).await?;
        self.show_identity(&identity);
        self.refresh_balance(&identity.account_address).await?;
        Ok(identity)
    }

    /// End the session. The view always returns to the anonymous state.
    pub async fn on_logout(&self) -> LogoutOutcome {
        let outcome = self
            .session
            .logout()
            .instrument(spans::action_span("logout"))
            .await;

        let mut view = lock(&self.view);
        view.clear_identity();
        view.last_error = None;
        view.warning = match &outcome {
            LogoutOutcome::Clean => None,
            LogoutOutcome::LocalOnly(e) => Some(format!("Logged out locally; provider logout failed: {}", e)),
        };
        outcome
    }

    /// Re-read the current account's balance into the view.
    ///
    /// Transfer prechecks use the balance shown here.
    pub async fn on_refresh_balance(&self) -> WalletResult<u64> {
        let result = self.reload_balance().instrument(spans::action_span("balance")).await;
        self.settle(result)
    }

    async fn reload_balance(&self) -> WalletResult<u64> {
        let identity = self.session.require_identity()?;
        self.refresh_balance(&identity.account_address).await
    }

    /// Airdrop to the current account and show the refreshed balance.
    pub async fn on_request_funds(&self) -> WalletResult<u64> {
        let result = self.request_funds().instrument(spans::action_span("airdrop")).await;
        self.settle(result)
    }

    async fn request_funds(&self) -> WalletResult<u64> {
        let identity = self.session.require_identity()?;
        if !self.cluster.supports_airdrop() {
            return Err(InputError::AirdropUnavailable(self.cluster.as_str().to_string()).into());
        }

        let _pending = PendingFlag::acquire(&self.view, airdrop_flag, "airdrop")?;
        let lamports = self.airdrop.fund_and_refresh(&identity.account_address).await?;
        self.set_balance(lamports);
        Ok(lamports)
    }

    /// Send `amount` (whole lamports, as typed) to `destination`.
    ///
    /// On success the balance is re-read; a failed re-read becomes a
    /// warning since the transfer itself was accepted.
    pub async fn on_send_transaction(&self, destination: &str, amount: &str) -> WalletResult<TransactionId> {
        let result = self
            .send_transaction(destination, amount)
            .instrument(spans::action_span("send"))
            .await;
        self.settle(result)
    }

    async fn send_transaction(&self, destination: &str, amount: &str) -> WalletResult<TransactionId> {
        let identity = self.session.require_identity()?;
        let lamports = parse_amount(amount)?;
        let known_balance = lock(&self.view).balance_lamports;

        let _pending = PendingFlag::acquire(&self.view, sending_flag, "transfer")?;
        let id = self
            .transfer
            .transfer(&identity.account_address, destination, lamports, known_balance)
            .await?;
        lock(&self.view).last_transfer = Some(id.clone());

        if let Err(e) = self.refresh_balance(&identity.account_address).await {
            tracing::warn!(error = %e, tx = %id, "Balance refresh after transfer failed");
            lock(&self.view).warning = Some(format!("Balance may be stale: {}", e));
        }
        Ok(id)
    }
}
