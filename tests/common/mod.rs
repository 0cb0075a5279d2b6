//! Shared fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::net::TcpListener;

use magic_sol_client::blockchain::transaction::Transaction;
use magic_sol_client::blockchain::types::{
    ConfirmationStatus, Hash, Pubkey, Signature, TransactionId,
};
use magic_sol_client::blockchain::NetworkRpc;
use magic_sol_client::error::{SigningError, WalletError, WalletResult};
use magic_sol_client::identity::{IdentityProvider, SignOptions, SignedPayload, UserMetadata};

pub const EMAIL: &str = "a@b.com";
pub const DESTINATION: &str = "4uQeVj5tqViQh7yWWGStvkEG1Zmhx6uasJtWCJziofM";

/// Deterministic key standing in for the provider's custodial key.
pub fn user_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub fn user_address() -> Pubkey {
    Pubkey::new(user_key().verifying_key().to_bytes())
}

/// Serve `router` on an ephemeral local port.
pub async fn start_mock_server(router: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// In-memory network with per-method call counters.
pub struct MockRpc {
    pub balance: AtomicU64,
    pub balance_error: Mutex<Option<WalletError>>,
    pub airdrop_id: Mutex<WalletResult<TransactionId>>,
    pub confirmation: Mutex<ConfirmationStatus>,
    pub blockhash: Hash,
    pub send_result: Mutex<WalletResult<TransactionId>>,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub pending_credit: AtomicU64,

    pub balance_calls: AtomicUsize,
    pub airdrop_calls: AtomicUsize,
    pub confirm_calls: AtomicUsize,
    pub blockhash_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
}

impl MockRpc {
    pub fn new(balance: u64) -> Self {
        Self {
            balance: AtomicU64::new(balance),
            balance_error: Mutex::new(None),
            airdrop_id: Mutex::new(Ok(TransactionId::from("Txn1"))),
            confirmation: Mutex::new(ConfirmationStatus::Confirmed { slot: 1 }),
            blockhash: Hash([42u8; 32]),
            send_result: Mutex::new(Ok(TransactionId::from("Txn2"))),
            sent: Mutex::new(Vec::new()),
            pending_credit: AtomicU64::new(0),
            balance_calls: AtomicUsize::new(0),
            airdrop_calls: AtomicUsize::new(0),
            confirm_calls: AtomicUsize::new(0),
            blockhash_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_balance_with(&self, err: WalletError) {
        *self.balance_error.lock().unwrap() = Some(err);
    }

    pub fn fail_sends_with(&self, err: WalletError) {
        *self.send_result.lock().unwrap() = Err(err);
    }

    pub fn total_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
            + self.airdrop_calls.load(Ordering::SeqCst)
            + self.confirm_calls.load(Ordering::SeqCst)
            + self.blockhash_calls.load(Ordering::SeqCst)
            + self.send_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkRpc for MockRpc {
    async fn get_balance(&self, _account: &Pubkey) -> WalletResult<u64> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.balance_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.balance.load(Ordering::SeqCst))
    }

    async fn request_airdrop(&self, _account: &Pubkey, lamports: u64) -> WalletResult<TransactionId> {
        self.airdrop_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.airdrop_id.lock().unwrap().clone()?;
        self.pending_credit.fetch_add(lamports, Ordering::SeqCst);
        Ok(id)
    }

    async fn confirm_transaction(&self, _id: &TransactionId) -> WalletResult<ConfirmationStatus> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        // let a concurrent caller observe the in-flight airdrop
        tokio::task::yield_now().await;
        let status = self.confirmation.lock().unwrap().clone();
        if matches!(status, ConfirmationStatus::Confirmed { .. }) {
            let credit = self.pending_credit.swap(0, Ordering::SeqCst);
            self.balance.fetch_add(credit, Ordering::SeqCst);
        }
        Ok(status)
    }

    async fn get_latest_blockhash(&self) -> WalletResult<Hash> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.blockhash)
    }

    async fn send_raw_transaction(&self, bytes: &[u8]) -> WalletResult<TransactionId> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(bytes.to_vec());
        self.send_result.lock().unwrap().clone()
    }
}

/// How the fake provider answers signing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignBehavior {
    /// Sign with [`user_key`].
    Sign,
    /// User dismissed the signing prompt.
    Reject,
    /// Return bytes for a different amount.
    Tamper,
    /// Return the transaction untouched.
    NoSignature,
}

/// Identity provider fake with a login switch and call counters.
pub struct MockIdentity {
    pub logged_in: AtomicBool,
    pub login_error: Mutex<Option<WalletError>>,
    pub logout_error: Mutex<Option<WalletError>>,
    pub sign_behavior: Mutex<SignBehavior>,
    pub sign_options: Mutex<Vec<SignOptions>>,

    pub login_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self {
            logged_in: AtomicBool::new(false),
            login_error: Mutex::new(None),
            logout_error: Mutex::new(None),
            sign_behavior: Mutex::new(SignBehavior::Sign),
            sign_options: Mutex::new(Vec::new()),
            login_calls: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn logged_in() -> Self {
        let identity = Self::new();
        identity.logged_in.store(true, Ordering::SeqCst);
        identity
    }

    pub fn with_sign_behavior(self, behavior: SignBehavior) -> Self {
        *self.sign_behavior.lock().unwrap() = behavior;
        self
    }
}

fn sign_with_user_key(tx: &mut Transaction) {
    tx.signatures[0] = Signature(user_key().sign(&tx.message_data()).to_bytes());
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn is_logged_in(&self) -> WalletResult<bool> {
        Ok(self.logged_in.load(Ordering::SeqCst))
    }

    async fn get_metadata(&self) -> WalletResult<UserMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(UserMetadata {
            email: EMAIL.to_string(),
            public_address: user_address().to_string(),
        })
    }

    async fn login_with_email(&self, _email: &str) -> WalletResult<()> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.login_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.logged_in.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn logout(&self) -> WalletResult<()> {
        self.logged_in.store(false, Ordering::SeqCst);
        match self.logout_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn sign_transaction(
        &self,
        unsigned_tx: &[u8],
        options: SignOptions,
    ) -> WalletResult<SignedPayload> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.sign_options.lock().unwrap().push(options);

        let behavior = *self.sign_behavior.lock().unwrap();
        let mut tx = Transaction::deserialize(unsigned_tx)
            .map_err(|e| SigningError::Failed(e.to_string()))?;

        match behavior {
            SignBehavior::Reject => return Err(SigningError::UserRejected.into()),
            SignBehavior::Sign => sign_with_user_key(&mut tx),
            SignBehavior::NoSignature => {}
            SignBehavior::Tamper => {
                let payer = tx.message.account_keys[0];
                let dest = tx.message.account_keys[1];
                tx = Transaction::new_transfer(&payer, &dest, 999_999, tx.message.recent_blockhash);
                sign_with_user_key(&mut tx);
            }
        }

        Ok(SignedPayload {
            raw_transaction: tx.serialize(),
        })
    }
}
