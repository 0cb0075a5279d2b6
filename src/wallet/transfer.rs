//! Transfer building, remote signing and submission.
//!
//! # Flow
//! ```text
//! transfer(source, destination, amount)
//!     → validate (no I/O on failure)
//!     → get_latest_blockhash
//!     → Transaction::new_transfer (one instruction, empty signature slot)
//!     → IdentityProvider::sign_transaction (partial)
//!     → reassemble (message must be byte-identical, signature must verify)
//!     → send_raw_transaction
//!     → TransactionId (no confirmation wait)
//! ```
//!
//! Every failure is terminal for the call. A `BlockhashNotFound` rejection
//! means the caller must run the whole flow again, since the signed bytes
//! embed the stale blockhash.

use std::sync::Arc;
use tracing::Instrument;

use crate::blockchain::rpc::NetworkRpc;
use crate::blockchain::transaction::Transaction;
use crate::blockchain::types::{Pubkey, TransactionId};
use crate::error::{InputError, SigningError, WalletResult};
use crate::identity::provider::IdentityProvider;
use crate::identity::types::SignOptions;
use crate::observability::{metrics, spans};

/// Parse a lamport amount typed by the user.
///
/// Accepts only positive whole numbers. Zero, negatives, fractions and
/// anything non-numeric are rejected.
pub fn parse_amount(input: &str) -> Result<u64, InputError> {
    let trimmed = input.trim();
    let invalid = |reason: &str| InputError::InvalidAmount(format!("'{}' {}", trimmed, reason));

    if trimmed.is_empty() {
        return Err(invalid("is empty"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("is negative"));
    }
    if trimmed.contains('.') {
        return Err(invalid("is not a whole number of lamports"));
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("is not a number"));
    }

    let lamports = trimmed
        .parse::<u64>()
        .map_err(|_| invalid("is out of range"))?;
    if lamports == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(lamports)
}

/// Check destination and amount before any I/O.
///
/// `known_balance` is the last balance shown to the user; when present the
/// amount may not exceed it. Fees are left to the network to enforce.
pub fn validate_transfer(
    destination: &str,
    amount: u64,
    known_balance: Option<u64>,
) -> Result<(Pubkey, u64), InputError> {
    let destination_key = destination.trim().parse::<Pubkey>().map_err(|e| {
        InputError::InvalidDestination {
            input: destination.to_string(),
            reason: e.to_string(),
        }
    })?;

    if amount == 0 {
        return Err(InputError::InvalidAmount("amount must be greater than zero".into()));
    }
    if let Some(balance) = known_balance {
        if amount > balance {
            return Err(InputError::InvalidAmount(format!(
                "{} lamports exceeds balance of {}",
                amount, balance
            )));
        }
    }

    Ok((destination_key, amount))
}

/// Merge what the signer returned with the transaction we built.
///
/// The returned message must match the unsigned one byte for byte, and every
/// signature slot must hold a valid signature from its signer.
pub fn reassemble(unsigned: &Transaction, raw: &[u8]) -> Result<Transaction, SigningError> {
    let signed = Transaction::deserialize(raw)
        .map_err(|e| SigningError::PayloadMismatch(format!("undecodable signer output: {}", e)))?;

    if signed.message_data() != unsigned.message_data() {
        return Err(SigningError::PayloadMismatch(
            "signer altered the transaction message".into(),
        ));
    }

    signed.verify_signatures()?;

    Ok(Transaction {
        signatures: signed.signatures,
        message: unsigned.message.clone(),
    })
}

/// Builds, signs and submits single-instruction transfers.
#[derive(Clone)]
pub struct TransferService {
    rpc: Arc<dyn NetworkRpc>,
    identity: Arc<dyn IdentityProvider>,
}

impl TransferService {
    pub fn new(rpc: Arc<dyn NetworkRpc>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { rpc, identity }
    }

    /// Move `amount` lamports from `source` to `destination`.
    ///
    /// Returns as soon as the network accepts the submission.
    pub async fn transfer(
        &self,
        source: &Pubkey,
        destination: &str,
        amount: u64,
        known_balance: Option<u64>,
    ) -> WalletResult<TransactionId> {
        let span = spans::action_span("transfer");
        let result = self
            .transfer_inner(source, destination, amount, known_balance)
            .instrument(span)
            .await;
        metrics::record_transfer(metrics::outcome_label(&result));
        result
    }

    async fn transfer_inner(
        &self,
        source: &Pubkey,
        destination: &str,
        amount: u64,
        known_balance: Option<u64>,
    ) -> WalletResult<TransactionId> {
        let (destination, amount) = validate_transfer(destination, amount, known_balance)?;

        let blockhash = self.rpc.get_latest_blockhash().await?;
        tracing::debug!(blockhash = %blockhash, "Fetched blockhash");

        let unsigned = Transaction::new_transfer(source, &destination, amount, blockhash);
        let unsigned_bytes = unsigned.serialize();

        let payload = self
            .identity
            .sign_transaction(&unsigned_bytes, SignOptions::partial())
            .await?;

        let signed = reassemble(&unsigned, &payload.raw_transaction)?;
        let wire = signed.serialize();

        let id = self.rpc.send_raw_transaction(&wire).await?;
        tracing::info!(
            from = %source,
            to = %destination,
            lamports = amount,
            tx = %id,
            "Transfer submitted"
        );
        Ok(id)
    }
}
