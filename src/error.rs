//! Error taxonomy shared by every wallet operation.
//!
//! # Propagation
//! - Input validation runs before any I/O and fails with [`WalletError::InvalidInput`]
//! - Collaborator failures map onto the auth, signing, network and submission kinds
//! - Nothing is retried automatically; each user action is a fresh attempt

use thiserror::Error;

/// Local validation failures. Raised before any network or provider call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Destination does not decode as a 32-byte base58 account address.
    #[error("invalid destination address '{input}': {reason}")]
    InvalidDestination { input: String, reason: String },

    /// Amount is zero, negative, non-numeric or above the known balance.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Account address supplied for a balance or airdrop query is malformed.
    #[error("invalid account address '{input}': {reason}")]
    InvalidAccount { input: String, reason: String },

    /// Email does not have a `local@domain` shape.
    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    /// The configured cluster has no faucet.
    #[error("airdrops are not available on {0}")]
    AirdropUnavailable(String),
}

/// Identity provider failures (login, logout, session checks).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Out-of-band verification was never completed.
    #[error("login verification timed out")]
    VerificationTimeout,

    /// The user cancelled the login flow.
    #[error("login flow cancelled")]
    Cancelled,

    /// The provider refused the email address.
    #[error("identity provider rejected the login: {0}")]
    Rejected(String),

    /// An operation needed an active session and there is none.
    #[error("no authenticated session")]
    NotAuthenticated,

    /// Provider metadata could not be turned into an identity.
    #[error("malformed identity metadata: {0}")]
    MalformedMetadata(String),

    /// Transport or unexpected provider failure.
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Remote signer failures, including reassembly checks on what it returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("signing request rejected by user")]
    UserRejected,

    #[error("signing request timed out")]
    Timeout,

    #[error("remote signer failed: {0}")]
    Failed(String),

    /// Returned bytes do not decode to the transaction that was sent.
    #[error("signed payload does not match the transaction sent for signing: {0}")]
    PayloadMismatch(String),

    /// A required signature is missing or does not verify.
    #[error("signature for {signer} is missing or invalid")]
    InvalidSignature { signer: String },
}

/// RPC transport and protocol failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("RPC endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("RPC request timed out after {0} seconds")]
    Timeout(u64),

    #[error("malformed RPC response: {0}")]
    MalformedResponse(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("rate limited: {0}")]
    RateLimited(String),
}

/// Network-level rejection of a submitted transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The network already saw a transaction with this signature.
    #[error("duplicate transaction: {0}")]
    DuplicateTransaction(String),

    /// The blockhash expired before the transaction landed.
    #[error("blockhash not found; the transfer must be rebuilt and re-signed")]
    BlockhashNotFound,

    #[error("transaction rejected: {0}")]
    Rejected(String),
}

/// Top-level error for wallet operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),

    /// Airdrop confirmation was not observed in time.
    #[error("transaction {id} not confirmed within {secs} seconds")]
    Timeout { id: String, secs: u64 },

    /// The same action is already running for this key.
    #[error("{0} already in progress")]
    InFlight(String),
}

impl WalletError {
    /// Taxonomy name used in logs and metrics labels.
    pub fn category(&self) -> &'static str {
        match self {
            WalletError::InvalidInput(_) => "invalid_input",
            WalletError::Auth(_) => "auth",
            WalletError::Signing(_) => "signing",
            WalletError::Network(_) => "network",
            WalletError::Submission(_) => "submission",
            WalletError::Timeout { .. } => "timeout",
            WalletError::InFlight(_) => "in_flight",
        }
    }

    /// True when the whole transfer must restart from validation with a fresh blockhash.
    pub fn requires_full_retry(&self) -> bool {
        matches!(self, WalletError::Submission(SubmissionError::BlockhashNotFound))
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
