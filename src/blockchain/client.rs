//! Solana JSON-RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Speak JSON-RPC 2.0 to the configured endpoint
//! - Query balances, blockhashes and signature statuses
//! - Request airdrops and submit signed transactions
//! - Classify RPC failures into the wallet error taxonomy
//!
//! Reads fail over across the configured endpoints. Writes (airdrop,
//! submission) go to the primary only and are never repeated.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::time::{interval, timeout};

use crate::blockchain::rpc::NetworkRpc;
use crate::blockchain::types::{ConfirmationStatus, Hash, Pubkey, TransactionId};
use crate::config::NetworkConfig;
use crate::error::{NetworkError, SubmissionError, WalletError, WalletResult};
use crate::observability::metrics;

/// Preflight simulation failed; the message carries the runtime error.
const PREFLIGHT_FAILURE_CODE: i64 = -32002;

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Responses wrapped in `{ context, value }`.
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    slot: u64,
    err: Option<Value>,
    confirmation_status: Option<String>,
}

/// Whether a failed call may be repeated against the next endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Idempotency {
    Read,
    Write,
}

/// Solana RPC client with failover for reads.
pub struct SolanaRpcClient {
    http: reqwest::Client,
    /// Primary endpoint first, then failovers.
    endpoints: Vec<url::Url>,
    config: NetworkConfig,
    next_id: AtomicU64,
}

impl SolanaRpcClient {
    /// Create a client from network configuration.
    pub fn new(config: NetworkConfig) -> WalletResult<Self> {
        let primary = config.rpc_url.parse::<url::Url>().map_err(|e| {
            NetworkError::Unreachable(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let mut endpoints = vec![primary];

        for url_str in &config.failover_urls {
            match url_str.parse() {
                Ok(url) => endpoints.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.rpc_timeout_secs))
            .build()
            .map_err(|e| NetworkError::Unreachable(format!("HTTP client setup failed: {}", e)))?;

        tracing::info!(
            rpc_url = %config.rpc_url,
            failovers = endpoints.len() - 1,
            cluster = ?config.cluster,
            "Solana RPC client initialized"
        );

        Ok(Self {
            http,
            endpoints,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    fn commitment(&self) -> Value {
        json!({ "commitment": self.config.commitment })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
        idempotency: Idempotency,
    ) -> WalletResult<T> {
        let started = Instant::now();
        let endpoints = match idempotency {
            Idempotency::Read => &self.endpoints[..],
            Idempotency::Write => &self.endpoints[..1],
        };

        let mut last_err = None;
        for (i, endpoint) in endpoints.iter().enumerate() {
            match self.call_endpoint(endpoint, method, &params).await {
                Ok(result) => {
                    metrics::record_rpc_request(method, "ok", started.elapsed());
                    return Ok(result);
                }
                // Only transport failures move on; an RPC-level answer is authoritative
                Err(e @ WalletError::Network(NetworkError::Unreachable(_)))
                | Err(e @ WalletError::Network(NetworkError::Timeout(_))) => {
                    tracing::warn!(endpoint_idx = i, method, error = %e, "RPC transport failure");
                    last_err = Some(e);
                }
                Err(e) => {
                    metrics::record_rpc_request(method, e.category(), started.elapsed());
                    return Err(e);
                }
            }
        }

        let err = last_err
            .unwrap_or_else(|| NetworkError::Unreachable("no RPC endpoints configured".into()).into());
        metrics::record_rpc_request(method, err.category(), started.elapsed());
        Err(err)
    }

    async fn call_endpoint<T: DeserializeOwned>(
        &self,
        endpoint: &url::Url,
        method: &'static str,
        params: &Value,
    ) -> WalletResult<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params: params.clone(),
        };

        let response = self
            .http
            .post(endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NetworkError::Timeout(self.config.rpc_timeout_secs)
                } else {
                    NetworkError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(NetworkError::RateLimited(format!("{} returned 429", method)).into());
        }
        if !status.is_success() {
            return Err(NetworkError::Unreachable(format!("HTTP error: {}", status)).into());
        }

        let body: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| NetworkError::MalformedResponse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(classify_rpc_error(method, error.code, &error.message));
        }

        body.result
            .ok_or_else(|| NetworkError::MalformedResponse("missing result".into()).into())
    }

    async fn signature_status(&self, id: &TransactionId) -> WalletResult<Option<SignatureStatus>> {
        let params = json!([[id.as_str()], { "searchTransactionHistory": true }]);
        let statuses: WithContext<Vec<Option<SignatureStatus>>> =
            self.call("getSignatureStatuses", params, Idempotency::Read).await?;
        Ok(statuses.value.into_iter().next().flatten())
    }

    fn reaches_commitment(&self, status: &SignatureStatus) -> bool {
        let rank = |level: &str| match level {
            "processed" => 0,
            "confirmed" => 1,
            "finalized" => 2,
            _ => 0,
        };
        status
            .confirmation_status
            .as_deref()
            .map(|level| rank(level) >= rank(&self.config.commitment))
            .unwrap_or(false)
    }
}

/// Map an RPC error object onto the wallet taxonomy.
fn classify_rpc_error(method: &str, code: i64, message: &str) -> WalletError {
    let lower = message.to_ascii_lowercase();

    if method == "requestAirdrop"
        && (lower.contains("rate limit") || lower.contains("airdrop limit") || code == 429)
    {
        return NetworkError::RateLimited(message.to_string()).into();
    }

    if method == "sendTransaction" {
        if lower.contains("blockhash not found") {
            return SubmissionError::BlockhashNotFound.into();
        }
        if lower.contains("already been processed") || lower.contains("alreadyprocessed") {
            return SubmissionError::DuplicateTransaction(message.to_string()).into();
        }
        if lower.contains("insufficient")
            || lower.contains("no record of a prior credit")
        {
            return SubmissionError::InsufficientFunds(message.to_string()).into();
        }
        if code == PREFLIGHT_FAILURE_CODE {
            return SubmissionError::Rejected(message.to_string()).into();
        }
    }

    NetworkError::Rpc {
        code,
        message: message.to_string(),
    }
    .into()
}

#[async_trait]
impl NetworkRpc for SolanaRpcClient {
    async fn get_balance(&self, account: &Pubkey) -> WalletResult<u64> {
        let params = json!([account.to_string(), self.commitment()]);
        let balance: WithContext<u64> = self.call("getBalance", params, Idempotency::Read).await?;
        Ok(balance.value)
    }

    async fn request_airdrop(&self, account: &Pubkey, lamports: u64) -> WalletResult<TransactionId> {
        let params = json!([account.to_string(), lamports, self.commitment()]);
        let signature: String = self.call("requestAirdrop", params, Idempotency::Write).await?;
        Ok(TransactionId(signature))
    }

    async fn confirm_transaction(&self, id: &TransactionId) -> WalletResult<ConfirmationStatus> {
        let wait_secs = self.config.confirmation_timeout_secs;
        let poll = Duration::from_millis(self.config.confirmation_poll_ms);

        let result: Result<WalletResult<ConfirmationStatus>, _> = timeout(Duration::from_secs(wait_secs), async {
            let mut ticker = interval(poll);

            loop {
                ticker.tick().await;

                // A dropped poll is not a verdict; the outer deadline decides.
                let status = match self.signature_status(id).await {
                    Ok(Some(s)) => s,
                    Ok(None) => {
                        tracing::debug!(tx = %id, "Transaction not yet visible");
                        continue;
                    }
                    Err(WalletError::Network(
                        e @ (NetworkError::Unreachable(_)
                        | NetworkError::Timeout(_)
                        | NetworkError::RateLimited(_)),
                    )) => {
                        tracing::warn!(tx = %id, error = %e, "Status poll failed, retrying");
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                if let Some(err) = status.err {
                    return Ok(ConfirmationStatus::Failed(err.to_string()));
                }

                if self.reaches_commitment(&status) {
                    return Ok(ConfirmationStatus::Confirmed { slot: status.slot });
                }

                tracing::debug!(
                    tx = %id,
                    status = ?status.confirmation_status,
                    required = %self.config.commitment,
                    "Waiting for confirmation"
                );
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Ok(ConfirmationStatus::TimedOut { waited_secs: wait_secs }),
        }
    }

    async fn get_latest_blockhash(&self) -> WalletResult<Hash> {
        let params = json!([self.commitment()]);
        let latest: WithContext<LatestBlockhash> =
            self.call("getLatestBlockhash", params, Idempotency::Read).await?;
        latest
            .value
            .blockhash
            .parse::<Hash>()
            .map_err(|e| NetworkError::MalformedResponse(format!("blockhash: {}", e)).into())
    }

    async fn send_raw_transaction(&self, bytes: &[u8]) -> WalletResult<TransactionId> {
        let params = json!([
            BASE64.encode(bytes),
            { "encoding": "base64", "preflightCommitment": self.config.commitment }
        ]);
        let signature: String = self.call("sendTransaction", params, Idempotency::Write).await?;
        Ok(TransactionId(signature))
    }
}

impl std::fmt::Debug for SolanaRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpcClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("failovers", &(self.endpoints.len() - 1))
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
