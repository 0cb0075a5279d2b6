//! Metrics collection.
//!
//! # Metrics
//! - `wallet_rpc_requests_total` (counter): RPC calls by method, outcome
//! - `wallet_rpc_request_duration_seconds` (histogram): RPC latency by method
//! - `wallet_transfers_total` (counter): transfer attempts by outcome
//! - `wallet_airdrops_total` (counter): airdrop attempts by outcome
//! - `wallet_session_events_total` (counter): login/logout/check by outcome

use std::time::Duration;

use crate::error::WalletError;

/// Outcome label for a result: "ok" or the error category.
pub fn outcome_label<T>(result: &Result<T, WalletError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.category(),
    }
}

/// Record one RPC call.
pub fn record_rpc_request(method: &'static str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!("wallet_rpc_requests_total", "method" => method, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("wallet_rpc_request_duration_seconds", "method" => method)
        .record(elapsed.as_secs_f64());
}

pub fn record_transfer(outcome: &'static str) {
    metrics::counter!("wallet_transfers_total", "outcome" => outcome).increment(1);
}

pub fn record_airdrop(outcome: &'static str) {
    metrics::counter!("wallet_airdrops_total", "outcome" => outcome).increment(1);
}

pub fn record_session_event(event: &'static str, outcome: &'static str) {
    metrics::counter!("wallet_session_events_total", "event" => event, "outcome" => outcome)
        .increment(1);
}
