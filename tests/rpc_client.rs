//! JSON-RPC client against a mock node.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use magic_sol_client::blockchain::types::{ConfirmationStatus, Hash, Pubkey, TransactionId};
use magic_sol_client::blockchain::{NetworkRpc, SolanaRpcClient};
use magic_sol_client::config::NetworkConfig;
use magic_sol_client::error::{NetworkError, SubmissionError, WalletError};

mod common;

type Handler = Arc<dyn Fn(&str, &Value, usize) -> (StatusCode, Value) + Send + Sync>;

#[derive(Clone)]
struct MockNode {
    handler: Handler,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn rpc(State(node): State<MockNode>, Json(request): Json<Value>) -> (StatusCode, Json<Value>) {
    let n = node.calls.fetch_add(1, Ordering::SeqCst);
    node.requests.lock().unwrap().push(request.clone());

    let method = request["method"].as_str().unwrap_or_default().to_string();
    let (status, mut body) = (node.handler)(&method, &request["params"], n);
    body["jsonrpc"] = json!("2.0");
    body["id"] = request["id"].clone();
    (status, Json(body))
}

fn ok(result: Value) -> (StatusCode, Value) {
    (StatusCode::OK, json!({ "result": result }))
}

fn rpc_error(code: i64, message: &str) -> (StatusCode, Value) {
    (StatusCode::OK, json!({ "error": { "code": code, "message": message } }))
}

fn with_context(value: Value) -> Value {
    json!({ "context": { "slot": 100 }, "value": value })
}

async fn start_node<F>(handler: F) -> (SocketAddr, MockNode)
where
    F: Fn(&str, &Value, usize) -> (StatusCode, Value) + Send + Sync + 'static,
{
    let node = MockNode {
        handler: Arc::new(handler),
        calls: Arc::new(AtomicUsize::new(0)),
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let router = Router::new().route("/", post(rpc)).with_state(node.clone());
    (common::start_mock_server(router).await, node)
}

/// An address nothing listens on.
async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn client_for(primary: SocketAddr, failovers: &[SocketAddr]) -> SolanaRpcClient {
    SolanaRpcClient::new(NetworkConfig {
        rpc_url: format!("http://{}", primary),
        failover_urls: failovers.iter().map(|a| format!("http://{}", a)).collect(),
        rpc_timeout_secs: 2,
        confirmation_timeout_secs: 1,
        confirmation_poll_ms: 20,
        ..NetworkConfig::default()
    })
    .unwrap()
}

fn account() -> Pubkey {
    Pubkey::new([5u8; 32])
}

#[tokio::test]
async fn test_get_balance() {
    let (addr, node) = start_node(|method, _, _| match method {
        "getBalance" => ok(with_context(json!(2_000_000_000u64))),
        _ => rpc_error(-32601, "Method not found"),
    })
    .await;
    let client = client_for(addr, &[]);

    assert_eq!(client.get_balance(&account()).await.unwrap(), 2_000_000_000);

    let request = node.requests.lock().unwrap()[0].clone();
    assert_eq!(request["method"], "getBalance");
    assert_eq!(request["params"][0], account().to_string());
    assert_eq!(request["params"][1]["commitment"], "confirmed");
}

#[tokio::test]
async fn test_reads_fail_over_writes_do_not() {
    let (backup, node) = start_node(|method, _, _| match method {
        "getLatestBlockhash" => ok(with_context(json!({
            "blockhash": Hash([1u8; 32]).to_string(),
            "lastValidBlockHeight": 200
        }))),
        _ => ok(json!("should-not-be-sent")),
    })
    .await;
    let client = client_for(dead_addr().await, &[backup]);

    assert_eq!(client.get_latest_blockhash().await.unwrap(), Hash([1u8; 32]));
    assert_eq!(node.calls.load(Ordering::SeqCst), 1);

    let err = client.send_raw_transaction(&[1, 2, 3]).await.unwrap_err();
    assert!(matches!(err, WalletError::Network(NetworkError::Unreachable(_))));
    assert_eq!(node.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rpc_error_does_not_fail_over() {
    let (primary, _) = start_node(|_, _, _| rpc_error(-32602, "Invalid param: WrongSize")).await;
    let (backup, backup_node) = start_node(|_, _, _| ok(with_context(json!(1)))).await;
    let client = client_for(primary, &[backup]);

    let err = client.get_balance(&account()).await.unwrap_err();
    assert_eq!(
        err,
        WalletError::Network(NetworkError::Rpc {
            code: -32602,
            message: "Invalid param: WrongSize".into()
        })
    );
    assert_eq!(backup_node.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_airdrop_rate_limits() {
    let (addr, _) = start_node(|_, _, _| (StatusCode::TOO_MANY_REQUESTS, json!({}))).await;
    let err = client_for(addr, &[]).request_airdrop(&account(), 1).await.unwrap_err();
    assert!(matches!(err, WalletError::Network(NetworkError::RateLimited(_))));

    let (addr, _) = start_node(|_, _, _| {
        rpc_error(-32603, "You've either reached your airdrop limit today or the airdrop faucet has run dry.")
    })
    .await;
    let err = client_for(addr, &[]).request_airdrop(&account(), 1).await.unwrap_err();
    assert!(matches!(err, WalletError::Network(NetworkError::RateLimited(_))));
}

#[tokio::test]
async fn test_send_transaction_encoding_and_errors() {
    let (addr, node) = start_node(|_, params, n| {
        if n == 0 {
            assert_eq!(params[0], "AQID");
            assert_eq!(params[1]["encoding"], "base64");
            ok(json!("Txn2"))
        } else {
            rpc_error(-32002, "Transaction simulation failed: Blockhash not found")
        }
    })
    .await;
    let client = client_for(addr, &[]);

    assert_eq!(
        client.send_raw_transaction(&[1, 2, 3]).await.unwrap(),
        TransactionId::from("Txn2")
    );

    let err = client.send_raw_transaction(&[1, 2, 3]).await.unwrap_err();
    assert_eq!(err, WalletError::Submission(SubmissionError::BlockhashNotFound));
    assert_eq!(node.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_confirmation_polls_until_commitment() {
    let (addr, node) = start_node(|_, _, n| match n {
        0 => ok(with_context(json!([null]))),
        1 => ok(with_context(json!([{
            "slot": 41, "confirmations": 0, "err": null, "confirmationStatus": "processed"
        }]))),
        _ => ok(with_context(json!([{
            "slot": 42, "confirmations": 1, "err": null, "confirmationStatus": "confirmed"
        }]))),
    })
    .await;

    let status = client_for(addr, &[])
        .confirm_transaction(&TransactionId::from("Txn1"))
        .await
        .unwrap();
    assert_eq!(status, ConfirmationStatus::Confirmed { slot: 42 });
    assert_eq!(node.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_confirmation_survives_a_failed_poll() {
    let (addr, node) = start_node(|_, _, n| match n {
        0 => (StatusCode::BAD_GATEWAY, json!({})),
        _ => ok(with_context(json!([{
            "slot": 77, "confirmations": 1, "err": null, "confirmationStatus": "confirmed"
        }]))),
    })
    .await;

    let status = client_for(addr, &[])
        .confirm_transaction(&TransactionId::from("Txn1"))
        .await
        .unwrap();
    assert_eq!(status, ConfirmationStatus::Confirmed { slot: 77 });
    assert!(node.calls.load(Ordering::SeqCst) >= 2);

    // a node that never answers still ends in a timeout, not an error
    let (addr, _) = start_node(|_, _, _| (StatusCode::SERVICE_UNAVAILABLE, json!({}))).await;
    let status = client_for(addr, &[])
        .confirm_transaction(&TransactionId::from("Txn1"))
        .await
        .unwrap();
    assert_eq!(status, ConfirmationStatus::TimedOut { waited_secs: 1 });
}

#[tokio::test]
async fn test_confirmation_failure_and_timeout() {
    let (addr, _) = start_node(|_, _, _| {
        ok(with_context(json!([{
            "slot": 9, "err": { "InstructionError": [0, "Custom"] }, "confirmationStatus": "confirmed"
        }])))
    })
    .await;
    let status = client_for(addr, &[])
        .confirm_transaction(&TransactionId::from("Txn1"))
        .await
        .unwrap();
    assert!(matches!(status, ConfirmationStatus::Failed(_)));

    let (addr, _) = start_node(|_, _, _| ok(with_context(json!([null])))).await;
    let status = client_for(addr, &[])
        .confirm_transaction(&TransactionId::from("Txn1"))
        .await
        .unwrap();
    assert_eq!(status, ConfirmationStatus::TimedOut { waited_secs: 1 });
}

#[tokio::test]
async fn test_malformed_response() {
    let (addr, _) = start_node(|_, _, _| ok(json!("not a context object"))).await;
    let err = client_for(addr, &[]).get_balance(&account()).await.unwrap_err();
    assert!(matches!(err, WalletError::Network(NetworkError::MalformedResponse(_))));
}
