use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use reserved_gas_scanner::aggregator::GasAggregator;
use reserved_gas_scanner::models::ContractSet;
use reserved_gas_scanner::report::{self, ReportWriter};
use reserved_gas_scanner::rpc::{RpcClient, RpcError};
use reserved_gas_scanner::stats::ReportStats;

/// Canned chain served by the mock JSON-RPC node.
#[derive(Default)]
struct MockChain {
    /// block number -> (tx hash, to)
    blocks: HashMap<u64, Vec<(String, Option<String>)>>,
    /// tx hash -> gasUsed (hex)
    receipts: HashMap<String, String>,
    broken_blocks: HashSet<u64>,
    broken_receipts: HashSet<String>,
}

async fn rpc(State(chain): State<Arc<MockChain>>, Json(req): Json<Value>) -> Response {
    let method = req["method"].as_str().unwrap_or_default();
    let params = &req["params"];

    match method {
        "eth_getBlockByNumber" => {
            assert_eq!(params[1], json!(true));
            let raw = params[0].as_str().unwrap_or_default();
            let number = u64::from_str_radix(raw.trim_start_matches("0x"), 16).unwrap();
            if chain.broken_blocks.contains(&number) {
                return StatusCode::BAD_GATEWAY.into_response();
            }
            let Some(txs) = chain.blocks.get(&number) else {
                return Json(json!({"jsonrpc": "2.0", "id": 1, "result": null})).into_response();
            };
            let transactions: Vec<Value> = txs
                .iter()
                .map(|(hash, to)| {
                    json!({
                        "hash": hash,
                        "from": "0x0000000000000000000000000000000000000001",
                        "to": to,
                        "gas": "0x7a120",
                        "gasPrice": "0x4a817c800",
                    })
                })
                .collect();
            Json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "number": raw, "transactions": transactions }
            }))
            .into_response()
        }
        "eth_getTransactionReceipt" => {
            let hash = params[0].as_str().unwrap_or_default();
            if chain.broken_receipts.contains(hash) {
                return (StatusCode::OK, "").into_response();
            }
            match chain.receipts.get(hash) {
                Some(gas_used) => Json(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": { "transactionHash": hash, "gasUsed": gas_used }
                }))
                .into_response(),
                None => Json(json!({"jsonrpc": "2.0", "id": 1, "result": null})).into_response(),
            }
        }
        _ => Json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32601, "message": "method not found" }
        }))
        .into_response(),
    }
}

async fn spawn_node(chain: MockChain) -> (RpcClient, JoinHandle<()>) {
    let app = Router::new()
        .route("/", post(rpc))
        .with_state(Arc::new(chain));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let server = axum::serve(listener, app);
    let handle = tokio::spawn(async move {
        let _ = server.await;
    });

    let client = RpcClient::new(&format!("http://{}/", addr)).unwrap();
    (client, handle)
}

fn tx(hash: &str, to: &str) -> (String, Option<String>) {
    (hash.to_string(), Some(to.to_string()))
}

fn sorted_lines(out: Vec<u8>) -> Vec<String> {
    let mut lines: Vec<String> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    lines
}

#[tokio::test]
async fn emits_only_nonzero_contracts() {
    let contracts = ContractSet::default();
    let mut chain = MockChain::default();
    chain.blocks.insert(
        199,
        vec![
            tx("0xa1", &contracts.validator_set),
            tx("0xa2", &contracts.profile),
            tx("0xa3", "0x00000000000000000000000000000000deadbeef"),
            (String::from("0xa4"), None),
        ],
    );
    chain.receipts.insert("0xa1".into(), "0x5208".into());
    chain.receipts.insert("0xa2".into(), "0xc350".into());
    chain.receipts.insert("0xa3".into(), "0x1".into());
    let (client, handle) = spawn_node(chain).await;

    let mut writer = ReportWriter::new(Vec::new());
    let summary = GasAggregator::new(&client, &contracts)
        .collect(&[199], &mut writer)
        .await
        .unwrap();
    let lines = sorted_lines(writer.finish().unwrap());

    let mut expected = vec![
        format!("Block: 199, Contract: {}, GasUsed: 21000", contracts.validator_set),
        format!("Block: 199, Contract: {}, GasUsed: 50000", contracts.profile),
    ];
    expected.sort();
    assert_eq!(lines, expected);
    assert_eq!(summary.lines_written, 2);
    assert_eq!(summary.blocks_processed, 1);
    handle.abort();
}

#[tokio::test]
async fn sums_multiple_transactions_per_contract() {
    let contracts = ContractSet::default();
    let mut chain = MockChain::default();
    chain.blocks.insert(
        399,
        vec![
            tx("0xb1", &contracts.slash_indicator),
            tx("0xb2", &contracts.slash_indicator),
            tx("0xb3", &contracts.staking),
            tx("0xb4", &contracts.finality_tracking),
        ],
    );
    for hash in ["0xb1", "0xb2", "0xb3", "0xb4"] {
        chain.receipts.insert(hash.into(), "0x3e8".into());
    }
    let (client, handle) = spawn_node(chain).await;

    let usage = GasAggregator::new(&client, &contracts)
        .aggregate_block(399)
        .await
        .unwrap();
    assert_eq!(usage.totals.len(), 5);
    assert_eq!(usage.totals[&contracts.slash_indicator], 2_000);
    assert_eq!(usage.totals[&contracts.staking], 0);
    assert_eq!(usage.totals[&contracts.finality_tracking], 0);
    assert_eq!(usage.non_zero().count(), 1);
    handle.abort();
}

#[tokio::test]
async fn failed_block_is_skipped_and_run_continues() {
    let contracts = ContractSet::default();
    let mut chain = MockChain::default();
    chain.broken_blocks.insert(199);
    chain.blocks.insert(399, vec![tx("0xc1", &contracts.profile)]);
    chain.receipts.insert("0xc1".into(), "0x64".into());
    let (client, handle) = spawn_node(chain).await;

    let aggregator = GasAggregator::new(&client, &contracts);
    assert!(matches!(
        aggregator.aggregate_block(199).await,
        Err(RpcError::Network(_))
    ));

    let mut writer = ReportWriter::new(Vec::new());
    let summary = aggregator
        .collect(&[199, 399, 599], &mut writer)
        .await
        .unwrap();
    let lines = sorted_lines(writer.finish().unwrap());

    assert_eq!(
        lines,
        vec![format!("Block: 399, Contract: {}, GasUsed: 100", contracts.profile)]
    );
    // 599 is unknown to the node: a null result also skips the block.
    assert_eq!(summary.blocks_selected, 3);
    assert_eq!(summary.blocks_skipped, 2);
    assert_eq!(summary.blocks_processed, 1);
    handle.abort();
}

#[tokio::test]
async fn failed_receipt_excludes_only_that_transaction() {
    let contracts = ContractSet::default();
    let mut chain = MockChain::default();
    chain.blocks.insert(
        799,
        vec![
            tx("0xd1", &contracts.validator_set),
            tx("0xd2", &contracts.validator_set),
            tx("0xd3", &contracts.profile),
            tx("0xd4", &contracts.profile),
        ],
    );
    chain.receipts.insert("0xd1".into(), "0x5208".into());
    chain.receipts.insert("0xd3".into(), "0xc350".into());
    // gasUsed without the 0x prefix
    chain.receipts.insert("0xd4".into(), "5208".into());
    chain.broken_receipts.insert("0xd2".into());
    let (client, handle) = spawn_node(chain).await;

    let aggregator = GasAggregator::new(&client, &contracts);
    assert!(matches!(
        client.fetch_gas_used("0xd2").await,
        Err(RpcError::EmptyResponse)
    ));
    assert!(matches!(
        client.fetch_gas_used("0xd4").await,
        Err(RpcError::Parse { .. })
    ));

    let usage = aggregator.aggregate_block(799).await.unwrap();
    assert_eq!(usage.failed_receipts, 2);
    assert_eq!(usage.totals[&contracts.validator_set], 21_000);
    assert_eq!(usage.totals[&contracts.profile], 50_000);
    handle.abort();
}

#[tokio::test]
async fn node_errors_are_decoded() {
    let (client, handle) = spawn_node(MockChain::default()).await;
    assert!(matches!(
        client.fetch_gas_used("0xmissing").await,
        Err(RpcError::MissingResult { .. })
    ));
    handle.abort();
}

#[tokio::test]
async fn report_round_trips_into_stats() {
    let contracts = ContractSet::default();
    let mut chain = MockChain::default();
    chain.blocks.insert(199, vec![tx("0xe1", &contracts.validator_set)]);
    chain.blocks.insert(
        399,
        vec![tx("0xe2", &contracts.validator_set), tx("0xe3", &contracts.profile)],
    );
    chain.receipts.insert("0xe1".into(), "0x64".into());
    chain.receipts.insert("0xe2".into(), "0xc8".into());
    chain.receipts.insert("0xe3".into(), "0x12c".into());
    let (client, handle) = spawn_node(chain).await;

    let path = std::env::temp_dir().join(format!(
        "reserved_gas_scanner_test_{}.txt",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::write(&path, "stale contents from a previous run\n").unwrap();

    let mut writer = ReportWriter::create(&path).unwrap();
    GasAggregator::new(&client, &contracts)
        .collect(&[199, 399], &mut writer)
        .await
        .unwrap();
    writer.finish().unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let records = report::read_report(std::io::BufReader::new(file)).unwrap();
    assert_eq!(records.len(), 3);

    let stats = ReportStats::from_records(&records, &contracts);
    assert_eq!(stats.blocks.count, 2);
    assert_eq!(stats.blocks.min, 100);
    assert_eq!(stats.blocks.max, 500);
    assert_eq!(stats.blocks.median, 300);
    assert_eq!(stats.blocks.avg, 300.0);

    let _ = std::fs::remove_file(&path);
    handle.abort();
}
