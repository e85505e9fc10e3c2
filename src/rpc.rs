use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::models::{Block, Transaction, TransactionReceipt};

/// Failures of a single JSON-RPC round trip.
///
/// `Network` and `EmptyResponse` mean the call never produced a body,
/// `Decode`, `Node` and `MissingResult` mean the body was not a usable
/// JSON-RPC result, and `Parse` means a hex quantity inside it was malformed.
#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("empty response body")]
    EmptyResponse,
    #[error("malformed json-rpc response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("node returned error {code}: {message}")]
    Node { code: i64, message: String },
    #[error("{method} returned no result")]
    MissingResult { method: String },
    #[error("invalid hex quantity {value:?}: {reason}")]
    Parse { value: String, reason: String },
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    #[serde(default = "Option::default")]
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: Url,
}

impl RpcClient {
    pub fn new(rpc_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .context("failed to build reqwest client")?;
        let url = Url::parse(rpc_url).context("invalid RPC_URL")?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };
        tracing::debug!(method, params = %request.params, "json-rpc call");

        let body = self
            .http
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        decode_response(method, &body)
    }

    pub async fn fetch_block_transactions(&self, block: u64) -> Result<Vec<Transaction>, RpcError> {
        let block: Block = self
            .call("eth_getBlockByNumber", json!([to_hex_quantity(block), true]))
            .await?;
        Ok(block.transactions)
    }

    pub async fn fetch_gas_used(&self, tx_hash: &str) -> Result<u64, RpcError> {
        let receipt: TransactionReceipt = self
            .call("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        parse_hex_u64(&receipt.gas_used)
    }
}

fn decode_response<T: DeserializeOwned>(method: &str, body: &[u8]) -> Result<T, RpcError> {
    if body.is_empty() {
        return Err(RpcError::EmptyResponse);
    }
    let response: RpcResponse<T> = serde_json::from_slice(body)?;
    if let Some(err) = response.error {
        return Err(RpcError::Node {
            code: err.code,
            message: err.message,
        });
    }
    response.result.ok_or_else(|| RpcError::MissingResult {
        method: method.to_string(),
    })
}

pub fn to_hex_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Parses a `0x`-prefixed hex quantity. The prefix is mandatory.
pub fn parse_hex_u64(raw: &str) -> Result<u64, RpcError> {
    let digits = raw.strip_prefix("0x").ok_or_else(|| RpcError::Parse {
        value: raw.to_string(),
        reason: "missing 0x prefix".to_string(),
    })?;
    u64::from_str_radix(digits, 16).map_err(|e| RpcError::Parse {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
