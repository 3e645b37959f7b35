//! JSON-RPC 2.0 client for the handful of read-only methods the runtime
//! needs. The transport is a trait so tests can inject canned responses.

use std::fmt;

use num_bigint::BigInt;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::util;

#[derive(Debug)]
pub struct RpcError {
    pub message: String,
}

impl RpcError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RpcError {}

pub trait Transport {
    fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

pub struct HttpTransport {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Self {
        Self {
            agent: ureq::Agent::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

impl Transport for HttpTransport {
    fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: Value = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(|e| RpcError::new(format!("rpc request failed: {}", e)))?
            .into_json()
            .map_err(|e| RpcError::new(format!("rpc response is not json: {}", e)))?;

        if let Some(error) = response.get("error") {
            return Err(RpcError::new(format!("rpc error: {}", error)));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }
}

/// One emitted log, as returned by `eth_getLogs`.
#[derive(Debug, Clone, Default)]
pub struct Log {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: u64,
    pub block_hash: String,
    pub tx_hash: String,
}

#[derive(Deserialize)]
struct RawLog {
    address: String,
    topics: Vec<String>,
    data: String,
    #[serde(rename = "blockNumber")]
    block_number: String,
    #[serde(rename = "blockHash")]
    block_hash: String,
    #[serde(rename = "transactionHash")]
    transaction_hash: String,
}

#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: String,
}

/// Filter for `eth_getLogs`, pinned to a single block.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub block_hash: String,
    pub address: Option<String>,
    pub topics: Vec<Vec<String>>,
}

pub struct RpcClient {
    transport: Box<dyn Transport>,
}

impl RpcClient {
    pub fn new(endpoint: &str) -> Self {
        Self::with_transport(Box::new(HttpTransport::new(endpoint)))
    }

    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `eth_call` against the latest block.
    pub fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let params = json!([{ "to": to, "data": util::encode_hex(data) }, "latest"]);
        let result = self.transport.request("eth_call", params)?;
        let output = result
            .as_str()
            .ok_or_else(|| RpcError::new("eth_call result is not a string"))?;
        util::decode_hex(output).map_err(RpcError::new)
    }

    pub fn balance(&self, address: &str) -> Result<BigInt, RpcError> {
        let result = self
            .transport
            .request("eth_getBalance", json!([address, "latest"]))?;
        parse_quantity(&result)
    }

    pub fn nonce(&self, address: &str) -> Result<u64, RpcError> {
        let result = self
            .transport
            .request("eth_getTransactionCount", json!([address, "latest"]))?;
        parse_quantity(&result)?
            .try_into()
            .map_err(|_| RpcError::new("nonce out of range"))
    }

    pub fn latest_block(&self) -> Result<BlockHeader, RpcError> {
        let result = self
            .transport
            .request("eth_getBlockByNumber", json!(["latest", false]))?;

        let number = result
            .get("number")
            .map(parse_quantity)
            .transpose()?
            .and_then(|n| n.try_into().ok())
            .ok_or_else(|| RpcError::new("block header has no number"))?;
        let hash = result
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::new("block header has no hash"))?
            .to_string();

        Ok(BlockHeader { number, hash })
    }

    pub fn logs(&self, filter: &LogFilter) -> Result<Vec<Log>, RpcError> {
        let mut query = json!({
            "blockHash": filter.block_hash,
            "topics": filter.topics,
        });
        if let Some(address) = &filter.address {
            query["address"] = json!(address);
        }

        let result = self.transport.request("eth_getLogs", json!([query]))?;
        let raw: Vec<RawLog> = serde_json::from_value(result)
            .map_err(|e| RpcError::new(format!("malformed log list: {}", e)))?;

        raw.into_iter()
            .map(|log| {
                Ok(Log {
                    address: log.address.to_lowercase(),
                    topics: log.topics,
                    data: log.data,
                    block_number: parse_quantity(&Value::String(log.block_number))?
                        .try_into()
                        .map_err(|_| RpcError::new("block number out of range"))?,
                    block_hash: log.block_hash,
                    tx_hash: log.transaction_hash,
                })
            })
            .collect()
    }
}

/// Parse a hex quantity (`"0x1a"`) into an integer.
fn parse_quantity(value: &Value) -> Result<BigInt, RpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::new(format!("quantity is not a string: {}", value)))?;
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        return Ok(BigInt::from(0));
    }
    BigInt::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| RpcError::new(format!("invalid quantity {:?}", text)))
}
