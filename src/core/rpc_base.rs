use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::abi::{decode_hex, decode_revert, encode_hex, AbiError, Address};
use super::network_config::PINDORA_TESTNET;

// error type
#[derive(Debug, Clone, PartialEq)]
pub enum RpcError {
    ConnectionFailed(String),
    /// Non-2xx HTTP reply
    Http { status: u16, status_text: String },
    /// Error object returned by the node, with the decoded revert reason when present
    Node {
        code: i64,
        message: String,
        reason: Option<String>,
    },
    InvalidResponse(String),
    Abi(AbiError),
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::ConnectionFailed(msg) => write!(f, "RPC connection failed: {}", msg),
            RpcError::Http { status, status_text } => {
                write!(f, "RPC connection failed: HTTP {} {}", status, status_text)
            }
            RpcError::Node { message, reason: Some(reason), .. } if !message.contains(reason.as_str()) => {
                write!(f, "{}: {}", message, reason)
            }
            RpcError::Node { message, .. } => write!(f, "{}", message),
            RpcError::InvalidResponse(msg) => write!(f, "Invalid RPC response: {}", msg),
            RpcError::Abi(err) => write!(f, "Failed to decode contract data: {}", err),
        }
    }
}

impl RpcError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RpcError::Http { status: 404, .. })
    }
}

impl From<AbiError> for RpcError {
    fn from(err: AbiError) -> Self {
        RpcError::Abi(err)
    }
}

#[derive(Serialize)]
struct RpcRequest<T> {
    jsonrpc: &'static str,  // always "2.0"
    id: u64,                // unique per page session
    method: String,         // e.g. eth_call
    params: T,              // positional params array
}

/// Mined transaction as reported by `eth_getTransactionReceipt`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,  // 0x-prefixed hash
    pub block_number: String,      // hex quantity
    pub status: String,            // "0x1" success, "0x0" reverted
}

impl TransactionReceipt {
    // post-Byzantium receipts only; pre-fork receipts carry a root instead of a status
    pub fn succeeded(&self) -> bool {
        parse_quantity(&self.status).map(|s| s == 1).unwrap_or(false)
    }

    pub fn block(&self) -> Option<u64> {
        parse_quantity(&self.block_number).ok().and_then(|b| u64::try_from(b).ok())
    }
}

/// Parse a JSON-RPC hex quantity such as `"0x1b4"`
pub fn parse_quantity(value: &str) -> Result<u128, RpcError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| RpcError::InvalidResponse(format!("bad quantity {}: {}", value, e)))
}

/// Pull the revert reason out of a node error's `data` field.
///
/// Nodes disagree on the shape: some send the hex string directly, others wrap it
/// as `{ "data": "0x..." }`.
fn revert_reason(data: &serde_json::Value) -> Option<String> {
    let raw = data
        .as_str()
        .or_else(|| data.get("data").and_then(|d| d.as_str()))?;
    decode_hex(raw).ok().and_then(|bytes| decode_revert(&bytes))
}

/// Turn a JSON-RPC response envelope into its result or a typed error
pub(crate) fn parse_response<R>(method: &str, value: serde_json::Value) -> Result<R, RpcError>
where
    R: for<'de> Deserialize<'de>,
{
    if let Some(error) = value.get("error") {
        log::error!("RPC error for {}: {}", method, error);
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        let reason = error.get("data").and_then(revert_reason);
        return Err(RpcError::Node { code, message, reason });
    }

    match value.get("result") {
        Some(result) => serde_json::from_value(result.clone()).map_err(|e| {
            log::error!("Failed to deserialize result for method {}: {:?}", method, e);
            RpcError::InvalidResponse(format!("Failed to deserialize result: {}", e))
        }),
        None => {
            log::error!("RPC response missing result field for method {}", method);
            Err(RpcError::InvalidResponse("Response missing result field".to_string()))
        }
    }
}

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// JSON-RPC client for the chain's public node
#[derive(Debug, Clone, PartialEq)]
pub struct RpcConnection {
    endpoint: String,
}

impl Default for RpcConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcConnection {
    pub fn new() -> Self {
        Self::with_endpoint(PINDORA_TESTNET.rpc_url)
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
        }
    }

    /// Send a JSON-RPC request and deserialize its `result`
    ///
    /// Node errors are mapped to `RpcError::Node`; transport failures to
    /// `RpcError::ConnectionFailed`.
    pub async fn send_request<T, R>(&self, method: &str, params: T) -> Result<R, RpcError>
    where
        T: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            method: method.to_string(),
            params,
        };

        let request_body = serde_json::to_string(&request).map_err(|e| {
            log::error!("Failed to serialize request: {}", e);
            RpcError::InvalidResponse(e.to_string())
        })?;
        log::debug!("RPC request body: {}", request_body);

        let value = fetch_json(&self.endpoint, Some(&request_body)).await?;
        let result = parse_response(method, value)?;
        log::debug!("RPC request {} completed successfully", method);
        Ok(result)
    }

    /// Read-only contract call against the latest block
    ///
    /// Reverts come back as `RpcError::Node` with the decoded reason attached,
    /// which is how the mint dry run surfaces contract errors before the wallet prompt.
    ///
    /// # Parameters
    /// * `to` - contract address
    /// * `data` - calldata including the selector
    /// * `from` - caller, needed for checks that depend on `msg.sender`
    /// * `value` - native value in wei, omitted from the call when zero
    ///
    /// # Returns
    /// The raw return data
    pub async fn eth_call(
        &self,
        to: &Address,
        data: &[u8],
        from: Option<&Address>,
        value: u128,
    ) -> Result<Vec<u8>, RpcError> {
        let mut call = serde_json::json!({
            "to": to.to_string(),
            "data": encode_hex(data),
        });
        if let Some(from) = from {
            call["from"] = serde_json::Value::String(from.to_string());
        }
        if value > 0 {
            call["value"] = serde_json::Value::String(format!("0x{:x}", value));
        }

        let result: String = self
            .send_request("eth_call", serde_json::json!([call, "latest"]))
            .await?;
        Ok(decode_hex(&result)?)
    }

    /// Receipt for a transaction hash, `None` while it is still pending
    pub async fn transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        self.send_request("eth_getTransactionReceipt", vec![tx_hash]).await
    }
}

/// Everything the contract reader and the mint flow need from the network.
///
/// `RpcConnection` is the real implementation; tests plug in canned transports.
#[allow(async_fn_in_trait)]
pub trait ChainTransport {
    async fn eth_call(
        &self,
        to: &Address,
        data: &[u8],
        from: Option<&Address>,
        value: u128,
    ) -> Result<Vec<u8>, RpcError>;

    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TransactionReceipt>, RpcError>;

    /// GET a JSON document (contract metadata, allowlist snapshots)
    async fn fetch_document(&self, url: &str) -> Result<serde_json::Value, RpcError>;
}

impl ChainTransport for RpcConnection {
    async fn eth_call(
        &self,
        to: &Address,
        data: &[u8],
        from: Option<&Address>,
        value: u128,
    ) -> Result<Vec<u8>, RpcError> {
        RpcConnection::eth_call(self, to, data, from, value).await
    }

    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TransactionReceipt>, RpcError> {
        RpcConnection::transaction_receipt(self, tx_hash).await
    }

    async fn fetch_document(&self, url: &str) -> Result<serde_json::Value, RpcError> {
        fetch_json(url, None).await
    }
}

/// POST (with a body) or GET (without) a URL and parse the JSON reply
pub async fn fetch_json(url: &str, body: Option<&str>) -> Result<serde_json::Value, RpcError> {
    let opts = RequestInit::new();
    opts.set_mode(RequestMode::Cors);
    match body {
        Some(body) => {
            opts.set_method("POST");
            opts.set_body(&JsValue::from_str(body));
        }
        None => opts.set_method("GET"),
    }

    let request = Request::new_with_str_and_init(url, &opts).map_err(|e| {
        log::error!("Failed to create HTTP request: {:?}", e);
        RpcError::ConnectionFailed(format!("Failed to create request: {:?}", e))
    })?;

    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|e| RpcError::ConnectionFailed(format!("Failed to set headers: {:?}", e)))?;
    }

    let window = web_sys::window()
        .ok_or_else(|| RpcError::ConnectionFailed("No window object".to_string()))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| {
            log::error!("HTTP request failed: {:?}", e);
            RpcError::ConnectionFailed(format!("Failed to send request: {:?}", e))
        })?;

    let resp: Response = resp_value
        .dyn_into()
        .map_err(|e| RpcError::InvalidResponse(format!("Failed to convert response: {:?}", e)))?;

    if !resp.ok() {
        log::error!("HTTP error: status={}, status_text={}", resp.status(), resp.status_text());
        return Err(RpcError::Http {
            status: resp.status(),
            status_text: resp.status_text(),
        });
    }

    let text_promise = resp
        .text()
        .map_err(|e| RpcError::InvalidResponse(format!("Failed to read body: {:?}", e)))?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|e| RpcError::InvalidResponse(format!("Failed to read body: {:?}", e)))?
        .as_string()
        .ok_or_else(|| RpcError::InvalidResponse("Body is not text".to_string()))?;

    serde_json::from_str(&text).map_err(|e| {
        log::error!("Failed to parse JSON: {}", e);
        RpcError::InvalidResponse(format!("Failed to parse JSON: {}", e))
    })
}
