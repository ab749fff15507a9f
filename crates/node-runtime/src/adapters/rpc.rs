//! # Node RPC Client
//!
//! JSON-RPC 1.0 over HTTP with Basic auth, the dialect bitcoind-family nodes
//! speak. The node answers RPC-level failures with HTTP 500 and a JSON body,
//! so the body is parsed before the status is judged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ix_03_mempool_cache::{HealthProbe, MempoolError};
use ix_04_retrieval_api::{RetrievalError, TransactionRelay};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::container::config::RpcConfig;

/// Node RPC failures.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-JSON answer, typically 401 for bad credentials.
    #[error("RPC HTTP status {0}")]
    Http(u16),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected RPC response: {0}")]
    Decode(String),
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Client for the node's JSON-RPC endpoint.
pub struct NodeRpcClient {
    http_client: reqwest::Client,
    url: String,
    username: String,
    password: String,
    request_id: AtomicU64,
}

impl NodeRpcClient {
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http_client,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            request_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!("[runtime] RPC >>> {}", method);

        let response = self
            .http_client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        let parsed: JsonRpcResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => return Err(RpcError::Http(status.as_u16())),
            Err(e) => return Err(RpcError::Decode(e.to_string())),
        };
        if let Some(error) = parsed.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(parsed.result)
    }

    /// `getsafemodeinfo`. Accepts `{"safemode": bool}` or a bare bool.
    pub async fn safe_mode_info(&self) -> Result<bool, RpcError> {
        let result = self.call("getsafemodeinfo", vec![]).await?;
        match &result {
            Value::Bool(flag) => Ok(*flag),
            Value::Object(map) => map
                .get("safemode")
                .and_then(Value::as_bool)
                .ok_or_else(|| RpcError::Decode(format!("no safemode flag in {}", result))),
            other => Err(RpcError::Decode(format!("unexpected safe mode info {}", other))),
        }
    }

    /// `sendrawtransaction`; returns the txid the node reports.
    pub async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String, RpcError> {
        match self.call("sendrawtransaction", vec![json!(raw_hex)]).await? {
            Value::String(txid) => Ok(txid),
            other => Err(RpcError::Decode(format!("unexpected txid {}", other))),
        }
    }

    /// `getrawmempool`: txids currently in the node mempool.
    pub async fn raw_mempool(&self) -> Result<Vec<String>, RpcError> {
        let result = self.call("getrawmempool", vec![]).await?;
        serde_json::from_value(result).map_err(|e| RpcError::Decode(e.to_string()))
    }

    /// `getrawtransaction` (non-verbose): raw transaction bytes.
    pub async fn raw_transaction(&self, txid: &str) -> Result<Vec<u8>, RpcError> {
        match self.call("getrawtransaction", vec![json!(txid)]).await? {
            Value::String(raw_hex) => {
                hex::decode(&raw_hex).map_err(|e| RpcError::Decode(e.to_string()))
            }
            other => Err(RpcError::Decode(format!("unexpected raw transaction {}", other))),
        }
    }
}

#[async_trait]
impl HealthProbe for NodeRpcClient {
    async fn safe_mode(&self) -> Result<bool, MempoolError> {
        self.safe_mode_info()
            .await
            .map_err(|e| MempoolError::HealthCheck(e.to_string()))
    }
}

#[async_trait]
impl TransactionRelay for NodeRpcClient {
    async fn broadcast(&self, raw_hex: &str) -> Result<String, RetrievalError> {
        self.send_raw_transaction(raw_hex)
            .await
            .map_err(|e| RetrievalError::Relay(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};

    /// Minimal node: answers by method name, rejects other credentials.
    async fn fake_node(
        headers: axum::http::HeaderMap,
        Json(request): Json<Value>,
    ) -> axum::response::Response {
        // user:pass
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "Basic dXNlcjpwYXNz")
            .unwrap_or(false);
        if !authorized {
            return (StatusCode::UNAUTHORIZED, "").into_response();
        }

        let id = request["id"].clone();
        let reply = match request["method"].as_str().unwrap_or_default() {
            "getsafemodeinfo" => json!({ "result": { "safemode": false }, "error": null, "id": id }),
            "getrawmempool" => json!({ "result": ["aa", "bb"], "error": null, "id": id }),
            "getrawtransaction" => json!({ "result": "0100", "error": null, "id": id }),
            "sendrawtransaction" => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "result": null,
                        "error": { "code": -26, "message": "txn-mempool-conflict" },
                        "id": id
                    })),
                )
                    .into_response()
            }
            _ => json!({ "result": null, "error": { "code": -32601, "message": "Method not found" }, "id": id }),
        };
        Json(reply).into_response()
    }

    async fn spawn_node() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/", post(fake_node));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(url: String, password: &str) -> NodeRpcClient {
        NodeRpcClient::new(&RpcConfig {
            url,
            username: "user".into(),
            password: password.into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_safe_mode_info() {
        let rpc = client(spawn_node().await, "pass");
        assert!(!rpc.safe_mode_info().await.unwrap());
        assert!(!rpc.safe_mode().await.unwrap());
    }

    #[tokio::test]
    async fn test_bad_credentials_surface_http_status() {
        let rpc = client(spawn_node().await, "wrong");
        assert!(matches!(rpc.safe_mode_info().await, Err(RpcError::Http(401))));
        assert!(matches!(
            rpc.safe_mode().await,
            Err(MempoolError::HealthCheck(_))
        ));
    }

    #[tokio::test]
    async fn test_rpc_error_body_on_http_500() {
        let rpc = client(spawn_node().await, "pass");
        match rpc.send_raw_transaction("00").await {
            Err(RpcError::Rpc { code, message }) => {
                assert_eq!(code, -26);
                assert_eq!(message, "txn-mempool-conflict");
            }
            other => panic!("unexpected {:?}", other),
        }
        let relayed = rpc.broadcast("00").await.unwrap_err();
        assert!(matches!(relayed, RetrievalError::Relay(m) if m.contains("txn-mempool-conflict")));
    }

    #[tokio::test]
    async fn test_mempool_listing_and_fetch() {
        let rpc = client(spawn_node().await, "pass");
        assert_eq!(rpc.raw_mempool().await.unwrap(), vec!["aa", "bb"]);
        assert_eq!(rpc.raw_transaction("aa").await.unwrap(), vec![0x01, 0x00]);
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let rpc = client(url, "pass");
        assert!(matches!(rpc.safe_mode_info().await, Err(RpcError::Transport(_))));
    }
}
