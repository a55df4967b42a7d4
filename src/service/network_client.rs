// 网络协作方 - 网络ID、pending nonce、原始交易广播
// 核心层不做重试，失败原样返回给调用方

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::{config::NetworkConfig, infrastructure::rpc_validator};

#[async_trait]
pub trait NetworkClient: Send + Sync {
    async fn get_network_id(&self) -> Result<u64>;

    /// `block_tag` 一般为 "pending"
    async fn get_transaction_count(&self, address: &str, block_tag: &str) -> Result<u64>;

    /// 返回交易哈希
    async fn send_raw_transaction(&self, raw_tx: &str) -> Result<String>;
}

/// JSON-RPC over HTTP
pub struct JsonRpcNetworkClient {
    http_client: reqwest::Client,
    rpc_url: String,
}

impl JsonRpcNetworkClient {
    pub fn new(config: &NetworkConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client: client,
            rpc_url: config.rpc_url.clone(),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let payload = build_request(method, params);

        tracing::debug!(method = %method, endpoint = %self.rpc_url, "Sending JSON-RPC request");

        let response = self
            .http_client
            .post(&self.rpc_url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .context("Failed to send RPC request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            anyhow::bail!("RPC request failed with status {}: {}", status, body);
        }

        let json: serde_json::Value =
            serde_json::from_str(&body).context("Failed to parse JSON response")?;

        rpc_validator::validate_rpc_response(&json).context("Invalid RPC response format")?;

        json.get("result")
            .cloned()
            .context("Missing result field in RPC response")
    }
}

pub(crate) fn build_request(method: &str, params: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    })
}

#[async_trait]
impl NetworkClient for JsonRpcNetworkClient {
    async fn get_network_id(&self) -> Result<u64> {
        let result = self.call("net_version", serde_json::json!([])).await?;
        rpc_validator::validate_network_id(&result).context("Invalid network id in RPC response")
    }

    async fn get_transaction_count(&self, address: &str, block_tag: &str) -> Result<u64> {
        let address = rpc_validator::validate_address(address)?;
        let result = self
            .call(
                "eth_getTransactionCount",
                serde_json::json!([address, block_tag]),
            )
            .await?;

        let nonce_hex = result
            .as_str()
            .context("Invalid RPC response: nonce is not a string")?;

        rpc_validator::validate_nonce(nonce_hex)
            .context("Failed to validate nonce from RPC response")
    }

    async fn send_raw_transaction(&self, raw_tx: &str) -> Result<String> {
        if !raw_tx.starts_with("0x") {
            anyhow::bail!("Invalid raw transaction format: must start with 0x");
        }

        let result = self
            .call("eth_sendRawTransaction", serde_json::json!([raw_tx]))
            .await?;

        let tx_hash = result
            .as_str()
            .context("Missing result field in RPC response")?;

        let tx_hash =
            rpc_validator::validate_tx_hash(tx_hash).context("Invalid transaction hash format")?;

        tracing::info!(tx_hash = %tx_hash, endpoint = %self.rpc_url, "Raw transaction broadcast");

        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        let req = build_request("eth_getTransactionCount", serde_json::json!(["0xabc", "pending"]));
        assert_eq!(req["jsonrpc"], "2.0");
        assert_eq!(req["method"], "eth_getTransactionCount");
        assert_eq!(req["params"][1], "pending");
    }

    #[tokio::test]
    async fn test_rejects_unprefixed_raw_tx() {
        let client = JsonRpcNetworkClient::new(&NetworkConfig {
            rpc_url: "http://127.0.0.1:1".into(),
            timeout_secs: 1,
        });
        let err = client.send_raw_transaction("f86b01").await.unwrap_err();
        assert!(err.to_string().contains("must start with 0x"));
    }

    #[tokio::test]
    async fn test_rejects_malformed_address_before_request() {
        let client = JsonRpcNetworkClient::new(&NetworkConfig {
            rpc_url: "http://127.0.0.1:1".into(),
            timeout_secs: 1,
        });
        let err = client
            .get_transaction_count("0x1234", "pending")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid address length"));
    }
}
