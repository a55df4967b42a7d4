// RPC响应校验模块 - 防止节点返回异常数据

use anyhow::{Context, Result};

/// 验证RPC返回的nonce值
pub fn validate_nonce(nonce_hex: &str) -> Result<u64> {
    let nonce_hex = nonce_hex.trim_start_matches("0x");

    // u64最多16个十六进制字符
    if nonce_hex.len() > 16 {
        anyhow::bail!("Nonce hex string too long: {}", nonce_hex.len());
    }

    let nonce = u64::from_str_radix(nonce_hex, 16).context("Failed to parse nonce from hex")?;

    Ok(nonce)
}

/// 验证 net_version 返回的网络ID（十进制字符串，部分节点返回十六进制）
pub fn validate_network_id(value: &serde_json::Value) -> Result<u64> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }

    let s = value
        .as_str()
        .context("Network id must be a string or number")?
        .trim();

    let id = if let Some(hex) = s.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).context("Failed to parse network id from hex")?
    } else {
        s.parse::<u64>()
            .with_context(|| format!("Failed to parse network id: {}", s))?
    };

    Ok(id)
}

/// 验证交易哈希格式
pub fn validate_tx_hash(tx_hash: &str) -> Result<String> {
    let hash = tx_hash.trim_start_matches("0x");

    // 交易哈希为32字节 = 64个十六进制字符
    if hash.len() != 64 {
        anyhow::bail!(
            "Invalid transaction hash length: expected 64, got {}",
            hash.len()
        );
    }

    if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("Invalid transaction hash format: contains non-hex characters");
    }

    Ok(format!("0x{}", hash))
}

/// 验证地址格式，返回小写
pub fn validate_address(address: &str) -> Result<String> {
    let addr = address.trim_start_matches("0x");

    if addr.len() != 40 {
        anyhow::bail!("Invalid address length: expected 40, got {}", addr.len());
    }

    if !addr.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("Invalid address format: contains non-hex characters");
    }

    Ok(format!("0x{}", addr.to_lowercase()))
}

/// 验证RPC响应格式
pub fn validate_rpc_response(json: &serde_json::Value) -> Result<()> {
    if let Some(error) = json.get("error") {
        let error_code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
        let error_msg = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        anyhow::bail!("RPC error {}: {}", error_code, error_msg);
    }

    if json.get("result").is_none() {
        anyhow::bail!("Missing result field in RPC response");
    }

    if let Some(version) = json.get("jsonrpc") {
        if version.as_str() != Some("2.0") {
            anyhow::bail!("Unsupported JSON-RPC version: {:?}", version);
        }
    }

    Ok(())
}
