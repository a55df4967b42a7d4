//! 硬件设备传输接口
//!
//! USB/HID/U2F 的具体实现不在本 crate 内，这里只约定设备应用暴露的四个调用。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfiguration {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAddress {
    pub address: String,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub chain_code: Option<String>,
}

impl DeviceAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            public_key: None,
            chain_code: None,
        }
    }
}

/// 设备返回的签名分量
///
/// `v` 的格式随调用而不同：个人消息签名返回十进制数字，交易签名返回十六进制字节。
/// `r`/`s` 为十六进制。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSignature {
    pub v: String,
    pub r: String,
    pub s: String,
}

#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn get_app_configuration(&self) -> Result<AppConfiguration, TransportError>;

    async fn get_address(
        &self,
        path: &str,
        display_on_device: bool,
        chain_code: bool,
    ) -> Result<DeviceAddress, TransportError>;

    /// `hex_message` 不带 0x 前缀
    async fn sign_personal_message(
        &self,
        path: &str,
        hex_message: &str,
    ) -> Result<DeviceSignature, TransportError>;

    /// `hex_tx` 为未签名交易的 RLP 编码，不带 0x 前缀
    async fn sign_transaction(
        &self,
        path: &str,
        hex_tx: &str,
    ) -> Result<DeviceSignature, TransportError>;
}
