//! 个人消息签名（personal_sign）

use std::sync::Arc;

use crate::{
    domain::{hd_path::PathRegistry, wallet_state::ConnectionMonitor},
    error::{WalletError, WalletResult},
    infrastructure::access_lock::AccessLock,
    service::{
        device_transport::{DeviceSignature, DeviceTransport},
        notifier::{DeviceNotifier, CONFIRM_ON_DEVICE},
    },
    utils::hex_utils::strip_0x,
};

/// `0x` 开头视为已编码的十六进制，只去掉前缀；否则按 UTF-8 字节编码
pub fn normalize_message(message: &str) -> String {
    match message.strip_prefix("0x") {
        Some(hex) => hex.to_string(),
        None => hex::encode(message.as_bytes()),
    }
}

/// 拼接为 `0x{r}{s}{v}`，v 为设备返回的十进制数，输出至少两位十六进制
///
/// 带链ID的 v 可能超过一个字节，原样保留全部位数。
pub fn format_signature(signature: &DeviceSignature) -> WalletResult<String> {
    let v: u64 = signature.v.trim().parse().map_err(|_| {
        WalletError::invalid_device_response(format!("v is not a decimal: {}", signature.v))
    })?;

    let r = strip_0x(&signature.r);
    let s = strip_0x(&signature.s);
    for (name, part) in [("r", r), ("s", s)] {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WalletError::invalid_device_response(format!(
                "{} is not valid hex",
                name
            )));
        }
    }

    Ok(format!("0x{}{}{:02x}", r, s, v))
}

pub struct MessageSigner {
    transport: Arc<dyn DeviceTransport>,
    lock: Arc<AccessLock>,
    registry: Arc<PathRegistry>,
    connection: Arc<ConnectionMonitor>,
    notifier: Arc<dyn DeviceNotifier>,
}

impl MessageSigner {
    pub fn new(
        transport: Arc<dyn DeviceTransport>,
        lock: Arc<AccessLock>,
        registry: Arc<PathRegistry>,
        connection: Arc<ConnectionMonitor>,
        notifier: Arc<dyn DeviceNotifier>,
    ) -> Self {
        Self {
            transport,
            lock,
            registry,
            connection,
            notifier,
        }
    }

    pub async fn sign_personal_message(&self, message: &str) -> WalletResult<String> {
        let hex_message = normalize_message(message);

        let _guard = self.lock.acquire("sign_personal_message").await;
        self.notifier.confirm_on_device(CONFIRM_ON_DEVICE);

        let path = self.registry.current_path();
        let signature = match self
            .transport
            .sign_personal_message(&path, &hex_message)
            .await
        {
            Ok(sig) => {
                self.connection.record_success();
                sig
            }
            Err(err) => {
                self.connection.record_failure(&err);
                tracing::warn!(path = %path, error = %err, "Device failed to sign message");
                return Err(err.into());
            }
        };

        let result = format_signature(&signature)?;
        tracing::info!(path = %path, "Personal message signed on device");
        Ok(result)
    }
}
