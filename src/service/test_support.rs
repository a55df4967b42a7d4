//! 单元测试用的模拟设备与网络

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    domain::transaction::WanTransaction,
    error::TransportError,
    service::{
        device_transport::{AppConfiguration, DeviceAddress, DeviceSignature, DeviceTransport},
        network_client::NetworkClient,
    },
};

/// 地址按 index 确定性生成，大写返回以检验小写化
pub fn mock_address(path: &str) -> String {
    let index: u64 = path
        .rsplit('/')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    format!("0xABCD{:036X}", index)
}

#[derive(Default)]
pub struct MockTransport {
    pub calls: Mutex<Vec<String>>,
    pub signed_payloads: Mutex<Vec<String>>,
    pub fail_on_path: Mutex<Option<String>>,
    pub reject: AtomicBool,
    pub forced_v: Mutex<Option<String>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, path: &str) {
        *self.fail_on_path.lock().unwrap() = Some(path.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    async fn get_app_configuration(&self) -> Result<AppConfiguration, TransportError> {
        self.record("get_app_configuration".into());
        Ok(AppConfiguration {
            version: "1.2.4".into(),
        })
    }

    async fn get_address(
        &self,
        path: &str,
        _display_on_device: bool,
        _chain_code: bool,
    ) -> Result<DeviceAddress, TransportError> {
        self.record(format!("get_address {}", path));
        if self.fail_on_path.lock().unwrap().as_deref() == Some(path) {
            return Err(TransportError::Disconnected("device unplugged".into()));
        }
        Ok(DeviceAddress::new(mock_address(path)))
    }

    async fn sign_personal_message(
        &self,
        path: &str,
        hex_message: &str,
    ) -> Result<DeviceSignature, TransportError> {
        self.record(format!("sign_personal_message {} {}", path, hex_message));
        if self.reject.load(Ordering::SeqCst) {
            return Err(TransportError::UserRejected("denied by user".into()));
        }
        Ok(DeviceSignature {
            v: "28".into(),
            r: "11".repeat(32),
            s: "22".repeat(32),
        })
    }

    async fn sign_transaction(
        &self,
        path: &str,
        hex_tx: &str,
    ) -> Result<DeviceSignature, TransportError> {
        self.record(format!("sign_transaction {}", path));
        self.signed_payloads.lock().unwrap().push(hex_tx.to_string());
        if self.reject.load(Ordering::SeqCst) {
            return Err(TransportError::UserRejected("denied by user".into()));
        }

        let v = match self.forced_v.lock().unwrap().clone() {
            Some(v) => v,
            None => {
                let bytes = hex::decode(hex_tx).map_err(|e| TransportError::Other(e.to_string()))?;
                let tx = WanTransaction::decode(&bytes)
                    .map_err(|e| TransportError::Other(e.to_string()))?;
                let chain_low = tx.v.first().copied().unwrap_or(0) as u16;
                format!("{:02x}", (chain_low * 2 + 35) as u8)
            }
        };

        Ok(DeviceSignature {
            v,
            r: "33".repeat(32),
            s: "44".repeat(32),
        })
    }
}

pub struct MockNetwork {
    pub network_id: u64,
    pub nonce: u64,
    pub fail_broadcast: bool,
    pub broadcasts: Mutex<Vec<String>>,
    pub nonce_queries: Mutex<Vec<(String, String)>>,
}

impl MockNetwork {
    pub fn new(network_id: u64) -> Arc<Self> {
        Arc::new(Self {
            network_id,
            nonce: 7,
            fail_broadcast: false,
            broadcasts: Mutex::new(Vec::new()),
            nonce_queries: Mutex::new(Vec::new()),
        })
    }

    pub fn with_failing_broadcast(network_id: u64) -> Arc<Self> {
        Arc::new(Self {
            network_id,
            nonce: 7,
            fail_broadcast: true,
            broadcasts: Mutex::new(Vec::new()),
            nonce_queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl NetworkClient for MockNetwork {
    async fn get_network_id(&self) -> Result<u64> {
        Ok(self.network_id)
    }

    async fn get_transaction_count(&self, address: &str, block_tag: &str) -> Result<u64> {
        self.nonce_queries
            .lock()
            .unwrap()
            .push((address.to_string(), block_tag.to_string()));
        Ok(self.nonce)
    }

    async fn send_raw_transaction(&self, raw_tx: &str) -> Result<String> {
        if self.fail_broadcast {
            anyhow::bail!("RPC error -32000: insufficient funds");
        }
        self.broadcasts.lock().unwrap().push(raw_tx.to_string());
        Ok(format!("0x{}", "ab".repeat(32)))
    }
}
