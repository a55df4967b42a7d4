//! 测试辅助模块
//! 带调用记录的桩设备与桩网络

#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use ledger_signer::{
    config::WalletConfig,
    domain::{hd_path::WAN_PATH, WanTransaction},
    infrastructure::path_store::{MemoryPathStore, PathStore},
    prelude::*,
};

pub const TO: &str = "0x1234567890123456789012345678901234567890";

/// index 0 → 0xAAAA…，index 1 → 0xBBBB…（大写，检验小写化）
pub fn stub_address(path: &str) -> String {
    let index: u8 = path
        .rsplit('/')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let byte = 0xAAu8.wrapping_add(index.wrapping_mul(0x11));
    format!("0x{}", hex::encode_upper([byte; 20]))
}

/// 设备调用的起止时间
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub operation: String,
    pub path: String,
    pub started: Instant,
    pub finished: Instant,
}

pub struct StubTransport {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    records: Mutex<Vec<CallRecord>>,
    payloads: Mutex<Vec<String>>,
    fail_at: Mutex<Option<String>>,
    forced_v: Mutex<Option<String>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            records: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
            fail_at: Mutex::new(None),
            forced_v: Mutex::new(None),
        })
    }

    /// 派生到该路径时返回断开错误
    pub fn fail_at(&self, path: &str) {
        *self.fail_at.lock().unwrap() = Some(path.to_string());
    }

    pub fn force_v(&self, v: &str) {
        *self.forced_v.lock().unwrap() = Some(v.to_string());
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn paths(&self, operation: &str) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.operation == operation)
            .map(|r| r.path)
            .collect()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, operation: &str, path: &str) -> Instant {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let started = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tracing::trace!(operation, path, "stub device call");
        started
    }

    fn leave(&self, operation: &str, path: &str, started: Instant) {
        self.records.lock().unwrap().push(CallRecord {
            operation: operation.to_string(),
            path: path.to_string(),
            started,
            finished: Instant::now(),
        });
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeviceTransport for StubTransport {
    async fn get_app_configuration(&self) -> Result<AppConfiguration, TransportError> {
        let started = self.enter("get_app_configuration", "").await;
        self.leave("get_app_configuration", "", started);
        Ok(AppConfiguration {
            version: "1.4.0".into(),
        })
    }

    async fn get_address(
        &self,
        path: &str,
        _display_on_device: bool,
        _chain_code: bool,
    ) -> Result<DeviceAddress, TransportError> {
        let started = self.enter("get_address", path).await;
        let failing = self.fail_at.lock().unwrap().as_deref() == Some(path);
        self.leave("get_address", path, started);

        if failing {
            return Err(TransportError::Disconnected("device locked".into()));
        }
        Ok(DeviceAddress::new(stub_address(path)))
    }

    async fn sign_personal_message(
        &self,
        path: &str,
        hex_message: &str,
    ) -> Result<DeviceSignature, TransportError> {
        let started = self.enter("sign_personal_message", path).await;
        self.payloads.lock().unwrap().push(hex_message.to_string());
        self.leave("sign_personal_message", path, started);

        Ok(DeviceSignature {
            v: "27".into(),
            r: "0a".repeat(32),
            s: "0b".repeat(32),
        })
    }

    async fn sign_transaction(
        &self,
        path: &str,
        hex_tx: &str,
    ) -> Result<DeviceSignature, TransportError> {
        let started = self.enter("sign_transaction", path).await;
        self.payloads.lock().unwrap().push(hex_tx.to_string());
        self.leave("sign_transaction", path, started);

        // 按占位 v 回填 EIP-155 v
        let v = match self.forced_v.lock().unwrap().clone() {
            Some(v) => v,
            None => {
                let bytes = hex::decode(hex_tx).map_err(|e| TransportError::Other(e.to_string()))?;
                let tx = WanTransaction::decode(&bytes)
                    .map_err(|e| TransportError::Other(e.to_string()))?;
                let low = u16::from(tx.v.first().copied().unwrap_or(0));
                format!("{:02x}", (low * 2 + 35) as u8)
            }
        };

        Ok(DeviceSignature {
            v,
            r: format!("00{}", "1c".repeat(31)),
            s: "2d".repeat(32),
        })
    }
}

pub struct StubNetwork {
    pub network_id: u64,
    pub nonce: u64,
    pub nonce_queries: Mutex<Vec<(String, String)>>,
    pub broadcasts: Mutex<Vec<String>>,
}

impl StubNetwork {
    pub fn new(network_id: u64) -> Arc<Self> {
        Arc::new(Self {
            network_id,
            nonce: 42,
            nonce_queries: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl NetworkClient for StubNetwork {
    async fn get_network_id(&self) -> anyhow::Result<u64> {
        Ok(self.network_id)
    }

    async fn get_transaction_count(&self, address: &str, block_tag: &str) -> anyhow::Result<u64> {
        self.nonce_queries
            .lock()
            .unwrap()
            .push((address.to_string(), block_tag.to_string()));
        Ok(self.nonce)
    }

    async fn send_raw_transaction(&self, raw_tx: &str) -> anyhow::Result<String> {
        self.broadcasts.lock().unwrap().push(raw_tx.to_string());
        Ok(format!("0x{}", "cd".repeat(32)))
    }
}

pub fn wallet_config() -> WalletConfig {
    WalletConfig {
        wallet_type: "LEDGER".into(),
        default_base_path: WAN_PATH.into(),
        default_gas_price: "0x29E8D60800".into(),
        default_gas_limit: "0x30D40".into(),
        path_store_file: None,
    }
}

pub fn build_wallet(
    transport: Arc<StubTransport>,
    network: Arc<StubNetwork>,
    store: Arc<dyn PathStore>,
) -> LedgerWallet {
    LedgerWallet::builder(transport, network, store)
        .config(wallet_config())
        .build()
        .expect("Failed to build wallet")
}

pub fn memory_wallet(transport: Arc<StubTransport>, network: Arc<StubNetwork>) -> LedgerWallet {
    build_wallet(transport, network, Arc::new(MemoryPathStore::new()))
}
