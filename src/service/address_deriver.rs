//! 地址派生服务
//!
//! 在设备锁内按 index 顺序逐个派生地址。整批成功才更新最近批次并标记已连接；
//! 任一失败即丢弃部分结果并标记断开。

use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    domain::{
        hd_path::{join_path, PathRegistry},
        wallet_state::{AddressBatch, ConnectionMonitor, ConnectionState},
    },
    error::{TransportError, WalletError, WalletResult},
    infrastructure::access_lock::AccessLock,
    service::device_transport::DeviceTransport,
};

pub struct AddressDeriver {
    transport: Arc<dyn DeviceTransport>,
    lock: Arc<AccessLock>,
    registry: Arc<PathRegistry>,
    connection: Arc<ConnectionMonitor>,
    last_batch: RwLock<Option<AddressBatch>>,
}

impl AddressDeriver {
    pub fn new(
        transport: Arc<dyn DeviceTransport>,
        lock: Arc<AccessLock>,
        registry: Arc<PathRegistry>,
        connection: Arc<ConnectionMonitor>,
    ) -> Self {
        Self {
            transport,
            lock,
            registry,
            connection,
            last_batch: RwLock::new(None),
        }
    }

    /// 派生 `base_path/start` 到 `base_path/(start + count - 1)`
    pub async fn get_addresses_with_path(
        &self,
        base_path: &str,
        start: u32,
        count: u32,
    ) -> WalletResult<AddressBatch> {
        if base_path.is_empty() {
            return Err(WalletError::invalid_params("base path must not be empty"));
        }
        if count == 0 {
            return Err(WalletError::invalid_params("count must be at least 1"));
        }
        let end = start
            .checked_add(count)
            .ok_or_else(|| WalletError::invalid_params("index range overflows u32"))?;

        let _guard = self.lock.acquire("get_addresses").await;

        match self.derive_range(base_path, start, end).await {
            Ok(batch) => {
                self.connection.set(ConnectionState::Connected);
                *self.last_batch.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(batch.clone());

                tracing::debug!(
                    base_path = %base_path,
                    start = start,
                    count = count,
                    "Derived address batch"
                );
                Ok(batch)
            }
            Err(err) => {
                self.connection.set(ConnectionState::Disconnected);
                *self.last_batch.write().unwrap_or_else(PoisonError::into_inner) = None;

                tracing::warn!(
                    base_path = %base_path,
                    start = start,
                    count = count,
                    error = %err,
                    "Address derivation failed"
                );
                Err(err.into())
            }
        }
    }

    async fn derive_range(
        &self,
        base_path: &str,
        start: u32,
        end: u32,
    ) -> Result<AddressBatch, TransportError> {
        let mut batch = AddressBatch::new();
        for index in start..end {
            let path = join_path(base_path, index);
            let derived = self.transport.get_address(&path, false, false).await?;
            batch.insert(index, path, derived.address.to_lowercase());
        }
        Ok(batch)
    }

    /// 当前路径对应的单个地址
    pub async fn get_addresses(&self) -> WalletResult<Vec<String>> {
        let current = self.registry.current();
        let batch = self
            .get_addresses_with_path(&current.base_path, current.index, 1)
            .await?;
        Ok(batch.addresses())
    }

    pub fn last_batch(&self) -> Option<AddressBatch> {
        self.last_batch
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }
}
