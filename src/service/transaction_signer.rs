//! 交易签名服务
//!
//! 流程：构建 → EIP-155 占位 → 设备签名 → 链ID校验 → 序列化。
//! 参数解析在拿锁之前完成，非法输入不会触碰设备。

use std::sync::Arc;

use crate::{
    domain::{
        hd_path::PathRegistry,
        transaction::{
            validate_chain_id, SignedTransaction, TransactionDefaults, TransactionParams,
            WanTransaction,
        },
        wallet_state::ConnectionMonitor,
    },
    error::{WalletError, WalletResult},
    infrastructure::access_lock::AccessLock,
    service::{
        device_transport::DeviceTransport,
        network_client::NetworkClient,
        notifier::{DeviceNotifier, CONFIRM_ON_DEVICE},
    },
};

pub struct TransactionSigner {
    transport: Arc<dyn DeviceTransport>,
    network: Arc<dyn NetworkClient>,
    lock: Arc<AccessLock>,
    registry: Arc<PathRegistry>,
    connection: Arc<ConnectionMonitor>,
    notifier: Arc<dyn DeviceNotifier>,
    defaults: TransactionDefaults,
}

impl TransactionSigner {
    pub fn new(
        transport: Arc<dyn DeviceTransport>,
        network: Arc<dyn NetworkClient>,
        lock: Arc<AccessLock>,
        registry: Arc<PathRegistry>,
        connection: Arc<ConnectionMonitor>,
        notifier: Arc<dyn DeviceNotifier>,
        defaults: TransactionDefaults,
    ) -> Self {
        Self {
            transport,
            network,
            lock,
            registry,
            connection,
            notifier,
            defaults,
        }
    }

    pub fn defaults(&self) -> &TransactionDefaults {
        &self.defaults
    }

    pub async fn sign_transaction(
        &self,
        params: &TransactionParams,
    ) -> WalletResult<SignedTransaction> {
        let mut tx = WanTransaction::from_params(params, &self.defaults)?;

        let _guard = self.lock.acquire("sign_transaction").await;
        self.notifier.confirm_on_device(CONFIRM_ON_DEVICE);

        let chain_id = match params.chain_id {
            Some(id) => id,
            None => self
                .network
                .get_network_id()
                .await
                .map_err(WalletError::network)?,
        };

        tx.set_replay_protection(chain_id);
        let path = self.registry.current_path();

        tracing::debug!(path = %path, chain_id = chain_id, "Requesting transaction signature");

        let signature = match self.transport.sign_transaction(&path, &tx.encode_hex()).await {
            Ok(sig) => {
                self.connection.record_success();
                sig
            }
            Err(err) => {
                self.connection.record_failure(&err);
                tracing::warn!(path = %path, error = %err, "Device failed to sign transaction");
                return Err(err.into());
            }
        };

        tx.apply_signature(&signature.v, &signature.r, &signature.s)?;
        validate_chain_id(chain_id, &tx.v)?;

        let signed = SignedTransaction::new(tx, chain_id);
        tracing::info!(
            path = %path,
            chain_id = chain_id,
            tx_hash = %signed.hash,
            "Transaction signed on device"
        );
        Ok(signed)
    }
}
