//! Ledger 钱包门面
//!
//! 组合路径注册表、设备锁、连接状态与三个设备服务。
//! 同一实例的所有设备调用共用一把锁；可通过 `Arc<LedgerWallet>` 跨任务共享。

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::{
    config::{Config, WalletConfig},
    domain::{
        hd_path::{PathRegistry, PathType},
        transaction::{SignedTransaction, TransactionParams},
        wallet_state::{AddressBatch, ConnectionMonitor, ConnectionState},
    },
    error::{WalletError, WalletResult},
    infrastructure::{
        access_lock::AccessLock,
        path_store::{FilePathStore, MemoryPathStore, PathStore},
    },
    service::{
        address_deriver::AddressDeriver,
        device_transport::{AppConfiguration, DeviceTransport},
        message_signer::MessageSigner,
        network_client::{JsonRpcNetworkClient, NetworkClient},
        notifier::{DeviceNotifier, TracingNotifier},
        signing_wallet::SigningWallet,
        transaction_signer::TransactionSigner,
    },
};

pub struct LedgerWallet {
    transport: Arc<dyn DeviceTransport>,
    network: Arc<dyn NetworkClient>,
    lock: Arc<AccessLock>,
    registry: Arc<PathRegistry>,
    connection: Arc<ConnectionMonitor>,
    deriver: AddressDeriver,
    tx_signer: TransactionSigner,
    msg_signer: MessageSigner,
    app_version: RwLock<Option<String>>,
}

pub struct LedgerWalletBuilder {
    transport: Arc<dyn DeviceTransport>,
    network: Arc<dyn NetworkClient>,
    store: Arc<dyn PathStore>,
    config: WalletConfig,
    notifier: Arc<dyn DeviceNotifier>,
}

impl LedgerWalletBuilder {
    pub fn config(mut self, config: WalletConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn DeviceNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn build(self) -> WalletResult<LedgerWallet> {
        let defaults = self.config.transaction_defaults()?;
        let registry = Arc::new(PathRegistry::load(
            self.config.wallet_type.clone(),
            self.store,
            &self.config.default_base_path,
        )?);
        let lock = Arc::new(AccessLock::new());
        let connection = Arc::new(ConnectionMonitor::new());

        let deriver = AddressDeriver::new(
            self.transport.clone(),
            lock.clone(),
            registry.clone(),
            connection.clone(),
        );
        let tx_signer = TransactionSigner::new(
            self.transport.clone(),
            self.network.clone(),
            lock.clone(),
            registry.clone(),
            connection.clone(),
            self.notifier.clone(),
            defaults,
        );
        let msg_signer = MessageSigner::new(
            self.transport.clone(),
            lock.clone(),
            registry.clone(),
            connection.clone(),
            self.notifier,
        );

        tracing::info!(
            wallet_type = %self.config.wallet_type,
            path = %registry.current_path(),
            "Hardware wallet adapter initialized"
        );

        Ok(LedgerWallet {
            transport: self.transport,
            network: self.network,
            lock,
            registry,
            connection,
            deriver,
            tx_signer,
            msg_signer,
            app_version: RwLock::new(None),
        })
    }
}

impl LedgerWallet {
    pub const TYPE: &'static str = "LEDGER";
    pub const LABEL: &'static str = "Ledger";

    pub fn builder(
        transport: Arc<dyn DeviceTransport>,
        network: Arc<dyn NetworkClient>,
        store: Arc<dyn PathStore>,
    ) -> LedgerWalletBuilder {
        LedgerWalletBuilder {
            transport,
            network,
            store,
            config: WalletConfig::default(),
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn new(
        transport: Arc<dyn DeviceTransport>,
        network: Arc<dyn NetworkClient>,
        store: Arc<dyn PathStore>,
    ) -> WalletResult<Self> {
        Self::builder(transport, network, store).build()
    }

    /// 按配置组装：JSON-RPC 网络客户端，配置了存储文件时持久化到文件
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn DeviceTransport>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let network: Arc<dyn NetworkClient> = Arc::new(JsonRpcNetworkClient::new(&config.network));
        let store: Arc<dyn PathStore> = match &config.wallet.path_store_file {
            Some(file) => Arc::new(FilePathStore::open(file)?),
            None => Arc::new(MemoryPathStore::new()),
        };

        let wallet = Self::builder(transport, network, store)
            .config(config.wallet.clone())
            .build()?;
        Ok(wallet)
    }

    /// 查询设备应用配置，确认设备可达并记录应用版本
    pub async fn connect(&self) -> WalletResult<AppConfiguration> {
        let _guard = self.lock.acquire("connect").await;

        match self.transport.get_app_configuration().await {
            Ok(app) => {
                tracing::info!(version = %app.version, "Connected to device app");
                *self.app_version.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(app.version.clone());
                Ok(app)
            }
            Err(err) => {
                self.connection.set(ConnectionState::Disconnected);
                tracing::warn!(error = %err, "Failed to reach device app");
                Err(WalletError::DeviceUnavailable(err.to_string()))
            }
        }
    }

    pub fn app_version(&self) -> Option<String> {
        self.app_version
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn get_addresses_with_path(
        &self,
        base_path: &str,
        start: u32,
        count: u32,
    ) -> WalletResult<AddressBatch> {
        self.deriver
            .get_addresses_with_path(base_path, start, count)
            .await
    }

    pub async fn get_addresses(&self) -> WalletResult<Vec<String>> {
        self.deriver.get_addresses().await
    }

    pub fn last_batch(&self) -> Option<AddressBatch> {
        self.deriver.last_batch()
    }

    pub async fn sign_message(&self, message: &str) -> WalletResult<String> {
        self.msg_signer.sign_personal_message(message).await
    }

    pub async fn sign_personal_message(&self, message: &str) -> WalletResult<String> {
        self.msg_signer.sign_personal_message(message).await
    }

    pub async fn sign_transaction_full(
        &self,
        params: &TransactionParams,
    ) -> WalletResult<SignedTransaction> {
        self.tx_signer.sign_transaction(params).await
    }

    pub async fn sign_transaction(&self, params: &TransactionParams) -> WalletResult<String> {
        Ok(self.sign_transaction_full(params).await?.raw)
    }

    /// 签名并广播；未指定 nonce 时先派生当前地址查询 pending nonce
    pub async fn send_transaction(&self, params: &TransactionParams) -> WalletResult<String> {
        let params = match params.nonce {
            Some(_) => params.clone(),
            None => {
                let address = self
                    .get_addresses()
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| WalletError::invalid_device_response("no address derived"))?;
                let nonce = self
                    .network
                    .get_transaction_count(&address, "pending")
                    .await
                    .map_err(WalletError::network)?;
                tracing::debug!(address = %address, nonce = nonce, "Fetched pending nonce");
                params.clone().with_nonce(nonce)
            }
        };

        let signed = self.sign_transaction_full(&params).await?;
        let tx_hash = self
            .network
            .send_raw_transaction(&signed.raw)
            .await
            .map_err(WalletError::network)?;

        tracing::info!(tx_hash = %tx_hash, "Signed transaction broadcast");
        Ok(tx_hash)
    }

    pub async fn load_network_id(&self) -> WalletResult<u64> {
        self.network
            .get_network_id()
            .await
            .map_err(WalletError::network)
    }

    /// 硬件钱包不代理任意 RPC
    pub async fn send_custom_request(
        &self,
        method: &str,
        _params: serde_json::Value,
    ) -> WalletResult<Option<serde_json::Value>> {
        tracing::debug!(method = %method, "Custom request ignored by hardware wallet");
        Ok(None)
    }

    pub fn current_path(&self) -> String {
        self.registry.current_path()
    }

    pub fn set_path(&self, base_path: &str, index: u32) -> WalletResult<()> {
        self.registry.set_path(base_path, index)
    }

    pub fn path_type(&self) -> PathType {
        PathRegistry::classify(&self.registry.base_path())
    }

    pub fn classify(base_path: &str) -> PathType {
        PathRegistry::classify(base_path)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_supported(&self) -> bool {
        !self.connection.is_connected()
    }

    pub fn is_locked(&self) -> bool {
        !self.connection.is_connected()
    }

    pub fn wallet_type(&self) -> &str {
        self.registry.wallet_type()
    }

    pub fn id(&self) -> &str {
        Self::TYPE
    }

    pub fn name(&self) -> &str {
        Self::LABEL
    }
}

#[async_trait]
impl SigningWallet for LedgerWallet {
    fn wallet_type(&self) -> &str {
        LedgerWallet::wallet_type(self)
    }

    fn name(&self) -> &str {
        LedgerWallet::name(self)
    }

    async fn get_addresses(&self) -> WalletResult<Vec<String>> {
        LedgerWallet::get_addresses(self).await
    }

    async fn get_addresses_with_path(
        &self,
        base_path: &str,
        start: u32,
        count: u32,
    ) -> WalletResult<AddressBatch> {
        LedgerWallet::get_addresses_with_path(self, base_path, start, count).await
    }

    async fn sign_message(&self, message: &str) -> WalletResult<String> {
        LedgerWallet::sign_message(self, message).await
    }

    async fn sign_personal_message(&self, message: &str) -> WalletResult<String> {
        LedgerWallet::sign_personal_message(self, message).await
    }

    async fn sign_transaction(&self, params: &TransactionParams) -> WalletResult<String> {
        LedgerWallet::sign_transaction(self, params).await
    }

    async fn send_transaction(&self, params: &TransactionParams) -> WalletResult<String> {
        LedgerWallet::send_transaction(self, params).await
    }

    fn current_path(&self) -> String {
        LedgerWallet::current_path(self)
    }

    fn set_path(&self, base_path: &str, index: u32) -> WalletResult<()> {
        LedgerWallet::set_path(self, base_path, index)
    }

    fn is_supported(&self) -> bool {
        LedgerWallet::is_supported(self)
    }

    fn is_locked(&self) -> bool {
        LedgerWallet::is_locked(self)
    }
}
