//! 签名钱包能力接口
//!
//! 连接组件面向此 trait 编程，不关心背后是哪种硬件。

use async_trait::async_trait;

use crate::{
    domain::{transaction::TransactionParams, wallet_state::AddressBatch},
    error::WalletResult,
};

#[async_trait]
pub trait SigningWallet: Send + Sync {
    fn wallet_type(&self) -> &str;

    fn name(&self) -> &str;

    async fn get_addresses(&self) -> WalletResult<Vec<String>>;

    async fn get_addresses_with_path(
        &self,
        base_path: &str,
        start: u32,
        count: u32,
    ) -> WalletResult<AddressBatch>;

    async fn sign_message(&self, message: &str) -> WalletResult<String>;

    async fn sign_personal_message(&self, message: &str) -> WalletResult<String>;

    /// 返回 `0x` 前缀的已签名原始交易
    async fn sign_transaction(&self, params: &TransactionParams) -> WalletResult<String>;

    /// 签名并广播，返回交易哈希
    async fn send_transaction(&self, params: &TransactionParams) -> WalletResult<String>;

    fn current_path(&self) -> String;

    fn set_path(&self, base_path: &str, index: u32) -> WalletResult<()>;

    fn is_supported(&self) -> bool;

    fn is_locked(&self) -> bool;
}
