//! ledger-signer - Ledger 硬件钱包签名适配层
//!
//! 私钥始终留在设备内：本 crate 只负责路径选择、地址派生、
//! Wanchain 交易构建与链ID校验，设备传输与网络节点通过 trait 注入。

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use error::{ErrorKind, TransportError, WalletError, WalletResult};
pub use service::{LedgerWallet, SigningWallet};

pub mod prelude {
    pub use crate::{
        config::Config,
        domain::{
            AddressBatch, ConnectionState, HdPath, PathType, SignedTransaction, TransactionParams,
        },
        error::{ErrorKind, TransportError, WalletError, WalletResult},
        service::{
            device_transport::{AppConfiguration, DeviceAddress, DeviceSignature, DeviceTransport},
            network_client::NetworkClient,
            notifier::DeviceNotifier,
            LedgerWallet, SigningWallet,
        },
    };
}
