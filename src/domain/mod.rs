//! Domain 模块
//!
//! 派生路径、交易模型与连接状态

pub mod hd_path;
pub mod transaction;
pub mod wallet_state;

// 重新导出常用类型
pub use hd_path::{HdPath, PathRegistry, PathType};
pub use transaction::{SignedTransaction, TransactionDefaults, TransactionParams, WanTransaction};
pub use wallet_state::{AddressBatch, ConnectionMonitor, ConnectionState};
