//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{hd_path::WAN_PATH, transaction::TransactionDefaults},
    error::WalletResult,
    utils::hex_utils::parse_quantity,
};

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 硬件钱包配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// 持久化键前缀
    pub wallet_type: String,
    /// 没有持久化记录时使用的 base path
    pub default_base_path: String,
    pub default_gas_price: String,
    pub default_gas_limit: String,
    /// 路径选择存储文件；为空时只保存在内存
    #[serde(default)]
    pub path_store_file: Option<String>,
}

/// 网络RPC配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            wallet_type: std::env::var("LEDGER_WALLET_TYPE").unwrap_or_else(|_| "LEDGER".into()),
            default_base_path: std::env::var("LEDGER_DEFAULT_BASE_PATH")
                .unwrap_or_else(|_| WAN_PATH.into()),
            default_gas_price: std::env::var("LEDGER_DEFAULT_GAS_PRICE")
                .unwrap_or_else(|_| "0x29E8D60800".into()),
            default_gas_limit: std::env::var("LEDGER_DEFAULT_GAS_LIMIT")
                .unwrap_or_else(|_| "0x30D40".into()),
            path_store_file: std::env::var("LEDGER_PATH_STORE").ok(),
        }
    }
}

impl WalletConfig {
    pub fn transaction_defaults(&self) -> WalletResult<TransactionDefaults> {
        Ok(TransactionDefaults {
            gas_price: parse_quantity("default_gas_price", &self.default_gas_price)?,
            gas_limit: parse_quantity("default_gas_limit", &self.default_gas_limit)?,
        })
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: std::env::var("RPC_URL")
                .unwrap_or_else(|_| "https://gwan-ssl.wandevs.org:56891".into()),
            timeout_secs: std::env::var("RPC_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Config {
    /// 读取 .env（不存在则忽略）
    pub fn load_dotenv() {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = ?path, "Loaded .env file");
        }
    }

    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            wallet: WalletConfig::default(),
            network: NetworkConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if !self.wallet.default_base_path.starts_with("m/") {
            anyhow::bail!("LEDGER_DEFAULT_BASE_PATH must start with 'm/'");
        }

        self.wallet
            .transaction_defaults()
            .map_err(|e| anyhow::anyhow!("Invalid default gas settings: {}", e))?;

        if !self.network.rpc_url.starts_with("http://")
            && !self.network.rpc_url.starts_with("https://")
        {
            anyhow::bail!("RPC_URL must start with http:// or https://");
        }

        if self.network.timeout_secs == 0 {
            anyhow::bail!("RPC_TIMEOUT_SECS must be greater than 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}
