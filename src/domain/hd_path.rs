//! HD 派生路径与路径注册表
//!
//! 记录当前激活的 base path + index，并在每次变更时持久化，
//! 重启后恢复上次选择。

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{WalletError, WalletResult},
    infrastructure::path_store::PathStore,
};

/// Ledger Live 默认路径
pub const LEDGER_LIVE_PATH: &str = "m/44'/60'/0'/0";
/// 旧版 MEW/MyCrypto 路径
pub const LEGACY_PATH: &str = "m/44'/60'/0'";
/// Wanchain 路径（coin type 5718350）
pub const WAN_PATH: &str = "m/44'/5718350'/0'";
/// 所有以太坊系路径的公共前缀
pub const ETHEREUM_PATH_PREFIX: &str = "m/44'/60'/";

/// 已知路径类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    LedgerLive,
    Legacy,
    Wan,
    /// 用户自定义路径
    Custom,
}

impl PathType {
    pub const KNOWN: [PathType; 3] = [PathType::LedgerLive, PathType::Legacy, PathType::Wan];

    /// 已知类型对应的 base path，`Custom` 没有固定值
    pub fn base_path(&self) -> Option<&'static str> {
        match self {
            PathType::LedgerLive => Some(LEDGER_LIVE_PATH),
            PathType::Legacy => Some(LEGACY_PATH),
            PathType::Wan => Some(WAN_PATH),
            PathType::Custom => None,
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathType::LedgerLive => write!(f, "LEDGER_LIVE"),
            PathType::Legacy => write!(f, "LEGACY"),
            PathType::Wan => write!(f, "WAN"),
            PathType::Custom => write!(f, "Customization"),
        }
    }
}

/// 一条完整的派生路径：`base_path/index`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HdPath {
    pub base_path: String,
    pub index: u32,
}

impl HdPath {
    pub fn new(base_path: impl Into<String>, index: u32) -> Self {
        Self {
            base_path: base_path.into(),
            index,
        }
    }

    pub fn full_path(&self) -> String {
        join_path(&self.base_path, self.index)
    }

    pub fn path_type(&self) -> PathType {
        classify(&self.base_path)
    }
}

impl fmt::Display for HdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base_path, self.index)
    }
}

pub fn join_path(base_path: &str, index: u32) -> String {
    format!("{}/{}", base_path, index)
}

/// 精确匹配已知常量，否则为 `Custom`
pub fn classify(base_path: &str) -> PathType {
    PathType::KNOWN
        .into_iter()
        .find(|t| t.base_path() == Some(base_path))
        .unwrap_or(PathType::Custom)
}

pub fn is_ethereum_path(base_path: &str) -> bool {
    base_path.starts_with(ETHEREUM_PATH_PREFIX)
}

/// 路径注册表
///
/// 持久化键按钱包类型隔离：`{wallet_type}:selectedBasePath` / `{wallet_type}:selectedIndex`。
pub struct PathRegistry {
    wallet_type: String,
    store: Arc<dyn PathStore>,
    current: RwLock<HdPath>,
}

impl PathRegistry {
    /// 从持久化存储恢复上次选择；缺失或无法解析时回退到默认 base path 与 index 0
    pub fn load(
        wallet_type: impl Into<String>,
        store: Arc<dyn PathStore>,
        default_base_path: &str,
    ) -> WalletResult<Self> {
        let wallet_type = wallet_type.into();

        let base_path = store
            .get(&base_path_key(&wallet_type))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| default_base_path.to_string());
        let index = store
            .get(&index_key(&wallet_type))
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(0);

        let registry = Self {
            wallet_type,
            store,
            current: RwLock::new(HdPath::new(base_path.clone(), index)),
        };
        // 首次使用时创建持久化记录
        registry.set_path(&base_path, index)?;

        tracing::debug!(
            wallet_type = %registry.wallet_type,
            path = %registry.current_path(),
            "Restored HD path selection"
        );

        Ok(registry)
    }

    pub fn classify(base_path: &str) -> PathType {
        classify(base_path)
    }

    /// 更新当前路径并在一次写入中持久化两个字段
    ///
    /// 持久化失败时内存与存储都保持旧选择。
    pub fn set_path(&self, base_path: &str, index: u32) -> WalletResult<()> {
        if base_path.is_empty() {
            return Err(WalletError::invalid_params("base path must not be empty"));
        }

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);

        let base_key = base_path_key(&self.wallet_type);
        let selected_index_key = index_key(&self.wallet_type);
        let index_value = index.to_string();
        self.store
            .set_many(&[(&base_key, base_path), (&selected_index_key, &index_value)])
            .map_err(WalletError::store)?;

        *current = HdPath::new(base_path, index);

        tracing::debug!(
            wallet_type = %self.wallet_type,
            base_path = %base_path,
            index = index,
            path_type = %classify(base_path),
            "HD path updated"
        );
        Ok(())
    }

    pub fn current(&self) -> HdPath {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_path(&self) -> String {
        self.current().full_path()
    }

    pub fn base_path(&self) -> String {
        self.current().base_path
    }

    pub fn index(&self) -> u32 {
        self.current().index
    }

    pub fn wallet_type(&self) -> &str {
        &self.wallet_type
    }
}

fn base_path_key(wallet_type: &str) -> String {
    format!("{}:selectedBasePath", wallet_type)
}

fn index_key(wallet_type: &str) -> String {
    format!("{}:selectedIndex", wallet_type)
}
