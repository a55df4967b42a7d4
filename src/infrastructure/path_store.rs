//! 路径选择的持久化存储
//!
//! 浏览器里对应 `localStorage`，本地环境下用 JSON 文件代替。

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use anyhow::{Context, Result};

/// 简单的键值持久化接口
pub trait PathStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    /// 一次写入多个键：要么全部生效，要么都不生效
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;
}

/// 进程内存储（测试 / 无持久化需求）
#[derive(Debug, Default)]
pub struct MemoryPathStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPathStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PathStore for MemoryPathStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut map = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// JSON 文件存储，每次写入都整体落盘
///
/// 落盘成功后才更新内存中的副本。
#[derive(Debug)]
pub struct FilePathStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FilePathStore {
    /// 打开（或创建）存储文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read path store: {:?}", path))?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse path store: {:?}", path))?
            }
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PathStore for FilePathStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut current = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = current.clone();
        for (key, value) in entries {
            next.insert(key.to_string(), value.to_string());
        }

        let content = serde_json::to_string_pretty(&next)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write path store: {:?}", self.path))?;

        *current = next;
        Ok(())
    }
}
