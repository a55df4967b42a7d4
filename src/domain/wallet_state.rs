//! 连接状态与地址批次

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// 由最近一次设备调用的结果推导出的连接状态，初始为 Disconnected
#[derive(Debug, Default)]
pub struct ConnectionMonitor {
    connected: AtomicBool,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        if self.connected.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn set(&self, state: ConnectionState) {
        let connected = state == ConnectionState::Connected;
        let previous = self.connected.swap(connected, Ordering::SeqCst);
        if previous != connected {
            tracing::info!(state = ?state, "Hardware wallet connection state changed");
        }
    }

    pub fn record_success(&self) {
        self.set(ConnectionState::Connected);
    }

    /// 签名类调用失败：用户拒绝说明设备仍在线，状态不变；其他传输错误视为断开
    pub fn record_failure(&self, err: &TransportError) {
        if !matches!(err, TransportError::UserRejected(_)) {
            self.set(ConnectionState::Disconnected);
        }
    }
}

/// 一次派生得到的地址集合，按 index 升序
///
/// key 为完整路径，value 为小写地址。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBatch {
    entries: BTreeMap<u32, (String, String)>,
}

impl AddressBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: u32, path: String, address: String) {
        self.entries.insert(index, (path, address));
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .values()
            .find(|(p, _)| p == path)
            .map(|(_, a)| a.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(完整路径, 地址)`，按 index 顺序
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(p, a)| (p.as_str(), a.as_str()))
    }

    pub fn paths(&self) -> Vec<String> {
        self.entries.values().map(|(p, _)| p.clone()).collect()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.entries.values().map(|(_, a)| a.clone()).collect()
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries.values().cloned().collect()
    }
}
