//! 设备访问锁
//!
//! 每个钱包实例一把锁，串行化所有设备调用。守卫离开作用域时自动释放，
//! 任何退出路径（包括 panic 展开）都会走 Drop。
//! 不可重入：同一操作内再次 acquire 会死锁，调用方不得嵌套。

use std::time::Instant;

use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct AccessLock {
    inner: Mutex<()>,
}

/// 锁守卫（自动释放）
pub struct AccessGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    operation: &'static str,
    acquired_at: Instant,
}

impl Drop for AccessGuard<'_> {
    fn drop(&mut self) {
        tracing::debug!(
            operation = self.operation,
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "Released device access lock"
        );
    }
}

impl AccessLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 等待直到没有其他操作持有锁
    ///
    /// 等待者之间的获取顺序不作保证。
    pub async fn acquire(&self, operation: &'static str) -> AccessGuard<'_> {
        let start = Instant::now();
        let guard = self.inner.lock().await;

        tracing::debug!(
            operation = operation,
            waited_ms = start.elapsed().as_millis() as u64,
            "Acquired device access lock"
        );

        AccessGuard {
            _guard: guard,
            operation,
            acquired_at: Instant::now(),
        }
    }

    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}
