//! # 派发守卫模块
//!
//! ## 设计思路
//!
//! 同一张图片可能被文件系统监听、剪贴板轮询与手动入口中的多条路径
//! 同时观察到。守卫以源路径（剪贴板来源为暂存路径）作为身份，
//! 保证同一身份至多一个在途处理请求：第二次请求直接被拒绝跳过，
//! 不排队不重试。不同身份之间互不影响，可以并发处理。
//!
//! ## 实现思路
//!
//! - 在途集合为 `Mutex<HashSet<PathBuf>>`。
//! - `acquire` 成功时返回 RAII 票据 `ProcessingTicket`，`Drop` 时释放身份，
//!   成功、失败乃至 panic 路径都不会泄漏在途条目。

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// 在途处理请求的互斥守卫。
#[derive(Clone, Default)]
pub struct DispatchGuard {
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

/// 一次处理请求的 RAII 票据。
///
/// 票据存续期间同一身份的再次派发会被拒绝；离开作用域自动释放。
pub struct ProcessingTicket {
    identity: PathBuf,
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

fn lock_set(set: &Mutex<HashSet<PathBuf>>) -> MutexGuard<'_, HashSet<PathBuf>> {
    match set.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("派发守卫锁中毒，继续使用恢复数据");
            poisoned.into_inner()
        }
    }
}

impl DispatchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试为给定身份取得处理票据。
    ///
    /// 同一身份已有在途票据时返回 `None`，调用方应当跳过本次触发。
    ///
    /// # 示例
    /// ```rust
    /// use std::path::Path;
    /// use screenshot_rounder::dispatch::DispatchGuard;
    ///
    /// let guard = DispatchGuard::new();
    /// let ticket = guard.acquire(Path::new("/tmp/shot.png"));
    /// assert!(ticket.is_some());
    /// assert!(guard.acquire(Path::new("/tmp/shot.png")).is_none());
    /// drop(ticket);
    /// assert!(guard.acquire(Path::new("/tmp/shot.png")).is_some());
    /// ```
    pub fn acquire(&self, identity: &Path) -> Option<ProcessingTicket> {
        let mut in_flight = lock_set(&self.in_flight);
        if in_flight.insert(identity.to_path_buf()) {
            Some(ProcessingTicket {
                identity: identity.to_path_buf(),
                in_flight: Arc::clone(&self.in_flight),
            })
        } else {
            None
        }
    }

    /// 当前在途票据数量。
    pub fn in_flight_count(&self) -> usize {
        lock_set(&self.in_flight).len()
    }
}

impl ProcessingTicket {
    /// 票据对应的身份路径。
    pub fn identity(&self) -> &Path {
        &self.identity
    }
}

impl Drop for ProcessingTicket {
    fn drop(&mut self) {
        let mut in_flight = lock_set(&self.in_flight);
        in_flight.remove(&self.identity);
    }
}
