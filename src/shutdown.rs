//! # 停止令牌模块
//!
//! ## 设计思路
//!
//! 两条触发循环都需要在收到停止信号后尽快退出，同时停止方要等到循环
//! 真正结束才能返回。共享布尔标志加固定超时 join 的方案存在超时先于
//! 循环退出的竞态，这里改为显式令牌：`Mutex<bool>` 加 `Condvar`，
//! 循环在条件变量上带超时等待，信号一到立即唤醒。
//!
//! ## 实现思路
//!
//! - `signal()` 置位并 `notify_all`，可重复调用。
//! - `wait_timeout()` 兼任循环的节拍睡眠：超时返回 false 表示继续下一拍，
//!   返回 true 表示应当退出。
//! - 锁中毒时沿用恢复数据继续，停止语义只会提前不会丢失。

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// 跨线程停止令牌。
///
/// 克隆共享同一内部状态，任一持有者 `signal()` 后所有等待者被唤醒。
///
/// # 示例
/// ```rust
/// use std::time::Duration;
/// use screenshot_rounder::shutdown::ShutdownToken;
///
/// let token = ShutdownToken::new();
/// assert!(!token.wait_timeout(Duration::from_millis(1)));
/// token.signal();
/// assert!(token.wait_timeout(Duration::from_secs(10)));
/// ```
#[derive(Clone)]
pub struct ShutdownToken {
    inner: Arc<Signal>,
}

struct Signal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Signal {
                stopped: Mutex::new(false),
                cond: Condvar::new(),
            }),
        }
    }

    fn lock_stopped(&self) -> MutexGuard<'_, bool> {
        match self.inner.stopped.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("停止令牌锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    /// 发出停止信号并唤醒所有等待中的循环。
    pub fn signal(&self) {
        let mut stopped = self.lock_stopped();
        *stopped = true;
        self.inner.cond.notify_all();
    }

    /// 是否已收到停止信号。
    pub fn is_signalled(&self) -> bool {
        *self.lock_stopped()
    }

    /// 等待至多 `timeout`；提前收到信号立即返回 true，超时返回 false。
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let stopped = self.lock_stopped();
        if *stopped {
            return true;
        }
        match self
            .inner
            .cond
            .wait_timeout_while(stopped, timeout, |stopped| !*stopped)
        {
            Ok((guard, _timeout_result)) => *guard,
            Err(poisoned) => {
                log::warn!("停止令牌锁中毒，继续使用恢复数据");
                *poisoned.into_inner().0
            }
        }
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}
