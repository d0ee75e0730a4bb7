//! 存活线程计数器。
//!
//! # 教案式说明
//! - **意图 (Why)**：记录“经本层创建且尚未经本层退出”的线程数量，供关停流程判断是否仍有工作线程；
//! - **契约 (What)**：
//!   - 递增发生在操作系统创建调用之前，递减发生在退出调用之前，读者永远不会看到少计；
//!   - 所有访问遵循“加锁 → 修改 → 解锁”，不存在嵌套加锁；
//!   - 计数不会为负：多余的递减被截断为 0 并记录告警；
//! - **执行 (How)**：常规构建使用 `parking_lot::Mutex`；`--cfg loom` 下切换为
//!   `loom::sync::Mutex`，以便模型检查枚举加锁交错。

use core::fmt;

#[cfg(any(loom, spark_loom))]
use loom::sync::{Mutex, MutexGuard};
#[cfg(not(any(loom, spark_loom)))]
use parking_lot::{Mutex, MutexGuard};

/// 受互斥锁保护的存活线程计数。
pub struct LiveThreadCounter {
    live: Mutex<usize>,
}

impl LiveThreadCounter {
    pub fn new() -> Self {
        Self {
            live: Mutex::new(0),
        }
    }

    #[cfg(not(any(loom, spark_loom)))]
    fn guard(&self) -> MutexGuard<'_, usize> {
        self.live.lock()
    }

    // loom 的 Mutex 沿用 std 的中毒语义；计数器在持锁期间不会 panic，直接取回内部值即可。
    #[cfg(any(loom, spark_loom))]
    fn guard(&self) -> MutexGuard<'_, usize> {
        self.live
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// 计数加一，返回更新后的值。
    pub fn increment(&self) -> usize {
        let mut live = self.guard();
        *live += 1;
        *live
    }

    /// 计数减一，返回更新后的值。
    pub fn decrement(&self) -> usize {
        let mut live = self.guard();
        match live.checked_sub(1) {
            Some(next) => {
                *live = next;
                next
            }
            None => {
                tracing::warn!("live-thread counter decremented below zero; clamping");
                0
            }
        }
    }

    /// 当前计数快照。
    pub fn get(&self) -> usize {
        *self.guard()
    }
}

impl Default for LiveThreadCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LiveThreadCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveThreadCounter")
            .field("live", &self.get())
            .finish()
    }
}
