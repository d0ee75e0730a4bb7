//! 进程级生命周期插槽。
//!
//! # 教案式说明
//! - **意图 (Why)**：大多数宿主只需要一个全局的线程计数器；与其依赖隐式全局变量，
//!   不如提供显式的“安装 → 使用 → 拆除”三段式生命周期；
//! - **契约 (What)**：
//!   - [`install`] 在插槽为空时发布实例，否则返回 [`ThreadError::AlreadyInstalled`]；
//!   - [`installed`] 返回实例的克隆，未安装时为 `None`；
//!   - [`teardown`] 清空插槽并返回原实例；若仍有存活线程则记录告警，但不阻止拆除；
//! - **风险 (Trade-offs)**：拆除后已持有克隆的线程仍可正常退出，计数写回到被移除的实例上。

use parking_lot::{RwLock, const_rwlock};

use crate::{error::ThreadError, lifecycle::ThreadLifecycle};

static INSTALLED: RwLock<Option<ThreadLifecycle>> = const_rwlock(None);

/// 发布进程级生命周期实例。
pub fn install(lifecycle: ThreadLifecycle) -> Result<(), ThreadError> {
    let mut slot = INSTALLED.write();
    if slot.is_some() {
        return Err(ThreadError::AlreadyInstalled);
    }
    tracing::debug!(config = ?lifecycle.config(), "thread lifecycle installed");
    *slot = Some(lifecycle);
    Ok(())
}

/// 已安装的实例。
pub fn installed() -> Option<ThreadLifecycle> {
    INSTALLED.read().clone()
}

/// 移除已安装的实例。
pub fn teardown() -> Option<ThreadLifecycle> {
    let lifecycle = INSTALLED.write().take()?;
    let live = lifecycle.live_threads();
    if live > 0 {
        tracing::warn!(live, "thread lifecycle torn down with live threads");
    }
    Some(lifecycle)
}
