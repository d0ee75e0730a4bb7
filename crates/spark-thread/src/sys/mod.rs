//! 平台后端。
//!
//! # 教案式说明
//! - **意图 (Why)**：可移植层不应出现任何平台分支；所有与操作系统线程原语打交道的代码
//!   收敛到 [`PlatformThreads`] 的唯一实现中，由 `cfg` 在编译期选定为 [`Native`]；
//! - **契约 (What)**：线程标识与句柄在跨越该边界时统一编码为 `usize`，
//!   由后端负责与原生类型（`pthread_t`、`HANDLE`、线程 ID）互转，外部只能通过
//!   后端提供的相等比较与数值投影观察它们；
//! - **风险 (Trade-offs)**：`usize` 编码要求原生类型不宽于指针，这在受支持的平台上成立。

use std::{io, thread::JoinHandle};

use crate::{identity::HintUniqueness, priority::ThreadPriority};

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub(crate) type Native = unix::PosixThreads;
#[cfg(windows)]
pub(crate) type Native = windows::Win32Threads;

#[cfg(not(any(unix, windows)))]
compile_error!("spark-thread supports only unix and windows targets");

/// 单一平台的线程原语集合。
pub(crate) trait PlatformThreads {
    /// 后端名称，用于日志。
    const NAME: &'static str;
    /// 平台是否向本层暴露了有意义的优先级。
    const PRIORITY_SUPPORTED: bool;
    /// 数值投影的唯一性保证。
    const HINT_UNIQUENESS: HintUniqueness;

    /// 当前线程的标识。
    fn current_id() -> usize;
    /// 以操作系统提供的比较语义判断两个标识是否指向同一线程。
    fn ids_equal(a: usize, b: usize) -> bool;
    /// 标识的数值投影。
    fn id_hint(id: usize) -> u64;
    /// 当前线程的句柄。
    fn current_handle() -> usize;
    /// 接管标准库线程句柄的所有权，返回 `(句柄, 标识)`。
    ///
    /// 调用后标准库不再负责 join 或 detach，释放职责由线程自身的
    /// [`detach_current`](Self::detach_current) 承担；后端不得在返回值中保留需要关闭的内核对象。
    fn adopt<T>(thread: JoinHandle<T>) -> (usize, usize);
    /// 声明当前线程无需被等待。
    fn detach_current();
    /// 让出当前时间片。
    fn yield_now();
    fn set_priority(handle: usize, priority: ThreadPriority) -> io::Result<()>;
    fn get_priority(handle: usize) -> io::Result<ThreadPriority>;
}
