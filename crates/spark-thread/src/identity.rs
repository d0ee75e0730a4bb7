//! 线程标识与线程句柄。
//!
//! # 教案式说明
//! - **意图 (Why)**：原生标识在不同平台上可能是结构体、指针或整数，直接按字节比较并不可靠；
//!   因此以不透明 newtype 封装，只暴露“相等比较”和“数值提示”两种观察方式；
//! - **契约 (What)**：
//!   - 相等比较委托给操作系统（POSIX 为 `pthread_equal`）；
//!   - [`ThreadIdentity::numeric_hint`] 仅用于日志，唯一性保证由
//!     [`ThreadIdentity::hint_uniqueness`] 查询；
//!   - 标识在线程退出后可能被系统复用，持有者需自行保证比较发生在线程存活期间；
//! - **风险 (Trade-offs)**：由于相等关系由操作系统定义，本类型刻意不实现 `Hash`，
//!   不能作为哈希表的键。

use core::fmt;

use crate::sys::{Native, PlatformThreads};

/// 数值提示的唯一性等级。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HintUniqueness {
    /// 在同时存活的线程之间唯一；线程退出后数值可被复用。
    LiveThreads,
    /// 不做任何唯一性保证，只能作为人类可读的线索。
    BestEffort,
}

/// 线程的不透明标识。
#[derive(Clone, Copy)]
pub struct ThreadIdentity {
    raw: usize,
}

impl ThreadIdentity {
    pub(crate) fn from_raw(raw: usize) -> Self {
        Self { raw }
    }

    /// 调用线程的标识。
    pub fn current() -> Self {
        Self::from_raw(Native::current_id())
    }

    /// 判断两个标识是否指向同一个操作系统线程。
    pub fn same_thread(&self, other: &ThreadIdentity) -> bool {
        Native::ids_equal(self.raw, other.raw)
    }

    /// 面向日志的数值投影，**不保证**跨线程唯一。
    pub fn numeric_hint(&self) -> u64 {
        Native::id_hint(self.raw)
    }

    /// 当前平台下 [`numeric_hint`](Self::numeric_hint) 的唯一性保证。
    pub const fn hint_uniqueness() -> HintUniqueness {
        Native::HINT_UNIQUENESS
    }
}

impl PartialEq for ThreadIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.same_thread(other)
    }
}

impl Eq for ThreadIdentity {}

impl fmt::Debug for ThreadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ThreadIdentity")
            .field(&self.numeric_hint())
            .finish()
    }
}

impl fmt::Display for ThreadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread#{}", self.numeric_hint())
    }
}

/// 作用于线程（读写优先级）的不透明句柄。
///
/// POSIX 上句柄与标识是同一个 `pthread_t`；Windows 上为线程 ID，优先级操作时按需打开内核对象。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThreadHandle {
    raw: usize,
}

impl ThreadHandle {
    pub(crate) fn from_raw(raw: usize) -> Self {
        Self { raw }
    }

    pub(crate) fn raw(self) -> usize {
        self.raw
    }

    /// 调用线程的句柄。
    pub fn current() -> Self {
        Self::from_raw(Native::current_handle())
    }
}
