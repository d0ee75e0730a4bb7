//! POSIX 线程后端。
//!
//! - 标识与句柄同为 `pthread_t`；
//! - POSIX 在 `SCHED_OTHER` 下不提供可移植的线程级优先级，优先级操作为空操作；
//! - `pthread_t` 可能是指针也可能是整数，统一经 `as usize` 往返编码。
#![allow(unsafe_code)]

use std::{io, os::unix::thread::JoinHandleExt, thread::JoinHandle};

use super::PlatformThreads;
use crate::{identity::HintUniqueness, priority::ThreadPriority};

unsafe extern "C" {
    fn pthread_equal(t1: libc::pthread_t, t2: libc::pthread_t) -> libc::c_int;
}

pub(crate) struct PosixThreads;

fn to_pthread(raw: usize) -> libc::pthread_t {
    raw as libc::pthread_t
}

impl PlatformThreads for PosixThreads {
    const NAME: &'static str = "posix";
    const PRIORITY_SUPPORTED: bool = false;
    // POSIX 未规定 pthread_t 的结构，数值投影只能作为提示。
    const HINT_UNIQUENESS: HintUniqueness = HintUniqueness::BestEffort;

    fn current_id() -> usize {
        // SAFETY: pthread_self 对任意线程调用都是安全的，且总是成功。
        unsafe { libc::pthread_self() as usize }
    }

    fn ids_equal(a: usize, b: usize) -> bool {
        // SAFETY: pthread_equal 只比较两个值，不解引用。
        unsafe { pthread_equal(to_pthread(a), to_pthread(b)) != 0 }
    }

    fn id_hint(id: usize) -> u64 {
        id as u64
    }

    fn current_handle() -> usize {
        Self::current_id()
    }

    fn adopt<T>(thread: JoinHandle<T>) -> (usize, usize) {
        let raw = thread.into_pthread_t() as usize;
        (raw, raw)
    }

    fn detach_current() {
        // SAFETY: 线程对自身执行 detach；句柄所有权已在 adopt 时从标准库转移出来。
        let ret = unsafe { libc::pthread_detach(libc::pthread_self()) };
        if ret != 0 {
            // 已被 detach 的线程（例如丢弃了 JoinHandle 的标准库线程）会返回 EINVAL。
            tracing::trace!(ret, "pthread_detach on current thread was rejected");
        }
    }

    fn yield_now() {
        // SAFETY: sched_yield 无参数，失败时仅返回 -1，不影响调用方。
        unsafe {
            libc::sched_yield();
        }
    }

    fn set_priority(_handle: usize, _priority: ThreadPriority) -> io::Result<()> {
        Ok(())
    }

    fn get_priority(_handle: usize) -> io::Result<ThreadPriority> {
        Ok(ThreadPriority::Normal)
    }
}
