//! Win32 线程后端。
//!
//! - 标识与句柄都编码为 `GetCurrentThreadId` 返回的数值 ID；
//! - 创建得到的 `HANDLE` 在取出线程 ID 后立即关闭，本层不长期持有任何内核对象；
//!   优先级操作按 ID 临时 `OpenThread`，用完即关；
//! - 三档优先级映射到 `BELOW_NORMAL / NORMAL / HIGHEST`。
//!
//! 线程退出后其 ID 可被系统复用，此后对旧句柄的优先级操作可能作用于新线程或直接失败。
#![allow(unsafe_code)]

use std::{io, os::windows::io::IntoRawHandle, thread::JoinHandle};

use windows_sys::Win32::{
    Foundation::{CloseHandle, HANDLE},
    System::Threading::{
        GetCurrentThreadId, GetThreadId, GetThreadPriority, OpenThread, SetThreadPriority, Sleep,
        THREAD_ACCESS_RIGHTS, THREAD_PRIORITY_BELOW_NORMAL, THREAD_PRIORITY_HIGHEST,
        THREAD_PRIORITY_NORMAL, THREAD_QUERY_INFORMATION, THREAD_SET_INFORMATION,
    },
};

use super::PlatformThreads;
use crate::{identity::HintUniqueness, priority::ThreadPriority};

const THREAD_PRIORITY_ERROR_RETURN: i32 = 0x7FFF_FFFF;

pub(crate) struct Win32Threads;

/// 按 ID 打开的线程内核对象，离开作用域时关闭。
struct OpenedThread(HANDLE);

impl OpenedThread {
    fn open(id: usize, access: THREAD_ACCESS_RIGHTS) -> io::Result<Self> {
        // SAFETY: 仅传入整数参数；失败时返回空句柄并设置 last error。
        let handle = unsafe { OpenThread(access, 0, id as u32) };
        if handle.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(Self(handle))
    }
}

impl Drop for OpenedThread {
    fn drop(&mut self) {
        // SAFETY: self.0 由 OpenThread 返回且只在此处关闭一次。
        unsafe {
            CloseHandle(self.0);
        }
    }
}

fn to_os_priority(priority: ThreadPriority) -> i32 {
    match priority {
        ThreadPriority::BelowNormal => THREAD_PRIORITY_BELOW_NORMAL,
        ThreadPriority::Normal => THREAD_PRIORITY_NORMAL,
        ThreadPriority::AboveNormal => THREAD_PRIORITY_HIGHEST,
    }
}

/// 把系统优先级归入最近的档位；外部可能设置过 IDLE、TIME_CRITICAL 等本层不使用的取值。
fn from_os_priority(os: i32) -> ThreadPriority {
    match os {
        p if p < THREAD_PRIORITY_NORMAL => ThreadPriority::BelowNormal,
        p if p == THREAD_PRIORITY_NORMAL => ThreadPriority::Normal,
        _ => ThreadPriority::AboveNormal,
    }
}

impl PlatformThreads for Win32Threads {
    const NAME: &'static str = "win32";
    const PRIORITY_SUPPORTED: bool = true;
    // 线程 ID 在线程存活期间唯一，退出后可被复用。
    const HINT_UNIQUENESS: HintUniqueness = HintUniqueness::LiveThreads;

    fn current_id() -> usize {
        // SAFETY: 无参数，总是成功。
        unsafe { GetCurrentThreadId() as usize }
    }

    fn ids_equal(a: usize, b: usize) -> bool {
        a == b
    }

    fn id_hint(id: usize) -> u64 {
        id as u64
    }

    fn current_handle() -> usize {
        Self::current_id()
    }

    fn adopt<T>(thread: JoinHandle<T>) -> (usize, usize) {
        let handle = thread.into_raw_handle() as HANDLE;
        // SAFETY: handle 来自刚创建成功的线程，所有权已从标准库转移出来；
        // 取出 ID 后关闭，线程本身不受影响。
        let id = unsafe {
            let id = GetThreadId(handle);
            CloseHandle(handle);
            id
        } as usize;
        (id, id)
    }

    fn detach_current() {}

    fn yield_now() {
        // SAFETY: Sleep(0) 放弃剩余时间片给同优先级的就绪线程。
        unsafe { Sleep(0) }
    }

    fn set_priority(handle: usize, priority: ThreadPriority) -> io::Result<()> {
        let thread = OpenedThread::open(handle, THREAD_SET_INFORMATION)?;
        // SAFETY: thread.0 在本作用域内有效。
        let ok = unsafe { SetThreadPriority(thread.0, to_os_priority(priority)) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn get_priority(handle: usize) -> io::Result<ThreadPriority> {
        let thread = OpenedThread::open(handle, THREAD_QUERY_INFORMATION)?;
        // SAFETY: 同 set_priority。
        let os = unsafe { GetThreadPriority(thread.0) };
        if os == THREAD_PRIORITY_ERROR_RETURN {
            return Err(io::Error::last_os_error());
        }
        Ok(from_os_priority(os))
    }
}
