//! 线程生命周期管理器。
//!
//! # 教案式说明
//! - **意图 (Why)**：对上层暴露唯一一组可移植的线程操作（创建、退出、让出、休眠、优先级），
//!   调用点无需感知平台；
//! - **契约 (What)**：
//!   - [`ThreadLifecycle::create`] 在操作系统创建调用之前递增计数；创建失败是致命的，
//!     计数回滚后交给 [`FatalReporter`]，不会返回；
//!   - [`ThreadLifecycle::exit_current`] 在终止之前递减计数，并把线程标记为无需等待；
//!     只能由同一管理器创建的线程调用，其他线程调用属于契约违规，走致命路径；
//!   - 优先级越界、操作系统优先级调用失败同样走致命路径；
//! - **执行 (How)**：线程由 `std::thread::Builder` 启动，句柄所有权随后被后端接管；
//!   新线程内以 `catch_unwind` 包裹启动例程，`exit_current` 通过专用的展开载荷回到该边界，
//!   使栈上的析构函数正常执行；
//! - **风险 (Trade-offs)**：
//!   - 启动例程若自行 `catch_unwind`，可能拦截退出载荷；计数只在第一次退出时递减，
//!     例程随后返回时以第一次的退出值结束并记录 `error!`；
//!   - 退出依赖栈展开，`panic = "abort"` 构建中 `exit_current` 一律致命上报；
//!   - 析构函数在退出展开期间再次 panic 会按 Rust 规则终止进程。

use core::fmt;
use std::{
    any::Any,
    cell::Cell,
    io,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use crate::{
    config::{ThreadConfig, check_stack_size},
    counter::LiveThreadCounter,
    error::ThreadError,
    fatal::{self, AbortReporter, FatalReporter},
    identity::{ThreadHandle, ThreadIdentity},
    priority::ThreadPriority,
    sys::{Native, PlatformThreads},
};

/// 启动例程因 panic 结束时记录的退出状态。
pub const PANIC_EXIT_STATUS: usize = usize::MAX;

thread_local! {
    /// 创建当前线程的管理器地址；0 表示非本层创建。
    static OWNER: Cell<usize> = const { Cell::new(0) };
    /// 第一次 `exit_current` 的退出值。
    static EXIT_REQUESTED: Cell<Option<usize>> = const { Cell::new(None) };
}

/// `exit_current` 在受管线程中携带退出值的展开载荷。
struct ExitSignal(usize);

/// 单次创建的可选参数，未设置的字段回落到 [`ThreadConfig`]。
#[derive(Clone, Debug, Default)]
pub struct ThreadOptions {
    pub name: Option<String>,
    pub stack_size: Option<usize>,
}

impl ThreadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

/// 创建成功后返回的句柄与标识；不需要标识的调用方可直接忽略该字段。
#[derive(Clone, Copy, Debug)]
pub struct Spawned {
    pub handle: ThreadHandle,
    pub identity: ThreadIdentity,
}

struct LifecycleInner {
    config: ThreadConfig,
    counter: LiveThreadCounter,
    reporter: Arc<dyn FatalReporter>,
    sequence: AtomicU64,
}

/// 线程生命周期管理器。
///
/// 克隆开销为一次 `Arc` 引用计数；所有克隆共享同一个存活线程计数器。
/// 启动例程需要调用 [`exit_current`](Self::exit_current) 时，应把一份克隆作为参数传入新线程。
#[derive(Clone)]
pub struct ThreadLifecycle {
    inner: Arc<LifecycleInner>,
}

impl ThreadLifecycle {
    /// 以默认的 [`AbortReporter`] 构造。
    pub fn new(config: ThreadConfig) -> Self {
        Self::with_reporter(config, Arc::new(AbortReporter))
    }

    pub fn with_reporter(config: ThreadConfig, reporter: Arc<dyn FatalReporter>) -> Self {
        Self {
            inner: Arc::new(LifecycleInner {
                config,
                counter: LiveThreadCounter::new(),
                reporter,
                sequence: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ThreadConfig {
        &self.inner.config
    }

    /// 经本层创建且尚未经本层退出的线程数。
    pub fn live_threads(&self) -> usize {
        self.inner.counter.get()
    }

    /// 启动新线程执行 `start(argument)`。
    ///
    /// # 契约说明（What）
    /// - `argument` 的所有权转移到新线程，本层不做复制；
    /// - 启动例程的返回值即线程的退出状态；
    /// - 操作系统拒绝创建时以 [`codes::SPAWN_FAILED`](crate::error::codes::SPAWN_FAILED) 致命上报，不会返回。
    pub fn create<A, F>(&self, start: F, argument: A) -> Spawned
    where
        F: FnOnce(A) -> usize + Send + 'static,
        A: Send + 'static,
    {
        self.create_with(ThreadOptions::default(), start, argument)
    }

    /// 带线程名、栈大小等参数的 [`create`](Self::create)。
    pub fn create_with<A, F>(&self, options: ThreadOptions, start: F, argument: A) -> Spawned
    where
        F: FnOnce(A) -> usize + Send + 'static,
        A: Send + 'static,
    {
        let config = &self.inner.config;
        let name = options.name.or_else(|| {
            config.name_prefix.as_ref().map(|prefix| {
                let seq = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
                format!("{prefix}-{seq}")
            })
        });
        let mut builder = thread::Builder::new();
        if let Some(name) = name {
            if name.contains('\0') {
                fatal::raise(
                    self.reporter(),
                    &ThreadError::ConfigInvalid {
                        field: "name",
                        detail: "thread name contains a NUL byte".to_owned(),
                    },
                );
            }
            builder = builder.name(name);
        }
        if let Some(bytes) = options.stack_size {
            if let Err(err) = check_stack_size(bytes) {
                fatal::raise(self.reporter(), &err);
            }
        }
        if let Some(bytes) = options.stack_size.or(config.stack_size) {
            builder = builder.stack_size(bytes);
        }

        let owner = self.owner_key();
        let live = self.inner.counter.increment();
        let join = match builder.spawn(move || run_managed(owner, start, argument)) {
            Ok(join) => join,
            Err(source) => {
                self.inner.counter.decrement();
                fatal::raise(self.reporter(), &ThreadError::Spawn { source });
            }
        };
        let (handle, id) = Native::adopt(join);
        let spawned = Spawned {
            handle: ThreadHandle::from_raw(handle),
            identity: ThreadIdentity::from_raw(id),
        };

        if config.normalize_priorities {
            self.set_priority(spawned.handle, config.normalized_priority);
        }
        tracing::debug!(
            thread = spawned.identity.numeric_hint(),
            live,
            backend = Native::NAME,
            "thread created"
        );
        spawned
    }

    /// 终止调用线程，`exit_value` 作为其退出状态。本函数不会返回。
    ///
    /// # 契约说明（What）
    /// - 计数先于终止递减，同一线程只递减一次；线程随后被标记为无需等待；
    /// - 终止通过栈展开回到线程入口完成，沿途的析构函数正常执行，
    ///   析构期间 `std::thread::panicking()` 为真；
    /// - 调用线程不是由本管理器（或其克隆）创建，或构建使用 `panic = "abort"` 时，
    ///   以 [`codes::EXIT_UNMANAGED`](crate::error::codes::EXIT_UNMANAGED) 致命上报，计数不变。
    pub fn exit_current(&self, exit_value: usize) -> ! {
        let identity = ThreadIdentity::current();
        if !cfg!(panic = "unwind") || OWNER.with(Cell::get) != self.owner_key() {
            fatal::raise(
                self.reporter(),
                &ThreadError::ExitUnmanaged {
                    thread: identity.numeric_hint(),
                },
            );
        }
        let exit_value = match EXIT_REQUESTED.with(Cell::get) {
            None => {
                EXIT_REQUESTED.with(|requested| requested.set(Some(exit_value)));
                let live = self.inner.counter.decrement();
                tracing::debug!(
                    thread = identity.numeric_hint(),
                    exit_value,
                    live,
                    "thread exits"
                );
                exit_value
            }
            Some(first) => {
                tracing::warn!(
                    thread = identity.numeric_hint(),
                    first,
                    ignored = exit_value,
                    "exit_current called again after an earlier exit was intercepted"
                );
                first
            }
        };
        panic::resume_unwind(Box::new(ExitSignal(exit_value)))
    }

    /// 设置线程优先级；不支持优先级的平台上为空操作。
    pub fn set_priority(&self, handle: ThreadHandle, priority: ThreadPriority) {
        if let Err(source) = Native::set_priority(handle.raw(), priority) {
            fatal::raise(
                self.reporter(),
                &ThreadError::PriorityOs {
                    operation: "set",
                    source,
                },
            );
        }
        tracing::trace!(%priority, "thread priority set");
    }

    /// 以原始数值设置优先级；取值不在 `1..=3` 时致命上报。
    pub fn set_priority_raw(&self, handle: ThreadHandle, raw: usize) {
        match ThreadPriority::try_from(raw) {
            Ok(priority) => self.set_priority(handle, priority),
            Err(err) => fatal::raise(self.reporter(), &err),
        }
    }

    /// 读取线程优先级；不支持优先级的平台恒为 [`ThreadPriority::Normal`]。
    pub fn get_priority(&self, handle: ThreadHandle) -> ThreadPriority {
        match Native::get_priority(handle.raw()) {
            Ok(priority) => priority,
            Err(source) => fatal::raise(
                self.reporter(),
                &ThreadError::PriorityOs {
                    operation: "get",
                    source,
                },
            ),
        }
    }

    /// 结束使用该管理器，返回仍存活的线程数。
    pub fn shutdown(self) -> usize {
        let live = self.live_threads();
        if live > 0 {
            tracing::warn!(live, "thread lifecycle shut down with live threads");
        }
        live
    }

    fn reporter(&self) -> &dyn FatalReporter {
        self.inner.reporter.as_ref()
    }

    fn owner_key(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Debug for ThreadLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadLifecycle")
            .field("config", &self.inner.config)
            .field("live", &self.live_threads())
            .finish()
    }
}

fn run_managed<A, F>(owner: usize, start: F, argument: A) -> usize
where
    F: FnOnce(A) -> usize,
{
    OWNER.with(|current| current.set(owner));
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || start(argument)));
    let requested = EXIT_REQUESTED.with(Cell::take);
    let status = exit_status(outcome, requested);
    OWNER.with(|current| current.set(0));
    Native::detach_current();
    status
}

/// 由启动例程的结局与已请求的退出值确定线程退出状态。
fn exit_status(outcome: thread::Result<usize>, requested: Option<usize>) -> usize {
    match outcome {
        Ok(status) => match requested {
            None => status,
            Some(exit_value) => {
                tracing::error!(
                    thread = ThreadIdentity::current().numeric_hint(),
                    exit_value,
                    returned = status,
                    "start routine returned after exit_current"
                );
                exit_value
            }
        },
        Err(payload) => match payload.downcast::<ExitSignal>() {
            Ok(signal) => signal.0,
            Err(payload) => {
                tracing::error!(
                    thread = ThreadIdentity::current().numeric_hint(),
                    panic = panic_message(payload.as_ref()),
                    "start routine panicked"
                );
                PANIC_EXIT_STATUS
            }
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

/// 调用线程的标识。
pub fn current_identity() -> ThreadIdentity {
    ThreadIdentity::current()
}

/// 以操作系统语义比较两个标识。
pub fn identity_equal(a: &ThreadIdentity, b: &ThreadIdentity) -> bool {
    a.same_thread(b)
}

/// 调用线程的句柄。
pub fn current_handle() -> ThreadHandle {
    ThreadHandle::current()
}

/// 建议调度器把剩余时间片让给其他就绪线程。
pub fn yield_current() {
    tracing::trace!("yield");
    Native::yield_now();
}

/// 至少休眠 `duration_micros` 微秒；`0` 等价于一次让出。
pub fn sleep(duration_micros: u64) {
    sleep_for(Duration::from_micros(duration_micros));
}

/// [`sleep`] 的 `Duration` 版本。实际精度取决于操作系统，只保证下限。
pub fn sleep_for(duration: Duration) {
    if duration.is_zero() {
        yield_current();
        return;
    }
    tracing::trace!(micros = duration.as_micros() as u64, "sleep");
    thread::sleep(duration);
}

/// 当前平台是否支持线程优先级。
pub fn priority_supported() -> bool {
    Native::PRIORITY_SUPPORTED
}

/// 调用线程最近一次操作系统错误码；没有错误码时返回 0。
pub fn last_os_error() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}
