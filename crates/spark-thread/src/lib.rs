#![deny(unsafe_code)]
#![doc = r#"
# spark-thread

## 设计动机（Why）
- **定位**：应用与操作系统线程原语之间的唯一边界，统一提供创建、标识、比较、退出、
  让出、休眠与优先级读写，调用方无需按平台分支；
- **架构角色**：可移植的 [`ThreadLifecycle`] 持有存活线程计数与致命上报器，
  平台相关代码全部收敛到编译期选定的单一后端（POSIX / Win32）；
- **非目标**：线程池、任务队列、取消信号、TLS 管理、跨线程数据传递与 join 均不在本层范围内。

## 核心契约（What）
- 创建失败、优先级越界、非受管线程调用 `exit_current` 属于**致命**错误，
  经 [`FatalReporter`] 上报后不会返回；
- 存活线程计数的更新总是先于对应的操作系统创建/退出调用；
- [`ThreadIdentity::numeric_hint`] 只用于日志，唯一性等级由
  [`ThreadIdentity::hint_uniqueness`] 显式查询；
- 不支持优先级的平台上，优先级设置为空操作，读取恒为 `Normal`。

## 实现策略（How）
- 线程通过 `std::thread::Builder` 启动，随后句柄所有权交给后端；
- 受管线程内的 `exit_current` 以展开方式回到线程入口，析构函数照常执行；
  创建后的 Win32 `HANDLE` 立即关闭，句柄统一以线程 ID 表示；
- 日志统一使用 `tracing`，本 crate 不安装任何 Subscriber。

## 使用示例
```rust,no_run
use spark_thread::{ThreadConfig, ThreadLifecycle};

let lifecycle = ThreadLifecycle::new(ThreadConfig::default().with_normalized_priorities(true));
let spawned = lifecycle.create(
    |lifecycle: ThreadLifecycle| {
        spark_thread::sleep(1_000);
        lifecycle.exit_current(0)
    },
    lifecycle.clone(),
);
println!("started {}", spawned.identity);
```
"#]

pub mod config;
pub mod counter;
pub mod error;
pub mod fatal;
pub mod global;
pub mod identity;
pub mod lifecycle;
pub mod priority;
mod sys;
/// 测试桩命名空间，集中暴露可替换默认致命上报器的实现，供集成测试复用。
pub mod test_stubs;

pub use config::{MIN_STACK_SIZE, ThreadConfig};
pub use counter::LiveThreadCounter;
pub use error::{ThreadError, codes};
pub use fatal::{AbortReporter, FatalReporter};
pub use identity::{HintUniqueness, ThreadHandle, ThreadIdentity};
pub use lifecycle::{
    PANIC_EXIT_STATUS, Spawned, ThreadLifecycle, ThreadOptions, current_handle, current_identity,
    identity_equal, last_os_error, priority_supported, sleep, sleep_for, yield_current,
};
pub use priority::ThreadPriority;
