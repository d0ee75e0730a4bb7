//! 致命错误上报能力。
//!
//! # 教案式说明
//! - **意图 (Why)**：线程创建失败、优先级契约被破坏等场景没有可行的恢复路径，
//!   必须由进程级上报器接管；本模块把该能力抽象为 trait，使宿主可以替换为自己的
//!   崩溃收集逻辑，测试则可以替换为可捕获的 panic。
//! - **契约 (What)**：[`FatalReporter::report`] 的返回类型为 `!`，实现者不得正常返回；
//!   可以选择 `abort`、`exit` 或 panic（仅建议在测试中使用）。
//! - **执行 (How)**：生命周期层在调用上报器之前先以 `tracing::error!` 记录结构化事件，
//!   确保即便上报器直接终止进程，日志中也留有错误码。

use core::fmt;
use std::process;

use crate::error::ThreadError;

/// 进程级致命错误上报器。
pub trait FatalReporter: Send + Sync + 'static {
    /// 上报致命错误并终止当前执行流。
    ///
    /// - `code`：操作系统错误码；契约违规等非 OS 错误传入 `0`；
    /// - `message`：已格式化的描述，首段为稳定错误码。
    fn report(&self, code: i32, message: fmt::Arguments<'_>) -> !;
}

/// 默认上报器：写入标准错误后立即 `abort`。
///
/// 不走 panic 路径，避免 `Drop` 在资源已耗尽的状态下继续执行。
#[derive(Clone, Copy, Debug, Default)]
pub struct AbortReporter;

impl FatalReporter for AbortReporter {
    fn report(&self, code: i32, message: fmt::Arguments<'_>) -> ! {
        eprintln!("spark-thread: fatal error (os code {code}): {message}");
        process::abort()
    }
}

/// 记录结构化事件后把错误交给上报器。
pub(crate) fn raise(reporter: &dyn FatalReporter, error: &ThreadError) -> ! {
    let os_code = error.os_code().unwrap_or(0);
    tracing::error!(code = error.code(), os_code, %error, "fatal thread-layer failure");
    reporter.report(os_code, format_args!("[{}] {}", error.code(), error))
}
