//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义线程生命周期层的错误语义，区分“致命”与“可恢复”两类路径；
//! - 致命错误不会以 `Result` 形式返回给调用方，而是经由 [`FatalReporter`](crate::FatalReporter)
//!   上报后终止当前执行流；本模块只负责承载错误码与描述。
//!
//! ## 设计要求（What）
//! - 所有错误实现 `thiserror::Error`，兼容 `std::error::Error`；
//! - 每个变体映射到 [`codes`] 中的稳定错误码，遵循 `<领域>.<语义>` 命名约定；
//! - 若错误源自操作系统，保留原始错误码，供致命上报器原样透传。

use std::io;

use thiserror::Error;

/// 线程层的稳定错误码集合。
///
/// # 契约说明（What）
/// - 错误码一经发布不得改名，日志检索与告警规则依赖其字面值；
/// - 新增码值需同步更新 [`ThreadError::code`] 的映射。
pub mod codes {
    /// 操作系统拒绝创建线程（通常意味着资源耗尽）。
    pub const SPAWN_FAILED: &str = "thread.spawn_failed";
    /// 优先级取值不在三档枚举之内。
    pub const PRIORITY_INVALID: &str = "thread.priority_invalid";
    /// 操作系统优先级调用失败。
    pub const PRIORITY_OS: &str = "thread.priority_os";
    /// 配置文本无法解析。
    pub const CONFIG_PARSE: &str = "thread.config_parse";
    /// 配置字段取值非法。
    pub const CONFIG_INVALID: &str = "thread.config_invalid";
    /// 进程级生命周期已安装。
    pub const ALREADY_INSTALLED: &str = "thread.already_installed";
    /// 非本层创建的线程（或 `panic = "abort"` 构建）调用了 `exit_current`。
    pub const EXIT_UNMANAGED: &str = "thread.exit_unmanaged";
}

/// 线程生命周期层的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：为致命上报与配置加载提供同一套结构化错误，避免在调用点拼接字符串；
/// - **契约 (What)**：
///   - `Spawn`/`PriorityOs` 携带操作系统错误，[`os_code`](Self::os_code) 可取回原始码值；
///   - `InvalidPriority`/`ExitUnmanaged` 表示调用方违反了使用契约，属于编程错误；
///   - `ConfigParse`/`ConfigInvalid`/`AlreadyInstalled` 是唯一会以 `Result` 返回给调用方的变体；
/// - **设计权衡 (Trade-offs)**：`io::Error` 不实现 `Clone`，因此本枚举也不派生 `Clone`；
///   需要复制时请使用 [`code`](Self::code) 与 `to_string()`。
#[derive(Debug, Error)]
pub enum ThreadError {
    /// 操作系统创建线程失败。
    #[error("failed to spawn OS thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },

    /// 原始优先级值不属于 `{below-normal, normal, above-normal}`。
    #[error("thread priority level {raw} is outside the supported set")]
    InvalidPriority { raw: usize },

    /// 读取或设置线程优先级时操作系统返回失败。
    #[error("OS rejected thread priority {operation}: {source}")]
    PriorityOs {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    /// TOML 配置解析失败。
    #[error("failed to parse thread configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// 配置字段语义校验失败。
    #[error("invalid thread configuration `{field}`: {detail}")]
    ConfigInvalid { field: &'static str, detail: String },

    /// 进程级插槽中已存在生命周期实例。
    #[error("a thread lifecycle is already installed for this process")]
    AlreadyInstalled,

    /// 调用线程没有可以展开回去的本层入口，无法在不跳过析构的前提下终止。
    #[error("exit_current called on thread {thread} which was not created by this lifecycle")]
    ExitUnmanaged { thread: u64 },
}

impl ThreadError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            ThreadError::Spawn { .. } => codes::SPAWN_FAILED,
            ThreadError::InvalidPriority { .. } => codes::PRIORITY_INVALID,
            ThreadError::PriorityOs { .. } => codes::PRIORITY_OS,
            ThreadError::ConfigParse(_) => codes::CONFIG_PARSE,
            ThreadError::ConfigInvalid { .. } => codes::CONFIG_INVALID,
            ThreadError::AlreadyInstalled => codes::ALREADY_INSTALLED,
            ThreadError::ExitUnmanaged { .. } => codes::EXIT_UNMANAGED,
        }
    }

    /// 返回底层操作系统错误码；非 OS 来源的错误返回 `None`。
    pub fn os_code(&self) -> Option<i32> {
        match self {
            ThreadError::Spawn { source } | ThreadError::PriorityOs { source, .. } => {
                source.raw_os_error()
            }
            _ => None,
        }
    }
}
