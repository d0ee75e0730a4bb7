//! 线程层配置。
//!
//! # 教案式说明
//! - **意图 (Why)**：原先散落在全局变量里的“是否统一线程优先级”开关，
//!   与栈大小、线程命名一起收敛为一个可序列化的配置结构；
//! - **契约 (What)**：所有字段均有默认值，TOML 中未出现的键保持默认；未知键直接拒绝，
//!   防止拼写错误被静默忽略；
//! - **执行 (How)**：[`ThreadConfig::from_toml_str`] 先反序列化再调用 [`validate`](ThreadConfig::validate)。

use serde::Deserialize;

use crate::{error::ThreadError, priority::ThreadPriority};

/// 允许配置的最小线程栈（字节）。
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// 线程生命周期层的进程级配置。
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ThreadConfig {
    /// 为真时，新建线程创建后立即被设置为 `normalized_priority`，防止工作线程间因优先级不同而饿死。
    pub normalize_priorities: bool,
    /// 统一优先级的目标档位。
    pub normalized_priority: ThreadPriority,
    /// 新线程栈大小；`None` 表示沿用平台默认值。
    pub stack_size: Option<usize>,
    /// 线程名前缀，生成 `<prefix>-<seq>` 形式的名称。
    pub name_prefix: Option<String>,
}

impl ThreadConfig {
    /// 从 TOML 文本加载配置并完成校验。
    pub fn from_toml_str(source: &str) -> Result<Self, ThreadError> {
        let config: ThreadConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// 开启或关闭优先级统一。
    pub fn with_normalized_priorities(mut self, enabled: bool) -> Self {
        self.normalize_priorities = enabled;
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// 语义校验。
    ///
    /// - 栈大小不得低于 [`MIN_STACK_SIZE`]；
    /// - 名称前缀不得为空，也不得包含 NUL（操作系统线程名以 C 字符串传递）。
    pub fn validate(&self) -> Result<(), ThreadError> {
        if let Some(bytes) = self.stack_size {
            check_stack_size(bytes)?;
        }
        if let Some(prefix) = &self.name_prefix
            && (prefix.is_empty() || prefix.contains('\0'))
        {
            return Err(ThreadError::ConfigInvalid {
                field: "name_prefix",
                detail: "prefix must be non-empty and free of NUL bytes".to_owned(),
            });
        }
        Ok(())
    }
}

/// 栈大小下限检查，配置校验与单次创建参数共用。
pub(crate) fn check_stack_size(bytes: usize) -> Result<(), ThreadError> {
    if bytes < MIN_STACK_SIZE {
        return Err(ThreadError::ConfigInvalid {
            field: "stack_size",
            detail: format!("{bytes} bytes is below the {MIN_STACK_SIZE}-byte minimum"),
        });
    }
    Ok(())
}
