//! 测试桩：把致命上报转换为可观察的行为。
//!
//! # 设计背景（Why）
//! - 默认的 [`AbortReporter`](crate::AbortReporter) 会直接终止进程，测试无法断言致命路径；
//! - 统一在此维护桩对象，集成测试与单元测试复用同一实现。

use core::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::fatal::FatalReporter;

/// 以 panic 代替 abort 的上报器，payload 为 `String`，格式为 `os code <code>: <message>`。
#[derive(Clone, Copy, Debug, Default)]
pub struct PanickingReporter;

impl FatalReporter for PanickingReporter {
    fn report(&self, code: i32, message: fmt::Arguments<'_>) -> ! {
        std::panic::panic_any(format!("os code {code}: {message}"))
    }
}

/// 先记录上报内容、再 panic 的上报器，便于断言错误码与描述。
#[derive(Clone, Debug, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<(i32, String)>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回迄今为止收到的 `(code, message)` 副本。
    pub fn reports(&self) -> Vec<(i32, String)> {
        self.reports.lock().clone()
    }
}

impl FatalReporter for RecordingReporter {
    fn report(&self, code: i32, message: fmt::Arguments<'_>) -> ! {
        let rendered = message.to_string();
        self.reports.lock().push((code, rendered.clone()));
        std::panic::panic_any(format!("os code {code}: {rendered}"))
    }
}
