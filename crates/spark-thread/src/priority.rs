use core::fmt;

use serde::Deserialize;

use crate::error::ThreadError;

/// 线程调度优先级的三档抽象。
///
/// # 教案式说明
/// - **意图 (Why)**：不同平台的优先级取值范围差异巨大，上层只需要“后台/普通/高于普通”三种语义；
/// - **契约 (What)**：原始数值 `1/2/3` 分别对应三档，其余取值视为契约违规；
/// - **风险 (Trade-offs)**：不支持优先级的平台上设置操作为空操作，读取恒为 [`Normal`](Self::Normal)。
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ThreadPriority {
    /// 后台任务，低于普通优先级。
    BelowNormal,
    /// 普通查询线程的默认优先级。
    #[default]
    Normal,
    /// 高于普通优先级。
    AboveNormal,
}

impl ThreadPriority {
    /// 全部合法取值，按优先级升序排列。
    pub const ALL: [ThreadPriority; 3] = [
        ThreadPriority::BelowNormal,
        ThreadPriority::Normal,
        ThreadPriority::AboveNormal,
    ];

    /// 返回该档位的原始数值。
    pub const fn as_raw(self) -> usize {
        match self {
            ThreadPriority::BelowNormal => 1,
            ThreadPriority::Normal => 2,
            ThreadPriority::AboveNormal => 3,
        }
    }
}

impl TryFrom<usize> for ThreadPriority {
    type Error = ThreadError;

    fn try_from(raw: usize) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(ThreadPriority::BelowNormal),
            2 => Ok(ThreadPriority::Normal),
            3 => Ok(ThreadPriority::AboveNormal),
            _ => Err(ThreadError::InvalidPriority { raw }),
        }
    }
}

impl fmt::Display for ThreadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThreadPriority::BelowNormal => "below-normal",
            ThreadPriority::Normal => "normal",
            ThreadPriority::AboveNormal => "above-normal",
        })
    }
}
