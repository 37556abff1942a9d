//! # Input 模块
//!
//! 定义 Host 向播放核心传递的输入事件。
//!
//! ## 设计说明
//!
//! - `PlayerInput` 是 Host 采集用户操作/定时回调后，传递给核心的语义化输入
//! - 核心不直接处理鼠标/键盘事件，也不读时钟
//! - 非法时机的输入一律按无操作处理，不报错

use serde::{Deserialize, Serialize};

use crate::timer::TimerToken;

/// Host 向播放核心传递的输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerInput {
    /// 推进（点击对话框 / 空格 / 回车）
    Advance,

    /// 选择了某个分支选项
    Choose {
        /// 选项 ID
        choice_id: String,
    },

    /// 从结束画面重新开始
    Restart,

    /// 切换静音
    ToggleMute,

    /// 此前请求的定时器到期
    TimerElapsed {
        /// 调度时核心签发的令牌
        token: TimerToken,
    },

    /// 关闭播放器（卸载/退出）
    Exit,
}

impl PlayerInput {
    /// 创建推进输入
    pub fn advance() -> Self {
        Self::Advance
    }

    /// 创建选择输入
    pub fn choose(choice_id: impl Into<String>) -> Self {
        Self::Choose {
            choice_id: choice_id.into(),
        }
    }

    /// 创建定时器到期输入
    pub fn timer(token: TimerToken) -> Self {
        Self::TimerElapsed { token }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{TimerKind, TimerRegistry};

    #[test]
    fn test_input_creation() {
        assert_eq!(PlayerInput::advance(), PlayerInput::Advance);
        assert_eq!(
            PlayerInput::choose("ch1"),
            PlayerInput::Choose {
                choice_id: "ch1".to_string()
            }
        );
    }

    #[test]
    fn test_input_serialization() {
        let token = TimerRegistry::new().issue(TimerKind::TypeTick);
        let input = PlayerInput::timer(token);

        let json = serde_json::to_string(&input).unwrap();
        let loaded: PlayerInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input, loaded);
    }
}
