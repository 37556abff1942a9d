//! # Command 模块
//!
//! 定义播放核心向 Host 发出的指令。
//! Command 是核心与 Host 之间的**唯一通信方式**。
//!
//! ## 设计原则
//!
//! - **声明式**：Command 描述"做什么"，不描述"怎么做"
//! - **无副作用**：Command 本身不执行任何操作
//! - **引擎无关**：不包含任何渲染/音频后端的类型

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::AudioCommand;
use crate::timer::TimerToken;

/// 播放核心向 Host 发出的指令
///
/// Host 按顺序执行每条指令：调度定时器、驱动音频通道。
/// 画面本身不走 Command —— Host 在每批输入处理后通过
/// [`crate::runtime::NovelPlayer::frame`] 拉取最新帧。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// 请求 Host 在 `delay` 后回调 `TimerElapsed { token }`
    ///
    /// Host 不需要支持取消：过期令牌由核心代数检查拦截。
    Schedule {
        /// 核心签发的令牌，到期时原样传回
        token: TimerToken,
        /// 延时时长
        delay: Duration,
    },

    /// 音频通道指令
    Audio(AudioCommand),
}

impl Command {
    /// 创建定时器调度指令
    pub fn schedule(token: TimerToken, delay: Duration) -> Self {
        Self::Schedule { token, delay }
    }
}
