//! # State 模块
//!
//! 定义播放会话的运行时状态。
//!
//! ## 设计原则
//!
//! - 所有状态必须**显式建模**，可序列化
//! - 状态只能通过 [`crate::runtime::NovelPlayer`] 的操作变更，
//!   其他组件一律只读
//! - 会话状态随播放开始创建，随播放器关闭销毁

use serde::{Deserialize, Serialize};

/// 播放位置
///
/// 记录当前推进到哪个场景的哪句对白。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackPosition {
    /// 当前场景索引
    pub scene_index: usize,
    /// 当前对白索引（场景内）
    pub dialogue_index: usize,
}

impl PlaybackPosition {
    /// 起始位置 (0, 0)
    pub fn start() -> Self {
        Self::default()
    }

    /// 场景内前进一句
    pub fn next_dialogue(&mut self) {
        self.dialogue_index += 1;
    }

    /// 进入指定场景（对白索引归零）
    pub fn enter_scene(&mut self, scene_index: usize) {
        self.scene_index = scene_index;
        self.dialogue_index = 0;
    }
}

/// 打字机进度
///
/// `revealed` 和 `total` 都以字符（`char`）计数，不按字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypingState {
    /// 已显示的字符数
    pub revealed: usize,
    /// 文本总字符数
    pub total: usize,
}

impl TypingState {
    /// 为新文本开始显示（空文本立即完成）
    pub fn start(total: usize) -> Self {
        Self { revealed: 0, total }
    }

    /// 是否已全部显示
    pub fn is_done(&self) -> bool {
        self.revealed >= self.total
    }

    /// 显示下一个字符
    pub fn reveal_one(&mut self) {
        if self.revealed < self.total {
            self.revealed += 1;
        }
    }

    /// 跳过剩余显示过程（点击跳过打字机）
    pub fn complete(&mut self) {
        self.revealed = self.total;
    }
}

/// 场景过渡阶段
///
/// 过渡分两段提交（commit-then-clear）：
///
/// ```text
/// Idle ──开始过渡──► Covering ──提交新位置──► Revealing ──► Idle
///                   (遮罩盖上，位置未变)    (内容已换，遮罩淡出)
/// ```
///
/// 依赖"过渡标志清除前内容已经换好"的监听方因此始终成立。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionPhase {
    /// 无过渡
    #[default]
    Idle,
    /// 遮罩盖上中，位置尚未提交
    Covering,
    /// 位置已提交，遮罩淡出中
    Revealing,
}

/// 播放状态
///
/// 这是播放会话的**唯一可变状态**。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    /// 播放位置
    pub position: PlaybackPosition,
    /// 打字机进度
    pub typing: TypingState,
    /// 过渡阶段
    pub transition: TransitionPhase,
    /// 过渡中待提交的目标场景索引（仅 Covering 阶段有值）
    pub pending_scene: Option<usize>,
    /// 是否已播放完毕
    pub finished: bool,
}

impl PlaybackState {
    /// 创建初始状态
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否处于过渡中（两个阶段都算）
    pub fn is_transitioning(&self) -> bool {
        self.transition != TransitionPhase::Idle
    }
}
