//! # Novel Runtime
//!
//! 视觉小说播放器的核心运行时库。
//!
//! ## 架构概述
//!
//! `novel-runtime` 是纯逻辑核心，不依赖任何 IO、时钟或渲染引擎。
//! 它通过**命令驱动模式**与宿主层（Host）通信：
//!
//! ```text
//! Host                                Runtime
//!   │                                    │
//!   │──── PlayerInput ──────────────────►│ handle()
//!   │◄─── Vec<Command> ──────────────────│
//!   │     (Schedule 定时器 / Audio 指令)  │
//!   │                                    │
//!   │──── TimerElapsed { token } ───────►│ （到期回调）
//!   │                                    │
//!   │          frame() ◄─────────────────│ （随时拉取渲染帧）
//! ```
//!
//! 文档（[`Novel`]）由外部编辑器产出，以不可变快照交给核心；
//! 会话状态（位置、打字机进度、过渡标志）随播放开始创建、
//! 随播放器关闭销毁。所有延时都委托给 Host，回调令牌带代数检查，
//! 过期回调不可能改写已变更的状态。
//!
//! ## 核心类型
//!
//! - [`NovelPlayer`]：播放引擎，独占会话状态
//! - [`PlayerInput`]：Host 向核心传递的输入
//! - [`Command`]：核心向 Host 发出的指令
//! - [`PlayerFrame`]：渲染层消费的帧视图
//! - [`AudioDirector`] / [`AudioCommand`]：三通道音频协调
//!
//! ## 模块结构
//!
//! - [`novel`]：文档模型（场景/对白/分支/角色/主题）
//! - [`presentation`]：呈现解析（纯函数）
//! - [`state`]：会话状态定义
//! - [`runtime`]：播放状态机
//! - [`audio`]：音频协调器
//! - [`timer`]：可取消定时器的令牌模型
//! - [`input`]：输入定义
//! - [`command`]：指令定义
//! - [`diagnostic`]：文档静态检查（编辑器侧）
//! - [`error`]：错误类型定义

pub mod audio;
pub mod command;
pub mod diagnostic;
pub mod error;
pub mod input;
pub mod novel;
pub mod presentation;
pub mod runtime;
pub mod state;
pub mod timer;

// 重导出核心类型
pub use audio::{AudioCommand, AudioDirector};
pub use command::Command;
pub use diagnostic::{
    AssetReference, AssetType, Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_novel,
    extract_asset_references,
};
pub use error::{DocumentError, DocumentResult};
pub use input::PlayerInput;
pub use novel::{
    BackgroundPosition, BackgroundSize, Character, Choice, Dialogue, FontFamily, FontSize, Novel,
    NovelTheme, Scene, SceneTransition, Sprite, TextEffect, ThemeOverride,
};
pub use presentation::{
    BackgroundStyle, EffectiveTheme, PresentationFrame, ResolveMiss, Speaker, resolve,
};
pub use runtime::{NovelPlayer, PlayerFrame, TYPE_INTERVAL};
pub use state::{PlaybackPosition, PlaybackState, TransitionPhase, TypingState};
pub use timer::{TimerKind, TimerRegistry, TimerToken};
