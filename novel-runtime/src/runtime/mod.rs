//! # Runtime 模块
//!
//! 播放状态机核心，负责推进位置、驱动打字机与场景过渡、
//! 联动音频协调器。
//!
//! ## 模块结构
//!
//! - [`engine`]：播放引擎 [`NovelPlayer`] 与帧视图 [`PlayerFrame`]

pub mod engine;

pub use engine::{NovelPlayer, PlayerFrame, TYPE_INTERVAL};
