//! # Audio 模块
//!
//! 音频协调器（纯逻辑）。
//!
//! 三条互相独立的单槽通道，生命周期由播放位置变化驱动：
//!
//! - **音乐**：以场景的 `bgm_url` 为键。场景切换时 URL 变了才换曲；
//!   同曲且处于暂停（如结束画面后重开）则恢复播放而不重载；
//!   播放结束只暂停不清空，重开可以接着放。
//! - **语音**：以对白变化为键。每次换对白都先停掉上一条语音
//!   （即使 URL 相同 —— 语音不跨句延续），再播本句的语音（如有）。
//! - **音效**：与语音相同的一次性契约，独立槽位。
//!
//! 协调器本身不碰任何音频设备：它把位置变化翻译成 [`AudioCommand`]，
//! 由 Host 的播放后端执行。静音是三条通道共用的一个开关，
//! 切换时只改静音态、不打断播放。

use serde::{Deserialize, Serialize};

/// 音频通道指令
///
/// 各通道音量由 Host 按通道固定（音乐最低、语音最高），
/// 核心不关心具体数值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AudioCommand {
    /// 加载并播放音乐
    PlayMusic {
        /// 音乐 URI
        url: String,
        /// 是否循环
        looping: bool,
    },

    /// 暂停音乐（保留已加载曲目）
    PauseMusic,

    /// 恢复已暂停的音乐
    ResumeMusic,

    /// 停止音乐并卸载曲目
    StopMusic,

    /// 播放一条语音（单次）
    PlayVoice {
        /// 语音 URI
        url: String,
    },

    /// 停止当前语音
    StopVoice,

    /// 播放一条音效（单次）
    PlaySfx {
        /// 音效 URI
        url: String,
    },

    /// 停止当前音效
    StopSfx,

    /// 设置全通道静音态（不打断播放）
    SetMuted {
        /// 是否静音
        muted: bool,
    },
}

/// 音乐槽状态
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
struct MusicSlot {
    /// 已加载的曲目 URI
    loaded: Option<String>,
    /// 是否处于暂停（曲目仍加载着）
    paused: bool,
}

/// 音频协调器
///
/// 播放会话的音频通道状态，随会话创建/销毁。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioDirector {
    music: MusicSlot,
    /// 上一句是否启动过语音（换句时需要先停）
    voice_active: bool,
    /// 上一句是否启动过音效
    sfx_active: bool,
    muted: bool,
}

impl AudioDirector {
    /// 创建协调器
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前是否静音
    pub fn muted(&self) -> bool {
        self.muted
    }

    /// 场景位置变化：同步音乐通道
    ///
    /// `bgm_url` 是新场景的背景音乐（None 表示本场景无 BGM）。
    pub fn sync_scene(&mut self, bgm_url: Option<&str>) -> Vec<AudioCommand> {
        match bgm_url {
            Some(url) => {
                if self.music.loaded.as_deref() != Some(url) {
                    // 换曲：停旧放新
                    let mut commands = Vec::new();
                    if self.music.loaded.is_some() {
                        commands.push(AudioCommand::StopMusic);
                    }
                    self.music.loaded = Some(url.to_string());
                    self.music.paused = false;
                    commands.push(AudioCommand::PlayMusic {
                        url: url.to_string(),
                        looping: true,
                    });
                    commands
                } else if self.music.paused {
                    // 同曲但暂停中（如结束后重开）：恢复而不重载
                    self.music.paused = false;
                    vec![AudioCommand::ResumeMusic]
                } else {
                    // 同曲播放中：跨场景延续，不打断
                    Vec::new()
                }
            }
            None => {
                if self.music.loaded.take().is_some() {
                    self.music.paused = false;
                    vec![AudioCommand::StopMusic]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// 对白位置变化：同步语音/音效通道
    ///
    /// 两条通道都无条件先停再播：语音/音效永远不跨句延续，
    /// 即使前后两句引用同一个 URI。
    pub fn sync_dialogue(
        &mut self,
        voice_url: Option<&str>,
        sfx_url: Option<&str>,
    ) -> Vec<AudioCommand> {
        let mut commands = Vec::new();

        if self.voice_active {
            commands.push(AudioCommand::StopVoice);
            self.voice_active = false;
        }
        if let Some(url) = voice_url {
            commands.push(AudioCommand::PlayVoice {
                url: url.to_string(),
            });
            self.voice_active = true;
        }

        if self.sfx_active {
            commands.push(AudioCommand::StopSfx);
            self.sfx_active = false;
        }
        if let Some(url) = sfx_url {
            commands.push(AudioCommand::PlaySfx {
                url: url.to_string(),
            });
            self.sfx_active = true;
        }

        commands
    }

    /// 播放结束：音乐暂停但不卸载，语音/音效停掉
    ///
    /// 保留已加载的曲目，重开（restart）时同曲走恢复路径。
    pub fn pause_for_finish(&mut self) -> Vec<AudioCommand> {
        let mut commands = Vec::new();

        if self.music.loaded.is_some() && !self.music.paused {
            self.music.paused = true;
            commands.push(AudioCommand::PauseMusic);
        }
        if self.voice_active {
            self.voice_active = false;
            commands.push(AudioCommand::StopVoice);
        }
        if self.sfx_active {
            self.sfx_active = false;
            commands.push(AudioCommand::StopSfx);
        }

        commands
    }

    /// 设置静音态（三通道同时生效，不打断播放）
    pub fn set_muted(&mut self, muted: bool) -> Vec<AudioCommand> {
        if self.muted == muted {
            return Vec::new();
        }
        self.muted = muted;
        vec![AudioCommand::SetMuted { muted }]
    }

    /// 会话结束：停掉并释放所有通道
    ///
    /// 硬性要求 —— 播放器关闭后不允许有任何声音残留。
    pub fn teardown(&mut self) -> Vec<AudioCommand> {
        let mut commands = Vec::new();

        if self.music.loaded.take().is_some() {
            commands.push(AudioCommand::StopMusic);
        }
        self.music.paused = false;
        if self.voice_active {
            self.voice_active = false;
            commands.push(AudioCommand::StopVoice);
        }
        if self.sfx_active {
            self.sfx_active = false;
            commands.push(AudioCommand::StopSfx);
        }

        commands
    }
}
