//! # Audio 模块
//!
//! 音频执行后端，使用 rodio 库实现。
//! 支持 MP3, WAV, FLAC, OGG 格式。
//!
//! ## 功能特性
//!
//! - 三条独立通道（音乐/语音/音效），每条一个槽位
//! - 音乐支持循环、暂停/恢复；语音/音效一次性播放
//! - 静音：三通道同时把音量压到 0，不打断播放
//!
//! 核心发来的 [`AudioCommand`] 在这里落地；任何媒体失败
//! （文件打不开、解码失败、无音频设备）只记日志，播放继续无声进行。

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use novel_runtime::AudioCommand;

/// 音乐通道音量
const MUSIC_VOLUME: f32 = 0.3;
/// 语音通道音量（前景，压过音乐）
const VOICE_VOLUME: f32 = 0.5;
/// 音效通道音量
const SFX_VOLUME: f32 = 0.4;

/// 音频通道
#[derive(Debug, Clone, Copy)]
enum Channel {
    Music,
    Voice,
    Sfx,
}

impl Channel {
    fn volume(self) -> f32 {
        match self {
            Channel::Music => MUSIC_VOLUME,
            Channel::Voice => VOICE_VOLUME,
            Channel::Sfx => SFX_VOLUME,
        }
    }
}

/// 音频执行后端
///
/// 持有输出流和三条通道的播放槽。
pub struct AudioPlayer {
    /// 音频输出流（必须保持存活）
    _stream: OutputStream,
    /// 音频输出句柄
    stream_handle: OutputStreamHandle,
    /// 音乐槽
    music_sink: Option<Sink>,
    /// 语音槽
    voice_sink: Option<Sink>,
    /// 音效槽
    sfx_sink: Option<Sink>,
    /// 是否静音
    muted: bool,
    /// 资源基础路径（相对 URI 以此为根）
    base_dir: PathBuf,
}

impl AudioPlayer {
    /// 创建音频后端
    ///
    /// 没有可用输出设备时返回 Err；调用方应当降级为无声播放，
    /// 而不是中断整个会话。
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, String> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| format!("无法初始化音频输出: {}", e))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            music_sink: None,
            voice_sink: None,
            sfx_sink: None,
            muted: false,
            base_dir: base_dir.into(),
        })
    }

    /// 执行一条音频指令
    pub fn apply(&mut self, command: &AudioCommand) {
        match command {
            AudioCommand::PlayMusic { url, looping } => self.play_music(url, *looping),
            AudioCommand::PauseMusic => {
                if let Some(sink) = &self.music_sink {
                    sink.pause();
                    debug!("音乐已暂停");
                }
            }
            AudioCommand::ResumeMusic => {
                if let Some(sink) = &self.music_sink {
                    sink.play();
                    debug!("音乐已恢复");
                }
            }
            AudioCommand::StopMusic => {
                self.stop(Channel::Music);
            }
            AudioCommand::PlayVoice { url } => self.play_one_shot(Channel::Voice, url),
            AudioCommand::StopVoice => {
                self.stop(Channel::Voice);
            }
            AudioCommand::PlaySfx { url } => self.play_one_shot(Channel::Sfx, url),
            AudioCommand::StopSfx => {
                self.stop(Channel::Sfx);
            }
            AudioCommand::SetMuted { muted } => self.set_muted(*muted),
        }
    }

    /// 停掉所有通道（会话结束的硬性清理）
    pub fn stop_all(&mut self) {
        self.stop(Channel::Music);
        self.stop(Channel::Voice);
        self.stop(Channel::Sfx);
    }

    // ── 内部实现 ────────────────────────────────────────────

    fn slot(&mut self, channel: Channel) -> &mut Option<Sink> {
        match channel {
            Channel::Music => &mut self.music_sink,
            Channel::Voice => &mut self.voice_sink,
            Channel::Sfx => &mut self.sfx_sink,
        }
    }

    /// 解析音频 URI
    ///
    /// 带 scheme 的远程 URI 本后端播不了，返回 None 并由调用方跳过。
    fn resolve(&self, uri: &str) -> Option<PathBuf> {
        if uri.contains("://") {
            warn!(uri, "远程音频 URI，跳过播放");
            return None;
        }
        let path = Path::new(uri);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(self.base_dir.join(path))
        }
    }

    /// 打开并解码音频文件
    fn open_source(&self, uri: &str) -> Option<Decoder<BufReader<File>>> {
        let path = self.resolve(uri)?;

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "无法打开音频文件");
                return None;
            }
        };

        match Decoder::new(BufReader::new(file)) {
            Ok(source) => Some(source),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "无法解码音频文件");
                None
            }
        }
    }

    fn effective_volume(&self, channel: Channel) -> f32 {
        if self.muted { 0.0 } else { channel.volume() }
    }

    /// 播放音乐（替换当前槽位）
    fn play_music(&mut self, url: &str, looping: bool) {
        self.stop(Channel::Music);

        let Some(source) = self.open_source(url) else {
            return;
        };
        let sink = match Sink::try_new(&self.stream_handle) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "无法创建音频播放器");
                return;
            }
        };

        sink.set_volume(self.effective_volume(Channel::Music));
        if looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }

        self.music_sink = Some(sink);
        debug!(url, looping, "开始播放音乐");
    }

    /// 一次性播放（语音/音效共用）
    fn play_one_shot(&mut self, channel: Channel, url: &str) {
        self.stop(channel);

        let Some(source) = self.open_source(url) else {
            return;
        };
        let sink = match Sink::try_new(&self.stream_handle) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "无法创建音频播放器");
                return;
            }
        };

        sink.set_volume(self.effective_volume(channel));
        sink.append(source);

        *self.slot(channel) = Some(sink);
        debug!(url, "开始播放音频片段");
    }

    /// 停止并释放一条通道
    fn stop(&mut self, channel: Channel) {
        if let Some(sink) = self.slot(channel).take() {
            sink.stop();
        }
    }

    /// 设置静音态：改音量，不打断播放
    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(sink) = &self.music_sink {
            sink.set_volume(self.effective_volume(Channel::Music));
        }
        if let Some(sink) = &self.voice_sink {
            sink.set_volume(self.effective_volume(Channel::Voice));
        }
        if let Some(sink) = &self.sfx_sink {
            sink.set_volume(self.effective_volume(Channel::Sfx));
        }
    }
}
