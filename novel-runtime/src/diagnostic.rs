//! # 诊断模块
//!
//! 提供文档静态检查和诊断 API，不依赖 IO 或引擎。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 面向编辑器：播放核心对这些缺陷一律退化处理，不依赖检查结果
//!
//! 悬空的分支目标在播放时静默忽略 —— 把它暴露出来是这里的职责。

use std::collections::HashSet;

use crate::novel::Novel;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 文档 ID
    pub novel_id: String,
    /// 位置（如 "scene s2 / dialogue d3"，可选）
    pub location: Option<String>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选）
    pub detail: Option<String>,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(novel_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            novel_id: novel_id.into(),
            location: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建警告诊断
    pub fn warn(novel_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warn,
            novel_id: novel_id.into(),
            location: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建信息诊断
    pub fn info(novel_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            novel_id: novel_id.into(),
            location: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 设置位置
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.novel_id)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warn)
            .count()
    }

    /// 是否存在错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// 资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    /// 封面
    Cover,
    /// 场景背景
    Background,
    /// 背景音乐
    Bgm,
    /// 角色默认立绘
    Avatar,
    /// 命名立绘
    Sprite,
    /// 语音
    Voice,
    /// 音效
    Sfx,
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cover => write!(f, "封面"),
            Self::Background => write!(f, "背景"),
            Self::Bgm => write!(f, "音乐"),
            Self::Avatar => write!(f, "立绘"),
            Self::Sprite => write!(f, "立绘"),
            Self::Voice => write!(f, "语音"),
            Self::Sfx => write!(f, "音效"),
        }
    }
}

/// 资源引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    /// 资源类型
    pub asset_type: AssetType,
    /// 资源 URI（原样，不解释 scheme）
    pub uri: String,
    /// 引用位置
    pub location: String,
}

/// 静态分析一部小说文档
///
/// # 检查内容
///
/// - Error：没有任何场景（无法开始播放）；分支目标场景不存在
/// - Warn：重复的场景/角色 ID、场景内重复的对白 ID、
///   查不到的说话人/立绘引用、零对白场景、空对白文本
pub fn analyze_novel(novel: &Novel) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let id = &novel.id;

    if novel.scenes.is_empty() {
        result.push(Diagnostic::error(id, "文档没有任何场景，无法开始播放"));
    }

    // ID 唯一性
    let mut scene_ids = HashSet::new();
    for scene in &novel.scenes {
        if !scene_ids.insert(scene.id.as_str()) {
            result.push(
                Diagnostic::warn(id, format!("场景 ID 重复: '{}'", scene.id))
                    .with_location(format!("scene {}", scene.id)),
            );
        }
    }
    let mut character_ids = HashSet::new();
    for character in &novel.characters {
        if !character_ids.insert(character.id.as_str()) {
            result.push(
                Diagnostic::warn(id, format!("角色 ID 重复: '{}'", character.id))
                    .with_location(format!("character {}", character.id)),
            );
        }
    }

    for scene in &novel.scenes {
        let scene_loc = format!("scene {}", scene.id);

        if scene.dialogues.is_empty() {
            result.push(
                Diagnostic::warn(id, "场景没有任何对白，播放时无内容可画")
                    .with_location(scene_loc.clone()),
            );
        }

        let mut dialogue_ids = HashSet::new();
        for dialogue in &scene.dialogues {
            let loc = format!("{} / dialogue {}", scene_loc, dialogue.id);

            if !dialogue_ids.insert(dialogue.id.as_str()) {
                result.push(
                    Diagnostic::warn(id, format!("对白 ID 重复: '{}'", dialogue.id))
                        .with_location(loc.clone()),
                );
            }

            if dialogue.text.is_empty() {
                result.push(Diagnostic::warn(id, "对白文本为空").with_location(loc.clone()));
            }

            // 说话人/立绘引用（播放时退化为旁白/默认立绘）
            if let Some(character_id) = &dialogue.character_id {
                match novel.character(character_id) {
                    None => {
                        result.push(
                            Diagnostic::warn(
                                id,
                                format!("说话角色 '{}' 不存在，播放时按旁白处理", character_id),
                            )
                            .with_location(loc.clone()),
                        );
                    }
                    Some(character) => {
                        if let Some(sprite_id) = &dialogue.sprite_id
                            && character.sprite(sprite_id).is_none()
                        {
                            result.push(
                                Diagnostic::warn(
                                    id,
                                    format!(
                                        "立绘 '{}' 在角色 '{}' 上不存在，回退默认立绘",
                                        sprite_id, character.name
                                    ),
                                )
                                .with_location(loc.clone()),
                            );
                        }
                    }
                }
            }

            // 分支目标（播放时静默忽略，这里必须报出来）
            for choice in &dialogue.choices {
                if novel.scene_index_by_id(&choice.target_scene_id).is_none() {
                    result.push(
                        Diagnostic::error(
                            id,
                            format!(
                                "选项 '{}' 的目标场景 '{}' 不存在",
                                choice.id, choice.target_scene_id
                            ),
                        )
                        .with_location(loc.clone())
                        .with_detail(format!("选项文本: {}", choice.text)),
                    );
                }
            }
        }
    }

    result
}

/// 提取文档中的所有资源引用
///
/// 核心从不解释 URI 的 scheme；调用方（如 novel-check 工具）
/// 可以自行决定哪些引用需要做存在性检查。
pub fn extract_asset_references(novel: &Novel) -> Vec<AssetReference> {
    let mut refs = Vec::new();

    if !novel.cover_url.is_empty() {
        refs.push(AssetReference {
            asset_type: AssetType::Cover,
            uri: novel.cover_url.clone(),
            location: "novel".to_string(),
        });
    }

    for character in &novel.characters {
        let loc = format!("character {}", character.id);
        refs.push(AssetReference {
            asset_type: AssetType::Avatar,
            uri: character.avatar_url.clone(),
            location: loc.clone(),
        });
        for sprite in &character.sprites {
            refs.push(AssetReference {
                asset_type: AssetType::Sprite,
                uri: sprite.image_url.clone(),
                location: format!("{} / sprite {}", loc, sprite.id),
            });
        }
    }

    for scene in &novel.scenes {
        let loc = format!("scene {}", scene.id);
        refs.push(AssetReference {
            asset_type: AssetType::Background,
            uri: scene.background_url.clone(),
            location: loc.clone(),
        });
        if let Some(bgm) = &scene.bgm_url {
            refs.push(AssetReference {
                asset_type: AssetType::Bgm,
                uri: bgm.clone(),
                location: loc.clone(),
            });
        }
        for dialogue in &scene.dialogues {
            let dialogue_loc = format!("{} / dialogue {}", loc, dialogue.id);
            if let Some(voice) = &dialogue.voice_url {
                refs.push(AssetReference {
                    asset_type: AssetType::Voice,
                    uri: voice.clone(),
                    location: dialogue_loc.clone(),
                });
            }
            if let Some(sfx) = &dialogue.sfx_url {
                refs.push(AssetReference {
                    asset_type: AssetType::Sfx,
                    uri: sfx.clone(),
                    location: dialogue_loc.clone(),
                });
            }
        }
    }

    refs
}
