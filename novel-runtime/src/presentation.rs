//! # Presentation 模块
//!
//! 呈现解析：给定文档和播放位置，算出这一句该怎么画。
//!
//! ## 设计原则
//!
//! - 纯函数：无 IO、无状态、输入相同输出必相同
//! - 越界/缺失不抛错：返回显式的 [`ResolveMiss`]，调用方按
//!   "无内容可画 / 故事已结束" 处理
//! - 文档缺陷退化为安全默认值：说话人查不到按旁白画，
//!   立绘查不到回退到默认立绘

use serde::{Deserialize, Serialize};

use crate::novel::{
    BackgroundPosition, BackgroundSize, Choice, FontFamily, FontSize, Novel, NovelTheme, Scene,
    TextEffect, ThemeOverride,
};

/// 旁白名牌显示名
pub const NARRATOR_NAME: &str = "Narrator";

/// 旁白名牌颜色
pub const NARRATOR_COLOR: &str = "#64748b";

/// 说话人视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    /// 名牌显示名
    pub name: String,
    /// 名牌颜色
    pub color: String,
    /// 是否为旁白（含说话人查不到的退化情况）
    pub narrator: bool,
}

impl Speaker {
    /// 旁白说话人
    pub fn narrator() -> Self {
        Self {
            name: NARRATOR_NAME.to_string(),
            color: NARRATOR_COLOR.to_string(),
            narrator: true,
        }
    }
}

/// 背景样式
///
/// `size` / `position` 是渲染层可直接使用的值：
/// 文档里的 `stretch` 没有原生关键字，这里映射为 `100% 100%`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundStyle {
    /// 背景图片 URI
    pub image_url: String,
    /// 缩放值（cover / contain / 100% 100%）
    pub size: String,
    /// 对齐值（center / top / bottom / left / right）
    pub position: String,
}

/// 生效主题（全局主题与场景覆盖合并后的结果）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveTheme {
    /// 字体族
    pub font_family: FontFamily,
    /// 字号
    pub font_size: FontSize,
}

/// 呈现帧
///
/// 渲染当前这一句所需的全部静态信息。打字机进度、过渡标志等
/// 会话态不在这里 —— 见 [`crate::runtime::PlayerFrame`]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationFrame {
    /// 场景名称
    pub scene_name: String,
    /// 背景样式
    pub background: BackgroundStyle,
    /// 说话人
    pub speaker: Speaker,
    /// 立绘 URI（旁白行无立绘）
    pub sprite_url: Option<String>,
    /// 完整对白文本
    pub text: String,
    /// 文本效果
    pub text_effect: Option<TextEffect>,
    /// 生效主题
    pub theme: EffectiveTheme,
    /// 分支选项（空 = 非分支点）
    pub choices: Vec<Choice>,
}

/// 解析落空
///
/// 不是错误：表示当前位置没有内容可画。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMiss {
    /// 场景索引越界（或文档没有场景）
    NoScene,
    /// 场景内没有这一句对白（或场景没有对白）
    NoDialogue,
}

/// 合并主题：场景覆盖逐字段压过全局主题，缺省回落默认值
///
/// 覆盖是按字段的，不是整体替换：只写了字号的场景
/// 仍然沿用全局字体族。
pub fn effective_theme(
    novel_theme: Option<&NovelTheme>,
    scene_override: Option<&ThemeOverride>,
) -> EffectiveTheme {
    let font_family = scene_override
        .and_then(|t| t.font_family)
        .or(novel_theme.map(|t| t.font_family))
        .unwrap_or_default();
    let font_size = scene_override
        .and_then(|t| t.font_size)
        .or(novel_theme.map(|t| t.font_size))
        .unwrap_or_default();

    EffectiveTheme {
        font_family,
        font_size,
    }
}

/// 计算场景的背景样式
pub fn background_style(scene: &Scene) -> BackgroundStyle {
    let size = match scene.background_size {
        BackgroundSize::Cover => "cover",
        BackgroundSize::Contain => "contain",
        // 渲染层没有 stretch 关键字，展开为两轴 100%
        BackgroundSize::Stretch => "100% 100%",
    };
    let position = match scene.background_position {
        BackgroundPosition::Center => "center",
        BackgroundPosition::Top => "top",
        BackgroundPosition::Bottom => "bottom",
        BackgroundPosition::Left => "left",
        BackgroundPosition::Right => "right",
    };

    BackgroundStyle {
        image_url: scene.background_url.clone(),
        size: size.to_string(),
        position: position.to_string(),
    }
}

/// 解析当前位置的呈现帧
///
/// # 解析规则
///
/// - 说话人：`character_id` 为 None → 旁白；查不到 → 旁白（防御默认）
/// - 立绘：指定了 `sprite_id` 且说话人有该命名立绘 → 用它；
///   否则回退说话人默认立绘；旁白 → 无立绘
/// - 主题：场景覆盖 ?? 全局主题 ?? 默认值，逐字段
pub fn resolve(
    novel: &Novel,
    scene_index: usize,
    dialogue_index: usize,
) -> Result<PresentationFrame, ResolveMiss> {
    let scene = novel.scene(scene_index).ok_or(ResolveMiss::NoScene)?;
    let dialogue = scene
        .dialogue(dialogue_index)
        .ok_or(ResolveMiss::NoDialogue)?;

    let character = dialogue
        .character_id
        .as_deref()
        .and_then(|id| novel.character(id));

    let (speaker, sprite_url) = match character {
        Some(character) => {
            let sprite_url = dialogue
                .sprite_id
                .as_deref()
                .and_then(|id| character.sprite(id))
                .map(|sprite| sprite.image_url.clone())
                .unwrap_or_else(|| character.avatar_url.clone());

            (
                Speaker {
                    name: character.name.clone(),
                    color: character.color.clone(),
                    narrator: false,
                },
                Some(sprite_url),
            )
        }
        // 旁白行（或说话人查不到）：无立绘，expression/sprite_id 一并忽略
        None => (Speaker::narrator(), None),
    };

    Ok(PresentationFrame {
        scene_name: scene.name.clone(),
        background: background_style(scene),
        speaker,
        sprite_url,
        text: dialogue.text.clone(),
        text_effect: dialogue.text_effect,
        theme: effective_theme(novel.theme.as_ref(), scene.theme_override.as_ref()),
        choices: dialogue.choices.clone(),
    })
}
