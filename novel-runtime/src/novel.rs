//! # Novel 模块
//!
//! 播放核心的文档模型：一部小说（Novel）的只读快照。
//!
//! ## 设计原则
//!
//! - 文档由外部编辑器产出，以 JSON 形式交给播放核心
//! - 播放期间文档**不可变**，核心只读不写
//! - 字段名与编辑器的 camelCase 线格式一致
//! - 所有资源引用都是不透明的字符串 URI，核心不解释其 scheme
//!
//! 结构性缺陷（悬空引用、空场景列表等）不会导致加载失败，
//! 而是在播放时退化为安全默认值，并由 [`crate::diagnostic`] 报告。

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// 字体族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    /// 无衬线（默认）
    #[default]
    Sans,
    /// 衬线
    Serif,
    /// 等宽
    Mono,
    /// 手写体
    Handwritten,
    /// 复古
    Retro,
    /// 未来风
    Futuristic,
    /// 易读体
    Readable,
}

/// 字号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    /// 小
    Sm,
    /// 中（默认）
    #[default]
    Md,
    /// 大
    Lg,
}

/// 全局主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelTheme {
    /// 字体族
    pub font_family: FontFamily,
    /// 字号
    pub font_size: FontSize,
}

/// 场景级主题覆盖
///
/// 逐字段覆盖全局主题：`None` 的字段沿用全局值。
/// 合并规则见 [`crate::presentation::effective_theme`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeOverride {
    /// 字体族覆盖
    #[serde(default)]
    pub font_family: Option<FontFamily>,
    /// 字号覆盖
    #[serde(default)]
    pub font_size: Option<FontSize>,
}

/// 背景缩放方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundSize {
    /// 等比铺满（默认）
    #[default]
    Cover,
    /// 等比完整显示
    Contain,
    /// 拉伸填充（渲染层映射为 100% x 100%）
    Stretch,
}

/// 背景对齐位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundPosition {
    /// 居中（默认）
    #[default]
    Center,
    /// 顶部
    Top,
    /// 底部
    Bottom,
    /// 左侧
    Left,
    /// 右侧
    Right,
}

/// 场景入场过渡效果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneTransition {
    /// 淡入淡出（默认）
    #[default]
    Fade,
    /// 闪白
    Flash,
    /// 滑动
    Slide,
    /// 缩放
    Zoom,
    /// 无过渡
    None,
}

/// 文本效果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEffect {
    /// 打字机
    Typewriter,
    /// 抖动
    Shake,
    /// 闪烁
    Flash,
    /// 彩虹
    Rainbow,
}

/// 角色立绘
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprite {
    /// 立绘 ID（角色内唯一）
    pub id: String,
    /// 立绘名称（编辑器显示用）
    pub name: String,
    /// 立绘图片 URI
    pub image_url: String,
}

/// 角色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// 角色 ID（小说内唯一）
    pub id: String,
    /// 显示名称
    pub name: String,
    /// 名牌文本颜色（CSS 颜色字符串）
    pub color: String,
    /// 默认立绘 URI
    pub avatar_url: String,
    /// 命名立绘列表
    #[serde(default)]
    pub sprites: Vec<Sprite>,
}

impl Character {
    /// 按 ID 查找命名立绘
    pub fn sprite(&self, sprite_id: &str) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id == sprite_id)
    }
}

/// 分支选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// 选项 ID
    pub id: String,
    /// 选项显示文本
    pub text: String,
    /// 跳转目标场景 ID
    pub target_scene_id: String,
}

/// 对白
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialogue {
    /// 对白 ID（场景内唯一）
    pub id: String,
    /// 说话角色 ID（None 表示旁白）
    #[serde(default)]
    pub character_id: Option<String>,
    /// 对白文本
    pub text: String,
    /// 表情标签（如 "happy"，旁白行忽略）
    #[serde(default)]
    pub expression: Option<String>,
    /// 指定立绘 ID（引用说话角色的命名立绘，旁白行忽略）
    #[serde(default)]
    pub sprite_id: Option<String>,
    /// 语音 URI
    ///
    /// 旧版编辑器将语音写在 `audioUrl` 字段，这里兼容读取。
    #[serde(default, alias = "audioUrl")]
    pub voice_url: Option<String>,
    /// 音效 URI
    #[serde(default)]
    pub sfx_url: Option<String>,
    /// 文本效果
    #[serde(default)]
    pub text_effect: Option<TextEffect>,
    /// 分支选项
    ///
    /// 非空时本句是分支点：后续走向由选择决定，线性推进被阻断。
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl Dialogue {
    /// 是否为分支点
    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }

    /// 是否为旁白行
    pub fn is_narration(&self) -> bool {
        self.character_id.is_none()
    }

    /// 按 ID 查找选项
    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    /// 文本长度（按字符计，打字机进度的单位）
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// 场景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// 场景 ID（小说内唯一）
    pub id: String,
    /// 场景名称
    pub name: String,
    /// 背景图片 URI
    pub background_url: String,
    /// 背景音乐 URI（None 表示本场景无 BGM）
    #[serde(default)]
    pub bgm_url: Option<String>,
    /// 背景缩放方式
    #[serde(default)]
    pub background_size: BackgroundSize,
    /// 背景对齐位置
    #[serde(default)]
    pub background_position: BackgroundPosition,
    /// 入场过渡效果
    #[serde(default)]
    pub transition: SceneTransition,
    /// 场景级主题覆盖
    #[serde(default)]
    pub theme_override: Option<ThemeOverride>,
    /// 作者备注（与播放无关）
    #[serde(default)]
    pub notes: Option<String>,
    /// 对白列表（顺序即场景内默认推进顺序）
    #[serde(default)]
    pub dialogues: Vec<Dialogue>,
}

impl Scene {
    /// 按索引取对白
    pub fn dialogue(&self, index: usize) -> Option<&Dialogue> {
        self.dialogues.get(index)
    }

    /// 对白数量
    pub fn dialogue_count(&self) -> usize {
        self.dialogues.len()
    }
}

/// 小说文档
///
/// 根文档。场景列表的顺序即默认（无分支时）的播放顺序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Novel {
    /// 文档 ID
    pub id: String,
    /// 标题
    pub title: String,
    /// 简介
    #[serde(default)]
    pub description: String,
    /// 作者 ID
    #[serde(default)]
    pub author_id: String,
    /// 封面图片 URI
    #[serde(default)]
    pub cover_url: String,
    /// 题材标签（有序，允许重复）
    #[serde(default)]
    pub genre: Vec<String>,
    /// 场景列表（顺序 = 播放顺序）
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// 角色列表（顺序无意义）
    #[serde(default)]
    pub characters: Vec<Character>,
    /// 点赞数
    #[serde(default)]
    pub likes: u64,
    /// 播放数
    #[serde(default)]
    pub plays: u64,
    /// 发布时间（ISO 8601 字符串）
    #[serde(default)]
    pub published_at: Option<String>,
    /// 全局主题
    #[serde(default)]
    pub theme: Option<NovelTheme>,
}

impl Novel {
    /// 从 JSON 文本加载文档
    ///
    /// 只在 JSON 本身畸形时失败；结构性缺陷（悬空引用等）
    /// 由 [`crate::diagnostic::analyze_novel`] 报告，不阻止加载。
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(text).map_err(DocumentError::parse)
    }

    /// 序列化为 JSON 文本
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string(self).map_err(DocumentError::serialize)
    }

    /// 序列化为带缩进的 JSON 文本
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(DocumentError::serialize)
    }

    /// 按索引取场景
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// 场景数量
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// 按 ID 查找角色
    pub fn character(&self, character_id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == character_id)
    }

    /// 按场景 ID 查找场景索引（分支跳转用）
    pub fn scene_index_by_id(&self, scene_id: &str) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == scene_id)
    }
}
