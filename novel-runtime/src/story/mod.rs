//! # Story 模块
//!
//! 剧本文档模型：角色、场景、对话、选项与菜单配置。
//!
//! 剧本在加载时一次性解析并校验，之后在运行期间只读。
//! 剧本中的资源路径相对于剧本文件所在目录保存，
//! [`Story::from_json`] 会把它们解析成绝对路径，
//! [`Story::to_json_relative`] 负责反向转换。

mod color;
mod menu;
mod paths;

pub use color::Rgba;
pub use menu::{
    MainMenuAction, MainMenuConfig, MenuButton, MenuLogo, MenuSlider, MenuSounds, PauseAction,
    PauseMenuButton, PauseMenuConfig, SaveLoadScreenConfig, SaveSlotConfig, VolumeSetting,
};
pub use paths::{normalize_path, relativize_path, resolve_path};

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::animation::{AnimationTarget, Keyframe};
use crate::error::StoryError;
use paths::{empty_as_none, opt_path};

fn default_title() -> String {
    "未命名".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_dialog_bg_color() -> String {
    "#14142890".to_string()
}

fn default_dialog_border_color() -> String {
    "#646496".to_string()
}

fn white_hex() -> String {
    "#FFFFFF".to_string()
}

fn default_scene_name() -> String {
    "新场景".to_string()
}

fn default_emotion() -> String {
    "default".to_string()
}

fn one() -> f32 {
    1.0
}

/// 剧本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub start_scene_id: String,
    #[serde(default = "default_dialog_bg_color")]
    pub dialog_bg_color: String,
    #[serde(default = "default_dialog_border_color")]
    pub dialog_border_color: String,
    #[serde(default = "white_hex")]
    pub dialog_text_color: String,
    #[serde(default)]
    pub main_menu: MainMenuConfig,
    #[serde(default)]
    pub pause_menu: PauseMenuConfig,
    #[serde(default)]
    pub characters: BTreeMap<String, Character>,
    #[serde(default)]
    pub scenes: BTreeMap<String, Scene>,
}

/// 对话框配色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogTheme {
    pub background: Rgba,
    pub border: Rgba,
    pub text: Rgba,
}

/// 角色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    /// 名字颜色
    #[serde(default = "white_hex")]
    pub color: String,
    /// 名字背景色，未设置时不绘制背景
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub name_bg_color: Option<String>,
    /// 表情 -> 立绘路径
    #[serde(default)]
    pub images: BTreeMap<String, PathBuf>,
}

impl Character {
    /// 按表情查找立绘
    ///
    /// 找不到时依次回退到 `"default"` 和第一张立绘。
    pub fn image_for(&self, emotion: &str) -> Option<&Path> {
        self.images
            .get(emotion)
            .or_else(|| self.images.get("default"))
            .or_else(|| self.images.values().next())
            .map(PathBuf::as_path)
    }

    pub fn name_color(&self) -> Rgba {
        Rgba::parse_or_white(&self.color)
    }

    pub fn name_background(&self) -> Option<Rgba> {
        self.name_bg_color.as_deref().and_then(Rgba::parse_hex)
    }
}

/// 二维变换
///
/// 坐标为 0..1 的归一化屏幕坐标，旋转单位为度。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform2D {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub skew_x: f32,
    pub skew_y: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            rotation: 0.0,
            scale: 1.0,
            flip_x: false,
            flip_y: false,
            skew_x: 0.0,
            skew_y: 0.0,
        }
    }
}

impl Transform2D {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

/// 旧格式的站位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagePosition {
    Left,
    Right,
    /// 未知取值按居中处理
    #[serde(other)]
    Center,
}

impl StagePosition {
    /// 站位对应的变换
    pub fn transform(self) -> Transform2D {
        let x = match self {
            StagePosition::Left => 0.2,
            StagePosition::Center => 0.5,
            StagePosition::Right => 0.8,
        };
        Transform2D::at(x, ACTOR_DEFAULT_Y)
    }
}

/// 立绘默认纵坐标
pub const ACTOR_DEFAULT_Y: f32 = 0.7;

/// 场景中预先放置的角色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorPlacement {
    /// 角色 id
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "one")]
    pub scale: f32,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
    #[serde(default)]
    pub skew_x: f32,
    #[serde(default)]
    pub skew_y: f32,
    /// 旧格式站位，只在没有精确坐标时生效
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<StagePosition>,
    #[serde(default = "default_emotion")]
    pub emotion: String,
}

impl ActorPlacement {
    /// 解析最终变换
    ///
    /// 同时给出 `x` 和 `y` 时使用精确坐标，否则按旧格式站位（默认居中）。
    pub fn transform(&self) -> Transform2D {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Transform2D {
                x,
                y,
                rotation: self.rotation,
                scale: self.scale,
                flip_x: self.flip_x,
                flip_y: self.flip_y,
                skew_x: self.skew_x,
                skew_y: self.skew_y,
            },
            _ => self.position.unwrap_or(StagePosition::Center).transform(),
        }
    }
}

/// 场景中的自由图片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    pub id: String,
    #[serde(default, with = "opt_path")]
    pub path: Option<PathBuf>,
    /// 绘制层级，小的先画
    #[serde(default)]
    pub layer: i32,
    #[serde(flatten)]
    pub transform: Transform2D,
}

/// 文字叠加层动画
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayAnimation {
    FadeIn,
    FadeOut,
    FadeInOut,
    #[default]
    #[serde(other)]
    None,
}

/// 场景中的文字叠加层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOverlayDef {
    pub id: String,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: u32,
    pub color: String,
    pub outline_color: String,
    pub outline_width: u32,
    pub rotation: f32,
    pub scale: f32,
    pub animation: OverlayAnimation,
    /// 旧字段，只在 `fade_in_duration` 保持默认值时作为淡入时长
    pub animation_duration: f32,
    pub fade_in_duration: f32,
    pub hold_duration: f32,
    pub fade_out_duration: f32,
    /// 动画进行中禁止推进对话
    pub block_skip: bool,
    /// 出场顺序
    pub order: i32,
}

impl Default for TextOverlayDef {
    fn default() -> Self {
        Self {
            id: String::new(),
            text: String::new(),
            x: 0.5,
            y: 0.5,
            font_size: 36,
            color: white_hex(),
            outline_color: "#000000".to_string(),
            outline_width: 2,
            rotation: 0.0,
            scale: 1.0,
            animation: OverlayAnimation::None,
            animation_duration: 1.0,
            fade_in_duration: 1.0,
            hold_duration: 2.0,
            fade_out_duration: 1.0,
            block_skip: false,
            order: 0,
        }
    }
}

impl TextOverlayDef {
    /// 实际使用的淡入时长
    pub fn effective_fade_in(&self) -> f32 {
        if self.fade_in_duration != 1.0 {
            self.fade_in_duration
        } else {
            self.animation_duration
        }
    }
}

/// 关键帧动画定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDef {
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub character_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_id: Option<String>,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    #[serde(default, rename = "loop")]
    pub looping: bool,
}

impl AnimationDef {
    /// 动画作用对象，角色优先
    ///
    /// 两者都没有或没有关键帧时返回 `None`，这样的定义会被忽略。
    pub fn target(&self) -> Option<AnimationTarget> {
        if self.keyframes.is_empty() {
            return None;
        }
        match (&self.character_id, &self.image_id) {
            (Some(id), _) => Some(AnimationTarget::actor(id)),
            (None, Some(id)) => Some(AnimationTarget::image(id)),
            (None, None) => None,
        }
    }
}

/// 对话行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogLine {
    /// 说话人，`None` 表示旁白
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub character_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_emotion")]
    pub emotion: String,
    /// 说话人站位覆盖
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Transform2D>,
    #[serde(default, with = "opt_path")]
    pub sound_file: Option<PathBuf>,
    /// 打字总时长（秒）：未设置使用默认速度，0 表示立即显示
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typing_speed: Option<f32>,
    /// 推进前需要等待的时间（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f32>,
    #[serde(default)]
    pub is_delay_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<AnimationDef>,
}

impl DialogLine {
    /// 旁白
    pub fn narration(text: impl Into<String>) -> Self {
        Self {
            character_id: None,
            text: text.into(),
            emotion: default_emotion(),
            position: None,
            sound_file: None,
            typing_speed: None,
            delay: None,
            is_delay_only: false,
            animations: Vec::new(),
        }
    }

    /// 角色台词
    pub fn spoken(character_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            character_id: Some(character_id.into()),
            ..Self::narration(text)
        }
    }

    /// 纯等待行
    pub fn pause(seconds: f32) -> Self {
        Self {
            delay: Some(seconds),
            is_delay_only: true,
            ..Self::narration("")
        }
    }

    /// 有效等待时长，负数视为 0
    pub fn delay_seconds(&self) -> f32 {
        self.delay.unwrap_or(0.0).max(0.0)
    }
}

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub next_scene_id: String,
}

impl Choice {
    pub fn new(text: impl Into<String>, next_scene_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_scene_id: next_scene_id.into(),
        }
    }
}

/// 场景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default = "default_scene_name")]
    pub name: String,
    /// 背景图，优先于纯色背景
    #[serde(default, with = "opt_path")]
    pub background: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<[u8; 3]>,
    #[serde(default, with = "opt_path")]
    pub music: Option<PathBuf>,
    #[serde(default)]
    pub dialogs: Vec<DialogLine>,
    #[serde(default)]
    pub characters_on_screen: Vec<ActorPlacement>,
    #[serde(default)]
    pub images_on_screen: Vec<ImagePlacement>,
    #[serde(default)]
    pub texts_on_screen: Vec<TextOverlayDef>,
    #[serde(default)]
    pub background_animations: Vec<AnimationDef>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_scene_id: Option<String>,
}

impl Scene {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: default_scene_name(),
            background: None,
            background_color: None,
            music: None,
            dialogs: Vec::new(),
            characters_on_screen: Vec::new(),
            images_on_screen: Vec::new(),
            texts_on_screen: Vec::new(),
            background_animations: Vec::new(),
            choices: Vec::new(),
            next_scene_id: None,
        }
    }

    pub fn with_dialog(mut self, line: DialogLine) -> Self {
        self.dialogs.push(line);
        self
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_next(mut self, next_scene_id: impl Into<String>) -> Self {
        self.next_scene_id = Some(next_scene_id.into());
        self
    }

    pub fn background_rgb(&self) -> Option<Rgba> {
        self.background_color.map(Rgba::from_triplet)
    }

    /// 场景引用的所有场景 id（下一场景与选项目标）
    pub fn outgoing_scene_ids(&self) -> impl Iterator<Item = &str> {
        self.next_scene_id
            .as_deref()
            .into_iter()
            .chain(self.choices.iter().map(|c| c.next_scene_id.as_str()))
    }
}

/// 悬空引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// 引用所在场景
    pub scene_id: String,
    /// 被引用但不存在的 id
    pub target: String,
    pub kind: ReferenceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    NextScene,
    ChoiceTarget,
    Character,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ReferenceKind::NextScene => "下一场景",
            ReferenceKind::ChoiceTarget => "选项目标",
            ReferenceKind::Character => "角色",
        };
        write!(
            f,
            "场景 '{}' 引用了不存在的{} '{}'",
            self.scene_id, what, self.target
        )
    }
}

impl Story {
    /// 创建只含起始场景的剧本
    pub fn new(start_scene: Scene) -> Self {
        let start_scene_id = start_scene.id.clone();
        let mut scenes = BTreeMap::new();
        scenes.insert(start_scene_id.clone(), start_scene);
        Self {
            title: default_title(),
            author: String::new(),
            version: default_version(),
            start_scene_id,
            dialog_bg_color: default_dialog_bg_color(),
            dialog_border_color: default_dialog_border_color(),
            dialog_text_color: white_hex(),
            main_menu: MainMenuConfig::default(),
            pause_menu: PauseMenuConfig::default(),
            characters: BTreeMap::new(),
            scenes,
        }
    }

    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.insert(scene.id.clone(), scene);
        self
    }

    pub fn with_character(mut self, character: Character) -> Self {
        self.characters.insert(character.id.clone(), character);
        self
    }

    /// 解析剧本
    ///
    /// 相对路径以 `base_dir`（剧本文件所在目录）为基准解析成绝对路径，
    /// 关键帧按时间排序，随后执行完整校验。
    pub fn from_json(json: &str, base_dir: &Path) -> Result<Self, StoryError> {
        let mut story: Story = serde_json::from_str(json)?;
        story.for_each_path_mut(&mut |p: &mut PathBuf| *p = resolve_path(base_dir, p));
        story.sort_keyframes();
        story.validate()?;
        Ok(story)
    }

    /// 序列化为 JSON，资源路径转换为相对于 `base_dir` 的形式
    pub fn to_json_relative(&self, base_dir: &Path) -> Result<String, StoryError> {
        let mut copy = self.clone();
        copy.for_each_path_mut(&mut |p: &mut PathBuf| *p = relativize_path(base_dir, p));
        serde_json::to_string_pretty(&copy).map_err(|e| StoryError::Serialize {
            message: e.to_string(),
        })
    }

    /// 校验剧本结构
    pub fn validate(&self) -> Result<(), StoryError> {
        if self.start_scene_id.trim().is_empty() {
            return Err(StoryError::MissingStartScene);
        }
        if !self.scenes.contains_key(&self.start_scene_id) {
            return Err(StoryError::UnknownStartScene {
                scene_id: self.start_scene_id.clone(),
            });
        }
        for (key, scene) in &self.scenes {
            if scene.id.trim().is_empty() {
                return Err(StoryError::EmptySceneId { key: key.clone() });
            }
            if &scene.id != key {
                return Err(StoryError::SceneIdMismatch {
                    key: key.clone(),
                    id: scene.id.clone(),
                });
            }
            let animations = scene
                .background_animations
                .iter()
                .chain(scene.dialogs.iter().flat_map(|d| d.animations.iter()));
            for animation in animations {
                if let Some(kf) = animation
                    .keyframes
                    .iter()
                    .find(|kf| !kf.time.is_finite() || kf.time < 0.0)
                {
                    return Err(StoryError::InvalidKeyframeTime {
                        scene_id: scene.id.clone(),
                        time: kf.time,
                    });
                }
            }
        }
        for (key, character) in &self.characters {
            if &character.id != key {
                return Err(StoryError::CharacterIdMismatch {
                    key: key.clone(),
                    id: character.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// 列出所有悬空引用
    ///
    /// 悬空引用不会阻止加载，运行到时记录日志并停留在当前状态。
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut out = Vec::new();
        for scene in self.scenes.values() {
            if let Some(next) = &scene.next_scene_id {
                if !self.scenes.contains_key(next) {
                    out.push(DanglingReference {
                        scene_id: scene.id.clone(),
                        target: next.clone(),
                        kind: ReferenceKind::NextScene,
                    });
                }
            }
            for choice in &scene.choices {
                if !self.scenes.contains_key(&choice.next_scene_id) {
                    out.push(DanglingReference {
                        scene_id: scene.id.clone(),
                        target: choice.next_scene_id.clone(),
                        kind: ReferenceKind::ChoiceTarget,
                    });
                }
            }
            let speakers = scene.dialogs.iter().filter_map(|d| d.character_id.as_ref());
            let actors = scene.characters_on_screen.iter().map(|a| &a.id);
            for id in speakers.chain(actors) {
                let already = out.iter().any(|r| {
                    r.kind == ReferenceKind::Character && r.scene_id == scene.id && &r.target == id
                });
                if !self.characters.contains_key(id) && !already {
                    out.push(DanglingReference {
                        scene_id: scene.id.clone(),
                        target: id.clone(),
                        kind: ReferenceKind::Character,
                    });
                }
            }
        }
        out
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn start_scene(&self) -> Option<&Scene> {
        self.scene(&self.start_scene_id)
    }

    /// 对话框配色，格式错误的颜色回退为白色
    pub fn theme(&self) -> DialogTheme {
        DialogTheme {
            background: Rgba::parse_or_white(&self.dialog_bg_color),
            border: Rgba::parse_or_white(&self.dialog_border_color),
            text: Rgba::parse_or_white(&self.dialog_text_color),
        }
    }

    fn sort_keyframes(&mut self) {
        for scene in self.scenes.values_mut() {
            let animations = scene
                .background_animations
                .iter_mut()
                .chain(scene.dialogs.iter_mut().flat_map(|d| d.animations.iter_mut()));
            for animation in animations {
                animation
                    .keyframes
                    .sort_by(|a, b| a.time.total_cmp(&b.time));
            }
        }
    }

    /// 遍历剧本中的所有资源路径
    pub fn for_each_path_mut(&mut self, f: &mut dyn FnMut(&mut PathBuf)) {
        self.main_menu.visit_paths(f);
        self.pause_menu.visit_paths(f);
        for character in self.characters.values_mut() {
            character.images.values_mut().for_each(&mut *f);
        }
        for scene in self.scenes.values_mut() {
            for path in [&mut scene.background, &mut scene.music]
                .into_iter()
                .flatten()
            {
                f(path);
            }
            for line in &mut scene.dialogs {
                if let Some(path) = &mut line.sound_file {
                    f(path);
                }
            }
            for image in &mut scene.images_on_screen {
                if let Some(path) = &mut image.path {
                    f(path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r##"{
        "title": "演示",
        "start_scene_id": "intro",
        "characters": {
            "alice": {
                "id": "alice",
                "name": "Alice",
                "color": "#FF8080",
                "name_bg_color": "",
                "images": {"default": "img/alice.png", "happy": "img/alice_happy.png"}
            }
        },
        "scenes": {
            "intro": {
                "id": "intro",
                "background": "bg/room.png",
                "music": "",
                "dialogs": [
                    {"character_id": "alice", "text": "你好", "emotion": "happy"},
                    {"text": "", "delay": 1.5, "is_delay_only": true}
                ],
                "characters_on_screen": [{"id": "alice", "position": "left"}],
                "images_on_screen": [{"id": "sun", "path": "img/sun.png", "x": 0.1, "layer": 2}],
                "background_animations": [
                    {"image_id": "sun", "keyframes": [{"time": 2, "x": 0.9}, {"time": 0, "x": 0.1}], "loop": true}
                ],
                "choices": [{"text": "去左边", "next_scene_id": "left"}]
            },
            "left": {"id": "left", "next_scene_id": "nowhere"}
        }
    }"##;

    #[test]
    fn test_parse_with_defaults() {
        let story = Story::from_json(DEMO, Path::new("/game")).unwrap();
        assert_eq!(story.version, "1.0");
        assert_eq!(story.theme().background, Rgba::rgba(0x14, 0x14, 0x28, 0x90));

        let alice = story.character("alice").unwrap();
        assert_eq!(alice.name_bg_color, None);
        assert_eq!(alice.name_color(), Rgba::rgb(0xFF, 0x80, 0x80));

        let intro = story.scene("intro").unwrap();
        assert_eq!(intro.music, None);
        assert_eq!(intro.name, "新场景");
        assert_eq!(intro.dialogs[1].delay_seconds(), 1.5);
        assert!(intro.dialogs[1].is_delay_only);
        assert_eq!(intro.images_on_screen[0].transform.y, 0.5);
        assert_eq!(intro.images_on_screen[0].layer, 2);
    }

    #[test]
    fn test_paths_resolved_against_story_dir() {
        let story = Story::from_json(DEMO, Path::new("/game")).unwrap();
        let intro = story.scene("intro").unwrap();
        assert_eq!(intro.background, Some(PathBuf::from("/game/bg/room.png")));
        assert_eq!(
            story.character("alice").unwrap().image_for("happy"),
            Some(Path::new("/game/img/alice_happy.png"))
        );
    }

    #[test]
    fn test_to_json_relative_round_trip() {
        let story = Story::from_json(DEMO, Path::new("/game")).unwrap();
        let json = story.to_json_relative(Path::new("/game")).unwrap();
        assert!(json.contains("\"bg/room.png\""));

        let reloaded = Story::from_json(&json, Path::new("/game")).unwrap();
        assert_eq!(reloaded, story);
    }

    #[test]
    fn test_keyframes_sorted_on_load() {
        let story = Story::from_json(DEMO, Path::new("")).unwrap();
        let anim = &story.scene("intro").unwrap().background_animations[0];
        assert_eq!(anim.keyframes[0].time, 0.0);
        assert_eq!(anim.keyframes[1].time, 2.0);
        // 缺省字段使用关键帧默认值
        assert_eq!(anim.keyframes[0].y, 0.7);
        assert_eq!(anim.target(), Some(AnimationTarget::image("sun")));
    }

    #[test]
    fn test_legacy_and_exact_actor_position() {
        let story = Story::from_json(DEMO, Path::new("")).unwrap();
        let placement = &story.scene("intro").unwrap().characters_on_screen[0];
        let t = placement.transform();
        assert_eq!((t.x, t.y), (0.2, 0.7));

        let exact: ActorPlacement =
            serde_json::from_str(r#"{"id": "a", "x": 0.3, "y": 0.4, "position": "right"}"#).unwrap();
        assert_eq!((exact.transform().x, exact.transform().y), (0.3, 0.4));

        let fallback: ActorPlacement = serde_json::from_str(r#"{"id": "a", "x": 0.3}"#).unwrap();
        assert_eq!(fallback.transform().x, 0.5);

        let unknown: ActorPlacement =
            serde_json::from_str(r#"{"id": "a", "position": "top"}"#).unwrap();
        assert_eq!(unknown.position, Some(StagePosition::Center));
        let right: ActorPlacement =
            serde_json::from_str(r#"{"id": "a", "position": "right"}"#).unwrap();
        assert_eq!(right.transform().x, 0.8);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let json = r#"{"start_scene_id": "a", "scenes": {"a": {"name": "无 id"}}}"#;
        let err = Story::from_json(json, Path::new("")).unwrap_err();
        assert!(matches!(err, StoryError::Parse { .. }));

        let json = r#"{"start_scene_id": "a", "scenes": {"a": {"id": "a", "choices": [{"text": "x"}]}}}"#;
        assert!(Story::from_json(json, Path::new("")).is_err());
    }

    #[test]
    fn test_structural_validation() {
        let json = r#"{"start_scene_id": "b", "scenes": {"a": {"id": "a"}}}"#;
        assert_eq!(
            Story::from_json(json, Path::new("")).unwrap_err(),
            StoryError::UnknownStartScene {
                scene_id: "b".to_string()
            }
        );

        let json = r#"{"start_scene_id": "a", "scenes": {"a": {"id": "x"}}}"#;
        assert!(matches!(
            Story::from_json(json, Path::new("")).unwrap_err(),
            StoryError::SceneIdMismatch { .. }
        ));

        let json = r#"{"scenes": {"a": {"id": "a"}}}"#;
        assert_eq!(
            Story::from_json(json, Path::new("")).unwrap_err(),
            StoryError::MissingStartScene
        );

        let json = r#"{"start_scene_id": "a", "scenes": {"a": {"id": "a",
            "background_animations": [{"character_id": "c", "keyframes": [{"time": -1}]}]}}}"#;
        assert!(matches!(
            Story::from_json(json, Path::new("")).unwrap_err(),
            StoryError::InvalidKeyframeTime { .. }
        ));
    }

    #[test]
    fn test_dangling_references() {
        let story = Story::from_json(DEMO, Path::new("")).unwrap();
        let dangling = story.dangling_references();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target, "nowhere");
        assert_eq!(dangling[0].kind, ReferenceKind::NextScene);
        assert!(dangling[0].to_string().contains("nowhere"));
    }

    #[test]
    fn test_image_fallbacks() {
        let mut images = BTreeMap::new();
        images.insert("sad".to_string(), PathBuf::from("sad.png"));
        let character = Character {
            id: "c".to_string(),
            name: "C".to_string(),
            color: white_hex(),
            name_bg_color: None,
            images,
        };
        // 没有 default 时回退到第一张立绘
        assert_eq!(character.image_for("angry"), Some(Path::new("sad.png")));
    }

    #[test]
    fn test_text_overlay_legacy_duration() {
        let legacy: TextOverlayDef =
            serde_json::from_str(r#"{"animation": "fade_in", "animation_duration": 3.0}"#).unwrap();
        assert_eq!(legacy.effective_fade_in(), 3.0);

        let modern: TextOverlayDef = serde_json::from_str(
            r#"{"animation": "fade_in_out", "animation_duration": 3.0, "fade_in_duration": 0.5}"#,
        )
        .unwrap();
        assert_eq!(modern.effective_fade_in(), 0.5);

        let unknown: TextOverlayDef = serde_json::from_str(r#"{"animation": "spin"}"#).unwrap();
        assert_eq!(unknown.animation, OverlayAnimation::None);
    }
}
