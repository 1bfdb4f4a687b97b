//! # Frame 模块
//!
//! 每帧输出的画面描述。
//!
//! 运行时不负责绘制，宿主根据 [`Frame`] 渲染、生成存档缩略图或写入日志。
//! 所有坐标都已换算成像素，宿主不需要了解剧本格式。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::layout::{Rect, ScreenSize};
use crate::menu::MenuScreen;
use crate::scene::{ActorSprite, Backdrop, ImageSprite, ScenePhase, SceneController};
use crate::story::{DialogTheme, Rgba, Transform2D};

/// 背景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackdropView {
    Image {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    Color {
        color: Rgba,
    },
    /// 默认渐变
    Gradient,
}

impl From<&Backdrop> for BackdropView {
    fn from(backdrop: &Backdrop) -> Self {
        match backdrop {
            Backdrop::Image(info) => BackdropView::Image {
                path: info.path.clone(),
                width: info.width,
                height: info.height,
            },
            Backdrop::Color(color) => BackdropView::Color { color: *color },
            Backdrop::Gradient => BackdropView::Gradient,
        }
    }
}

/// 立绘或自由图片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteView {
    pub id: String,
    /// 图片不可用时为 `None`，不绘制
    pub path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub layer: i32,
    pub transform: Transform2D,
    pub alpha: f32,
}

impl SpriteView {
    fn from_actor(actor: &ActorSprite) -> Self {
        let (path, width, height) = match &actor.image {
            Some(info) => (Some(info.path.clone()), info.width, info.height),
            None => (None, 0, 0),
        };
        Self {
            id: actor.character_id.clone(),
            path,
            width,
            height,
            layer: 0,
            transform: actor.transform,
            alpha: actor.alpha,
        }
    }

    fn from_image(image: &ImageSprite) -> Self {
        let (path, width, height) = match &image.image {
            Some(info) => (Some(info.path.clone()), info.width, info.height),
            None => (None, 0, 0),
        };
        Self {
            id: image.id.clone(),
            path,
            width,
            height,
            layer: image.layer,
            transform: image.transform,
            alpha: image.alpha,
        }
    }

    /// 屏幕上的包围矩形（以变换坐标为中心，忽略旋转）
    pub fn rect(&self, screen: ScreenSize) -> Option<Rect> {
        self.path.as_ref()?;
        let (cx, cy) = screen.to_pixels(self.transform.x, self.transform.y);
        let scale = self.transform.scale.abs();
        Some(Rect::centered(
            cx,
            cy,
            self.width as f32 * scale,
            self.height as f32 * scale,
        ))
    }
}

/// 可见的文字叠加层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayView {
    pub id: String,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: u32,
    pub color: Rgba,
    pub outline_color: Rgba,
    pub outline_width: u32,
    pub rotation: f32,
    pub scale: f32,
    pub alpha: f32,
}

/// 对话框
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogBoxView {
    /// 说话人名字，旁白为 `None`
    pub speaker: Option<String>,
    pub name_color: Rgba,
    pub name_background: Option<Rgba>,
    pub text: String,
    /// 是否仍在打字
    pub typing: bool,
    pub theme: DialogTheme,
}

/// 选项框
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceView {
    pub text: String,
    pub rect: Rect,
    pub selected: bool,
}

/// 菜单按钮
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonView {
    pub id: String,
    pub text: String,
    pub rect: Rect,
    pub focused: bool,
}

/// 音量滑块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderView {
    pub id: String,
    pub label: String,
    pub rect: Rect,
    pub value: f32,
}

/// 存档格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    pub slot: u32,
    pub rect: Rect,
    pub scene_name: Option<String>,
    pub timestamp: Option<String>,
    pub play_time: Option<String>,
}

/// 菜单画面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuView {
    pub screen: MenuScreen,
    /// 主菜单背景，暂停菜单为 `None`（画在游戏画面之上）
    pub backdrop: Option<BackdropView>,
    pub logo: Option<PathBuf>,
    /// 遮罩或淡入的不透明度 (0.0 - 1.0)
    pub opacity: f32,
    pub panel: Option<Rect>,
    pub buttons: Vec<ButtonView>,
    pub sliders: Vec<SliderView>,
    pub slots: Vec<SlotView>,
    /// 存档页码（从 1 开始）与总页数
    pub page: Option<(u32, u32)>,
}

/// 一帧画面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub screen: ScreenSize,
    pub background: BackdropView,
    /// 按层级升序
    pub images: Vec<SpriteView>,
    pub actors: Vec<SpriteView>,
    pub overlays: Vec<OverlayView>,
    pub dialog: Option<DialogBoxView>,
    pub choices: Vec<ChoiceView>,
    pub menu: Option<MenuView>,
    pub skip_indicator: bool,
    pub end_screen: bool,
    pub paused: bool,
}

impl Frame {
    /// 空白画面
    pub fn blank(screen: ScreenSize) -> Self {
        Self {
            screen,
            background: BackdropView::Gradient,
            images: Vec::new(),
            actors: Vec::new(),
            overlays: Vec::new(),
            dialog: None,
            choices: Vec::new(),
            menu: None,
            skip_indicator: false,
            end_screen: false,
            paused: false,
        }
    }

    /// 截取场景当前的画面
    pub fn capture(scene: &SceneController, screen: ScreenSize, skip_held: bool) -> Self {
        let mut frame = Self::blank(screen);
        if !scene.is_active() {
            return frame;
        }

        let stage = scene.stage();
        frame.background = BackdropView::from(&stage.backdrop);
        frame.images = stage.images.iter().map(SpriteView::from_image).collect();
        frame.actors = stage.actors.iter().map(SpriteView::from_actor).collect();
        frame.overlays = stage
            .overlays
            .iter()
            .filter(|o| o.is_visible())
            .map(|o| {
                let def = o.def();
                OverlayView {
                    id: def.id.clone(),
                    text: def.text.clone(),
                    x: def.x,
                    y: def.y,
                    font_size: def.font_size,
                    color: o.color(),
                    outline_color: Rgba::parse_hex(&def.outline_color).unwrap_or(Rgba::BLACK),
                    outline_width: def.outline_width,
                    rotation: def.rotation,
                    scale: def.scale,
                    alpha: o.alpha(),
                }
            })
            .collect();

        match scene.phase() {
            ScenePhase::Dialog => {
                if scene.current_line().is_some_and(|l| !l.is_delay_only) {
                    let speaker = scene.speaker();
                    frame.dialog = Some(DialogBoxView {
                        speaker: speaker.map(|c| c.name.clone()),
                        name_color: speaker.map_or(Rgba::WHITE, |c| c.name_color()),
                        name_background: speaker.and_then(|c| c.name_background()),
                        text: scene.dialog().visible_text().to_string(),
                        typing: scene.dialog().is_typing(),
                        theme: scene.story().theme(),
                    });
                }
                frame.skip_indicator = scene.is_skipping(skip_held);
            }
            ScenePhase::Choice => {
                let choices = scene.choices();
                frame.choices = choices
                    .choices()
                    .iter()
                    .enumerate()
                    .map(|(i, choice)| ChoiceView {
                        text: choice.text.clone(),
                        rect: choices.rect(i),
                        selected: i == choices.selected(),
                    })
                    .collect();
            }
            ScenePhase::End => frame.end_screen = true,
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{MemoryLoader, ResourceCache};
    use crate::scene::SceneOptions;
    use crate::story::{Character, Choice, DialogLine, Scene, Story};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn story() -> Story {
        let mut images = BTreeMap::new();
        images.insert("default".to_string(), PathBuf::from("bob.png"));
        let bob = Character {
            id: "bob".to_string(),
            name: "Bob".to_string(),
            color: "#00FF00".to_string(),
            name_bg_color: None,
            images,
        };
        let mut start = Scene::new("start")
            .with_dialog(DialogLine::spoken("bob", "早上好"))
            .with_choice(Choice::new("去学校", "start"))
            .with_choice(Choice::new("睡觉", "start"));
        start.background_color = Some([0, 0, 64]);
        Story::new(start).with_character(bob)
    }

    fn resources() -> ResourceCache {
        ResourceCache::new(Box::new(MemoryLoader::new().with_image("bob.png", 300, 600)))
    }

    #[test]
    fn test_inactive_scene_is_blank() {
        let ctl = SceneController::new(Arc::new(story()), SceneOptions::default());
        let frame = Frame::capture(&ctl, ScreenSize::default(), false);
        assert_eq!(frame, Frame::blank(ScreenSize::default()));
    }

    #[test]
    fn test_dialog_frame() {
        let mut ctl = SceneController::new(Arc::new(story()), SceneOptions::default());
        let mut res = resources();
        ctl.go_to_scene("start", &mut res).unwrap();
        ctl.advance(&mut res);

        let frame = Frame::capture(&ctl, ScreenSize::default(), true);
        let dialog = frame.dialog.as_ref().unwrap();
        assert_eq!(dialog.speaker.as_deref(), Some("Bob"));
        assert_eq!(dialog.name_color, Rgba::rgb(0, 255, 0));
        assert_eq!(dialog.text, "早上好");
        assert!(frame.skip_indicator);
        assert_eq!(
            frame.background,
            BackdropView::Color {
                color: Rgba::rgb(0, 0, 64)
            }
        );

        let rect = frame.actors[0].rect(frame.screen).unwrap();
        assert_eq!(rect, Rect::new(490.0, 204.0, 300.0, 600.0));
    }

    #[test]
    fn test_choice_frame() {
        let mut ctl = SceneController::new(Arc::new(story()), SceneOptions::default());
        let mut res = resources();
        ctl.go_to_scene("start", &mut res).unwrap();
        ctl.advance(&mut res);
        ctl.advance(&mut res);

        let frame = Frame::capture(&ctl, ScreenSize::default(), true);
        assert!(frame.dialog.is_none());
        assert!(!frame.skip_indicator);
        insta::assert_yaml_snapshot!(frame.choices, @r###"
        - text: 去学校
          rect:
            x: 390
            y: 300
            w: 500
            h: 50
          selected: true
        - text: 睡觉
          rect:
            x: 390
            y: 360
            w: 500
            h: 50
          selected: false
        "###);
    }
}
