//! 菜单配置
//!
//! 主菜单与暂停菜单的布局数据。只保留运行时需要的字段（位置、尺寸、
//! 动作、音效与时长），纯样式字段（字体、圆角、配色）在加载时被忽略。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::opt_path;
use crate::layout::{Rect, ScreenSize};

/// 主菜单按钮动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainMenuAction {
    Start,
    Continue,
    Settings,
    Exit,
    Back,
    /// 无法识别的动作，点击后无效果
    #[serde(other)]
    Unknown,
}

/// 暂停菜单按钮动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseAction {
    Resume,
    Save,
    Load,
    Settings,
    MainMenu,
    Exit,
    Back,
    #[serde(other)]
    Unknown,
}

/// 滑块绑定的设置项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeSetting {
    MusicVolume,
    SoundVolume,
    VoiceVolume,
    #[serde(other)]
    Unknown,
}

fn half() -> f32 {
    0.5
}

fn visible() -> bool {
    true
}

/// 主菜单按钮
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuButton {
    pub id: String,
    pub text: String,
    pub action: MainMenuAction,
    #[serde(default = "half")]
    pub x: f32,
    #[serde(default = "half")]
    pub y: f32,
    #[serde(default = "default_menu_button_width")]
    pub width: u32,
    #[serde(default = "default_menu_button_height")]
    pub height: u32,
    #[serde(default = "visible")]
    pub visible: bool,
}

fn default_menu_button_width() -> u32 {
    300
}

fn default_menu_button_height() -> u32 {
    60
}

impl MenuButton {
    pub fn new(id: &str, text: &str, action: MainMenuAction, y: f32) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            action,
            x: 0.5,
            y,
            width: default_menu_button_width(),
            height: default_menu_button_height(),
            visible: true,
        }
    }

    /// 屏幕上的命中区域
    pub fn rect(&self, screen: ScreenSize) -> Rect {
        Rect::from_normalized_center(screen, self.x, self.y, self.width as f32, self.height as f32)
    }
}

/// 暂停菜单按钮
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseMenuButton {
    pub id: String,
    pub text: String,
    pub action: PauseAction,
    #[serde(default = "half")]
    pub x: f32,
    #[serde(default = "half")]
    pub y: f32,
    #[serde(default = "default_pause_button_width")]
    pub width: u32,
    #[serde(default = "default_pause_button_height")]
    pub height: u32,
    #[serde(default = "visible")]
    pub visible: bool,
}

fn default_pause_button_width() -> u32 {
    250
}

fn default_pause_button_height() -> u32 {
    50
}

impl PauseMenuButton {
    pub fn new(id: &str, text: &str, action: PauseAction, y: f32) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            action,
            x: 0.5,
            y,
            width: default_pause_button_width(),
            height: default_pause_button_height(),
            visible: true,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn rect(&self, screen: ScreenSize) -> Rect {
        Rect::from_normalized_center(screen, self.x, self.y, self.width as f32, self.height as f32)
    }
}

/// 设置滑块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSlider {
    pub id: String,
    pub label: String,
    pub setting: VolumeSetting,
    #[serde(default = "half")]
    pub x: f32,
    #[serde(default = "half")]
    pub y: f32,
    #[serde(default = "default_slider_width")]
    pub width: u32,
    #[serde(default = "default_slider_height")]
    pub height: u32,
    #[serde(default)]
    pub min_value: f32,
    #[serde(default = "default_slider_max")]
    pub max_value: f32,
    #[serde(default = "default_slider_value")]
    pub value: f32,
}

fn default_slider_width() -> u32 {
    300
}

fn default_slider_height() -> u32 {
    40
}

fn default_slider_max() -> f32 {
    1.0
}

fn default_slider_value() -> f32 {
    0.8
}

impl MenuSlider {
    pub fn new(id: &str, label: &str, setting: VolumeSetting, y: f32) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            setting,
            x: 0.5,
            y,
            width: default_slider_width(),
            height: default_slider_height(),
            min_value: 0.0,
            max_value: default_slider_max(),
            value: default_slider_value(),
        }
    }

    pub fn rect(&self, screen: ScreenSize) -> Rect {
        Rect::from_normalized_center(screen, self.x, self.y, self.width as f32, self.height as f32)
    }

    /// 根据指针横坐标计算滑块值
    pub fn value_at(&self, screen: ScreenSize, px: f32) -> f32 {
        let rect = self.rect(screen);
        let ratio = if rect.w > 0.0 {
            ((px - rect.x) / rect.w).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.min_value + (self.max_value - self.min_value) * ratio
    }
}

/// 主菜单 Logo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuLogo {
    #[serde(with = "opt_path")]
    pub image_path: Option<PathBuf>,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for MenuLogo {
    fn default() -> Self {
        Self {
            image_path: None,
            x: 0.5,
            y: 0.2,
            scale: 1.0,
        }
    }
}

/// 主菜单音效
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuSounds {
    #[serde(with = "opt_path")]
    pub background_music: Option<PathBuf>,
    #[serde(with = "opt_path")]
    pub hover_sound: Option<PathBuf>,
    #[serde(with = "opt_path")]
    pub click_sound: Option<PathBuf>,
    #[serde(with = "opt_path")]
    pub back_sound: Option<PathBuf>,
}

/// 主菜单配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainMenuConfig {
    pub enabled: bool,
    #[serde(with = "opt_path")]
    pub background: Option<PathBuf>,
    pub background_color: Option<[u8; 3]>,
    pub logo: MenuLogo,
    pub buttons: Vec<MenuButton>,
    pub sliders: Vec<MenuSlider>,
    pub back_button: MenuButton,
    pub sounds: MenuSounds,
    pub fade_in_duration: f32,
}

impl Default for MainMenuConfig {
    fn default() -> Self {
        use MainMenuAction::*;
        use VolumeSetting::*;
        Self {
            enabled: true,
            background: None,
            background_color: None,
            logo: MenuLogo::default(),
            buttons: vec![
                MenuButton::new("btn_start", "开始游戏", Start, 0.45),
                MenuButton::new("btn_continue", "继续游戏", Continue, 0.55),
                MenuButton::new("btn_settings", "设置", Settings, 0.65),
                MenuButton::new("btn_exit", "退出", Exit, 0.75),
            ],
            sliders: vec![
                MenuSlider::new("slider_music", "音乐", MusicVolume, 0.35),
                MenuSlider::new("slider_sound", "音效", SoundVolume, 0.50),
                MenuSlider::new("slider_voice", "语音", VoiceVolume, 0.65),
            ],
            back_button: MenuButton::new("btn_back", "返回", Back, 0.85),
            sounds: MenuSounds::default(),
            fade_in_duration: 0.5,
        }
    }
}

impl MainMenuConfig {
    pub(crate) fn visit_paths(&mut self, f: &mut dyn FnMut(&mut PathBuf)) {
        let sounds = &mut self.sounds;
        for path in [
            &mut self.background,
            &mut self.logo.image_path,
            &mut sounds.background_music,
            &mut sounds.hover_sound,
            &mut sounds.click_sound,
            &mut sounds.back_sound,
        ]
        .into_iter()
        .flatten()
        {
            f(path);
        }
    }
}

/// 存档格尺寸
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveSlotConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for SaveSlotConfig {
    fn default() -> Self {
        Self {
            width: 280,
            height: 180,
        }
    }
}

/// 存档 / 读档界面布局
///
/// 每页 `slots_per_page` 个存档格，按 2 列网格排列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveLoadScreenConfig {
    pub slots_start_x: f32,
    pub slots_start_y: f32,
    pub slots_spacing_x: u32,
    pub slots_spacing_y: u32,
    pub slots_per_page: u32,
    pub total_pages: u32,
    pub slot_config: SaveSlotConfig,
    pub page_indicator_y: f32,
    pub page_button_width: u32,
    pub page_button_height: u32,
    pub prev_button_x: f32,
    pub next_button_x: f32,
    pub back_button: PauseMenuButton,
}

impl Default for SaveLoadScreenConfig {
    fn default() -> Self {
        Self {
            slots_start_x: 0.25,
            slots_start_y: 0.18,
            slots_spacing_x: 300,
            slots_spacing_y: 200,
            slots_per_page: 4,
            total_pages: 5,
            slot_config: SaveSlotConfig::default(),
            page_indicator_y: 0.88,
            page_button_width: 100,
            page_button_height: 40,
            prev_button_x: 0.35,
            next_button_x: 0.65,
            back_button: PauseMenuButton::new("btn_back_save", "返回", PauseAction::Back, 0.95)
                .with_size(150, 40),
        }
    }
}

impl SaveLoadScreenConfig {
    /// 页内第 `index` 个存档格的矩形（左上角对齐网格原点）
    pub fn slot_rect(&self, screen: ScreenSize, index: u32) -> Rect {
        let col = index % 2;
        let row = index / 2;
        let x = self.slots_start_x * screen.width_f() + (col * self.slots_spacing_x) as f32;
        let y = self.slots_start_y * screen.height_f() + (row * self.slots_spacing_y) as f32;
        Rect::new(
            x,
            y,
            self.slot_config.width as f32,
            self.slot_config.height as f32,
        )
    }

    pub fn prev_page_rect(&self, screen: ScreenSize) -> Rect {
        Rect::from_normalized_center(
            screen,
            self.prev_button_x,
            self.page_indicator_y,
            self.page_button_width as f32,
            self.page_button_height as f32,
        )
    }

    pub fn next_page_rect(&self, screen: ScreenSize) -> Rect {
        Rect::from_normalized_center(
            screen,
            self.next_button_x,
            self.page_indicator_y,
            self.page_button_width as f32,
            self.page_button_height as f32,
        )
    }

    /// 槽位总数
    pub fn slot_count(&self) -> u32 {
        self.slots_per_page * self.total_pages
    }
}

/// 暂停菜单配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseMenuConfig {
    pub enabled: bool,
    /// 遮罩透明度（0-255）
    pub overlay_alpha: u8,
    pub panel_width: u32,
    pub panel_height: u32,
    pub panel_x: f32,
    pub panel_y: f32,
    pub buttons: Vec<PauseMenuButton>,
    pub save_load_screen: SaveLoadScreenConfig,
    pub settings_sliders: Vec<MenuSlider>,
    pub settings_back_button: PauseMenuButton,
    #[serde(with = "opt_path")]
    pub open_sound: Option<PathBuf>,
    #[serde(with = "opt_path")]
    pub close_sound: Option<PathBuf>,
    #[serde(with = "opt_path")]
    pub hover_sound: Option<PathBuf>,
    #[serde(with = "opt_path")]
    pub click_sound: Option<PathBuf>,
    pub fade_duration: f32,
}

impl Default for PauseMenuConfig {
    fn default() -> Self {
        use PauseAction::*;
        use VolumeSetting::*;
        Self {
            enabled: true,
            overlay_alpha: 180,
            panel_width: 400,
            panel_height: 500,
            panel_x: 0.5,
            panel_y: 0.5,
            buttons: vec![
                PauseMenuButton::new("btn_resume", "继续", Resume, 0.28),
                PauseMenuButton::new("btn_save", "保存", Save, 0.40),
                PauseMenuButton::new("btn_load", "读取", Load, 0.52),
                PauseMenuButton::new("btn_settings", "设置", Settings, 0.64),
                PauseMenuButton::new("btn_main_menu", "返回主菜单", MainMenu, 0.76),
                PauseMenuButton::new("btn_exit", "退出游戏", Exit, 0.88),
            ],
            save_load_screen: SaveLoadScreenConfig::default(),
            settings_sliders: vec![
                MenuSlider::new("pause_slider_music", "音乐", MusicVolume, 0.30),
                MenuSlider::new("pause_slider_sound", "音效", SoundVolume, 0.45),
                MenuSlider::new("pause_slider_voice", "语音", VoiceVolume, 0.60),
            ],
            settings_back_button: PauseMenuButton::new("btn_settings_back", "返回", Back, 0.80),
            open_sound: None,
            close_sound: None,
            hover_sound: None,
            click_sound: None,
            fade_duration: 0.2,
        }
    }
}

impl PauseMenuConfig {
    pub(crate) fn visit_paths(&mut self, f: &mut dyn FnMut(&mut PathBuf)) {
        for path in [
            &mut self.open_sound,
            &mut self.close_sound,
            &mut self.hover_sound,
            &mut self.click_sound,
        ]
        .into_iter()
        .flatten()
        {
            f(path);
        }
    }
}
