//! # Menu 模块
//!
//! 主菜单与暂停菜单的状态机。
//!
//! ## 画面
//!
//! ```text
//! Main ──settings──▶ MainSettings
//!   └──continue──▶ MainLoad
//!
//! Pause ──save──▶ PauseSave
//!   ├──load──▶ PauseLoad
//!   └──settings──▶ PauseSettings
//! ```
//!
//! 返回键（Escape）在子画面回到上一级，在 Main 退出游戏，在 Pause 继续游戏。
//! 菜单只产生 [`MenuOutcome`]，开始游戏、存读档等动作由引擎执行。

mod volume;

pub use volume::{DEFAULT_VOLUME, Volumes, channel_of};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::{AudioCommand, AudioQueue};
use crate::frame::{BackdropView, ButtonView, MenuView, SliderView, SlotView};
use crate::input::InputEvent;
use crate::layout::{Rect, ScreenSize};
use crate::resources::ResourceCache;
use crate::save::SaveRecord;
use crate::story::{
    MainMenuAction, MainMenuConfig, MenuSlider, PauseAction, PauseMenuConfig, Rgba,
    SaveLoadScreenConfig,
};

/// 键盘调节滑块的步长
pub const SLIDER_STEP: f32 = 0.1;

/// 菜单画面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuScreen {
    Main,
    MainSettings,
    /// 从主菜单"继续游戏"进入的读档画面
    MainLoad,
    Pause,
    PauseSave,
    PauseLoad,
    PauseSettings,
}

impl MenuScreen {
    pub fn is_pause(self) -> bool {
        matches!(
            self,
            MenuScreen::Pause | MenuScreen::PauseSave | MenuScreen::PauseLoad | MenuScreen::PauseSettings
        )
    }

    fn is_slot_screen(self) -> bool {
        matches!(
            self,
            MenuScreen::MainLoad | MenuScreen::PauseSave | MenuScreen::PauseLoad
        )
    }
}

/// 菜单交互的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    /// 菜单内部处理完毕
    None,
    StartGame,
    Resume,
    SaveToSlot(u32),
    LoadSlot(u32),
    ReturnToMainMenu,
    Exit,
}

/// 当前画面上可交互的元素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    MainButton(usize),
    PauseButton(usize),
    Slider(usize),
    Slot(u32),
    PrevPage,
    NextPage,
    Back,
}

/// 菜单控制器
#[derive(Debug)]
pub struct MenuController {
    main: MainMenuConfig,
    pause: PauseMenuConfig,
    screen_size: ScreenSize,
    current: Option<MenuScreen>,
    focus: usize,
    page: u32,
    slots: BTreeMap<u32, SaveRecord>,
    volumes: Volumes,
    audio: AudioQueue,
    fade_elapsed: f32,
}

impl MenuController {
    pub fn new(
        main: MainMenuConfig,
        pause: PauseMenuConfig,
        screen_size: ScreenSize,
        volumes: Volumes,
    ) -> Self {
        Self {
            main,
            pause,
            screen_size,
            current: None,
            focus: 0,
            page: 0,
            slots: BTreeMap::new(),
            volumes,
            audio: AudioQueue::new(),
            fade_elapsed: 0.0,
        }
    }

    // ========== 打开 / 关闭 ==========

    /// 打开主菜单
    pub fn open_main(&mut self) {
        self.fade_elapsed = 0.0;
        self.enter(MenuScreen::Main);
        if let Some(music) = &self.main.sounds.background_music {
            self.audio.push(AudioCommand::PlayMusic {
                path: music.clone(),
                looping: true,
            });
        }
    }

    /// 打开暂停菜单
    pub fn open_pause(&mut self) {
        self.fade_elapsed = 0.0;
        self.enter(MenuScreen::Pause);
        self.play(self.pause.open_sound.clone());
    }

    /// 关闭菜单
    pub fn close(&mut self) {
        if self.current.is_some_and(MenuScreen::is_pause) {
            self.play(self.pause.close_sound.clone());
        }
        self.current = None;
        self.focus = 0;
    }

    fn enter(&mut self, screen: MenuScreen) {
        debug!(screen = ?screen, "切换菜单画面");
        if screen.is_slot_screen() && !self.current.is_some_and(MenuScreen::is_slot_screen) {
            self.page = 0;
        }
        self.current = Some(screen);
        self.focus = 0;
    }

    // ========== 存档列表 ==========

    /// 刷新存档格显示的记录
    pub fn set_slots(&mut self, records: Vec<SaveRecord>) {
        self.slots = records.into_iter().map(|r| (r.slot, r)).collect();
    }

    pub fn has_any_save(&self) -> bool {
        !self.slots.is_empty()
    }

    // ========== 输入 ==========

    /// 处理一个输入事件
    pub fn handle(&mut self, event: &InputEvent) -> MenuOutcome {
        let Some(screen) = self.current else {
            return MenuOutcome::None;
        };
        let items = self.items();
        match event {
            InputEvent::Back => self.back(),
            InputEvent::Up => {
                self.move_focus(&items, -1);
                MenuOutcome::None
            }
            InputEvent::Down => {
                self.move_focus(&items, 1);
                MenuOutcome::None
            }
            InputEvent::Left | InputEvent::Right => {
                let delta = if matches!(event, InputEvent::Left) { -1 } else { 1 };
                match items.get(self.focus) {
                    Some((MenuItem::Slider(i), _)) => {
                        let index = *i;
                        self.nudge_slider(index, delta as f32 * SLIDER_STEP);
                    }
                    _ if screen.is_slot_screen() => self.turn_page(delta),
                    _ => {}
                }
                MenuOutcome::None
            }
            InputEvent::Confirm => match items.get(self.focus) {
                Some((item, _)) => self.activate(*item),
                None => MenuOutcome::None,
            },
            InputEvent::PointerMoved { x, y } => {
                if let Some(index) = items.iter().position(|(_, r)| r.contains(*x, *y)) {
                    if index != self.focus {
                        self.focus = index;
                        self.play(self.hover_sound());
                    }
                }
                MenuOutcome::None
            }
            InputEvent::PointerPressed { x, y } => {
                let Some(index) = items.iter().position(|(_, r)| r.contains(*x, *y)) else {
                    return MenuOutcome::None;
                };
                self.focus = index;
                match items[index].0 {
                    MenuItem::Slider(i) => {
                        self.drag_slider(i, *x);
                        MenuOutcome::None
                    }
                    item => self.activate(item),
                }
            }
            _ => MenuOutcome::None,
        }
    }

    /// 推进淡入淡出
    pub fn update(&mut self, dt: f32) {
        if self.current.is_some() {
            self.fade_elapsed += dt.max(0.0);
        }
    }

    fn back(&mut self) -> MenuOutcome {
        let Some(screen) = self.current else {
            return MenuOutcome::None;
        };
        match screen {
            MenuScreen::Main => MenuOutcome::Exit,
            MenuScreen::MainSettings | MenuScreen::MainLoad => {
                self.play(self.main.sounds.back_sound.clone());
                self.enter(MenuScreen::Main);
                MenuOutcome::None
            }
            MenuScreen::Pause => MenuOutcome::Resume,
            MenuScreen::PauseSave | MenuScreen::PauseLoad | MenuScreen::PauseSettings => {
                self.enter(MenuScreen::Pause);
                MenuOutcome::None
            }
        }
    }

    fn activate(&mut self, item: MenuItem) -> MenuOutcome {
        self.play(self.click_sound());
        match item {
            MenuItem::MainButton(i) => {
                let Some(action) = self.main.buttons.get(i).map(|b| b.action) else {
                    return MenuOutcome::None;
                };
                match action {
                    MainMenuAction::Start => MenuOutcome::StartGame,
                    MainMenuAction::Continue if self.has_any_save() => {
                        self.enter(MenuScreen::MainLoad);
                        MenuOutcome::None
                    }
                    MainMenuAction::Continue => MenuOutcome::StartGame,
                    MainMenuAction::Settings => {
                        self.enter(MenuScreen::MainSettings);
                        MenuOutcome::None
                    }
                    MainMenuAction::Exit => MenuOutcome::Exit,
                    MainMenuAction::Back => self.back(),
                    MainMenuAction::Unknown => MenuOutcome::None,
                }
            }
            MenuItem::PauseButton(i) => {
                let Some(action) = self.pause.buttons.get(i).map(|b| b.action) else {
                    return MenuOutcome::None;
                };
                match action {
                    PauseAction::Resume | PauseAction::Back => MenuOutcome::Resume,
                    PauseAction::Save => {
                        self.enter(MenuScreen::PauseSave);
                        MenuOutcome::None
                    }
                    PauseAction::Load => {
                        self.enter(MenuScreen::PauseLoad);
                        MenuOutcome::None
                    }
                    PauseAction::Settings => {
                        self.enter(MenuScreen::PauseSettings);
                        MenuOutcome::None
                    }
                    PauseAction::MainMenu => MenuOutcome::ReturnToMainMenu,
                    PauseAction::Exit => MenuOutcome::Exit,
                    PauseAction::Unknown => MenuOutcome::None,
                }
            }
            MenuItem::Slider(_) => MenuOutcome::None,
            MenuItem::Slot(index) => {
                let slot = self.slot_number(index);
                match self.current {
                    Some(MenuScreen::PauseSave) => MenuOutcome::SaveToSlot(slot),
                    _ if self.slots.contains_key(&slot) => MenuOutcome::LoadSlot(slot),
                    _ => MenuOutcome::None,
                }
            }
            MenuItem::PrevPage => {
                self.turn_page(-1);
                MenuOutcome::None
            }
            MenuItem::NextPage => {
                self.turn_page(1);
                MenuOutcome::None
            }
            MenuItem::Back => self.back(),
        }
    }

    fn move_focus(&mut self, items: &[(MenuItem, Rect)], delta: isize) {
        if items.is_empty() {
            return;
        }
        let count = items.len() as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(count) as usize;
        self.play(self.hover_sound());
    }

    fn turn_page(&mut self, delta: i32) {
        let total = self.slot_config().total_pages.max(1);
        let page = (self.page as i64 + i64::from(delta)).rem_euclid(i64::from(total));
        self.page = page as u32;
    }

    fn nudge_slider(&mut self, index: usize, delta: f32) {
        let Some(channel) = self.sliders().get(index).and_then(|s| channel_of(s.setting)) else {
            return;
        };
        let value = self.volumes.get(channel) + delta;
        let command = self.volumes.set(channel, value);
        self.audio.push(command);
    }

    fn drag_slider(&mut self, index: usize, px: f32) {
        let Some(slider) = self.sliders().get(index) else {
            return;
        };
        let Some(channel) = channel_of(slider.setting) else {
            return;
        };
        let value = slider.value_at(self.screen_size, px);
        let command = self.volumes.set(channel, value);
        self.audio.push(command);
    }

    // ========== 布局 ==========

    fn slot_config(&self) -> &SaveLoadScreenConfig {
        &self.pause.save_load_screen
    }

    fn slot_number(&self, index_in_page: u32) -> u32 {
        self.page * self.slot_config().slots_per_page + index_in_page + 1
    }

    fn sliders(&self) -> &[MenuSlider] {
        match self.current {
            Some(MenuScreen::MainSettings) => &self.main.sliders,
            Some(MenuScreen::PauseSettings) => &self.pause.settings_sliders,
            _ => &[],
        }
    }

    fn items(&self) -> Vec<(MenuItem, Rect)> {
        let s = self.screen_size;
        let Some(screen) = self.current else {
            return Vec::new();
        };
        let sliders = |back: Rect| -> Vec<(MenuItem, Rect)> {
            self.sliders()
                .iter()
                .enumerate()
                .map(|(i, slider)| (MenuItem::Slider(i), slider.rect(s)))
                .chain(std::iter::once((MenuItem::Back, back)))
                .collect()
        };
        match screen {
            MenuScreen::Main => self
                .main
                .buttons
                .iter()
                .enumerate()
                .filter(|(_, b)| b.visible)
                .map(|(i, b)| (MenuItem::MainButton(i), b.rect(s)))
                .collect(),
            MenuScreen::MainSettings => sliders(self.main.back_button.rect(s)),
            MenuScreen::Pause => self
                .pause
                .buttons
                .iter()
                .enumerate()
                .filter(|(_, b)| b.visible)
                .map(|(i, b)| (MenuItem::PauseButton(i), b.rect(s)))
                .collect(),
            MenuScreen::PauseSettings => sliders(self.pause.settings_back_button.rect(s)),
            MenuScreen::MainLoad | MenuScreen::PauseSave | MenuScreen::PauseLoad => {
                let config = self.slot_config();
                (0..config.slots_per_page)
                    .map(|i| (MenuItem::Slot(i), config.slot_rect(s, i)))
                    .chain([
                        (MenuItem::PrevPage, config.prev_page_rect(s)),
                        (MenuItem::NextPage, config.next_page_rect(s)),
                        (MenuItem::Back, config.back_button.rect(s)),
                    ])
                    .collect()
            }
        }
    }

    // ========== 音效 ==========

    fn play(&mut self, sound: Option<std::path::PathBuf>) {
        if let Some(path) = sound {
            self.audio.push(AudioCommand::PlaySound { path });
        }
    }

    fn hover_sound(&self) -> Option<std::path::PathBuf> {
        match self.current {
            Some(s) if s.is_pause() => self.pause.hover_sound.clone(),
            _ => self.main.sounds.hover_sound.clone(),
        }
    }

    fn click_sound(&self) -> Option<std::path::PathBuf> {
        match self.current {
            Some(s) if s.is_pause() => self.pause.click_sound.clone(),
            _ => self.main.sounds.click_sound.clone(),
        }
    }

    // ========== 查询 ==========

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn screen(&self) -> Option<MenuScreen> {
        self.current
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn volumes(&self) -> Volumes {
        self.volumes
    }

    pub fn main_enabled(&self) -> bool {
        self.main.enabled
    }

    pub fn pause_enabled(&self) -> bool {
        self.pause.enabled
    }

    /// 取出菜单产生的音频指令
    pub fn take_audio(&mut self) -> Vec<AudioCommand> {
        self.audio.drain()
    }

    /// 当前菜单画面
    pub fn view(&self, res: &mut ResourceCache) -> Option<MenuView> {
        let screen = self.current?;
        let s = self.screen_size;
        let items = self.items();

        let mut buttons = Vec::new();
        let mut sliders = Vec::new();
        let mut slots = Vec::new();
        for (index, (item, rect)) in items.iter().enumerate() {
            let focused = index == self.focus;
            let button = |id: &str, text: &str| ButtonView {
                id: id.to_string(),
                text: text.to_string(),
                rect: *rect,
                focused,
            };
            match *item {
                MenuItem::MainButton(i) => {
                    if let Some(b) = self.main.buttons.get(i) {
                        buttons.push(button(b.id.as_str(), b.text.as_str()));
                    }
                }
                MenuItem::PauseButton(i) => {
                    if let Some(b) = self.pause.buttons.get(i) {
                        buttons.push(button(b.id.as_str(), b.text.as_str()));
                    }
                }
                MenuItem::Back => {
                    let (id, text) = match screen {
                        MenuScreen::MainSettings => {
                            (&self.main.back_button.id, &self.main.back_button.text)
                        }
                        MenuScreen::PauseSettings => (
                            &self.pause.settings_back_button.id,
                            &self.pause.settings_back_button.text,
                        ),
                        _ => (
                            &self.slot_config().back_button.id,
                            &self.slot_config().back_button.text,
                        ),
                    };
                    buttons.push(button(id.as_str(), text.as_str()));
                }
                MenuItem::PrevPage => buttons.push(button("btn_prev_page", "上一页")),
                MenuItem::NextPage => buttons.push(button("btn_next_page", "下一页")),
                MenuItem::Slider(i) => {
                    if let Some(slider) = self.sliders().get(i) {
                        let value = channel_of(slider.setting)
                            .map_or(slider.value, |c| self.volumes.get(c));
                        sliders.push(SliderView {
                            id: slider.id.clone(),
                            label: slider.label.clone(),
                            rect: *rect,
                            value,
                        });
                    }
                }
                MenuItem::Slot(i) => {
                    let slot = self.slot_number(i);
                    let record = self.slots.get(&slot);
                    slots.push(SlotView {
                        slot,
                        rect: *rect,
                        scene_name: record.map(|r| r.scene_name.clone()),
                        timestamp: record.map(|r| r.timestamp.clone()),
                        play_time: record.map(SaveRecord::format_play_time),
                    });
                }
            }
        }

        let (backdrop, logo, opacity, panel) = if screen.is_pause() {
            let fade = progress(self.fade_elapsed, self.pause.fade_duration);
            let panel = Rect::from_normalized_center(
                s,
                self.pause.panel_x,
                self.pause.panel_y,
                self.pause.panel_width as f32,
                self.pause.panel_height as f32,
            );
            let opacity = f32::from(self.pause.overlay_alpha) / 255.0 * fade;
            (None, None, opacity, Some(panel))
        } else {
            let backdrop = match self.main.background.as_deref().and_then(|p| res.image(p)) {
                Some(info) => BackdropView::Image {
                    path: info.path.clone(),
                    width: info.width,
                    height: info.height,
                },
                None => match self.main.background_color {
                    Some(rgb) => BackdropView::Color {
                        color: Rgba::from_triplet(rgb),
                    },
                    None => BackdropView::Gradient,
                },
            };
            let logo = self
                .main
                .logo
                .image_path
                .as_deref()
                .and_then(|p| res.image(p))
                .map(|info| info.path.clone());
            let opacity = progress(self.fade_elapsed, self.main.fade_in_duration);
            (Some(backdrop), logo, opacity, None)
        };

        Some(MenuView {
            screen,
            backdrop,
            logo,
            opacity,
            panel,
            buttons,
            sliders,
            slots,
            page: screen
                .is_slot_screen()
                .then(|| (self.page + 1, self.slot_config().total_pages)),
        })
    }
}

fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration > 0.0 {
        (elapsed / duration).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::AudioChannel;
    use crate::resources::MemoryLoader;
    use crate::save::{SaveRecord, SaveRequest};
    use std::path::PathBuf;

    fn controller() -> MenuController {
        MenuController::new(
            MainMenuConfig::default(),
            PauseMenuConfig::default(),
            ScreenSize::default(),
            Volumes::default(),
        )
    }

    fn record(slot: u32) -> SaveRecord {
        SaveRecord::from_request(
            &SaveRequest {
                slot,
                scene_id: "s".to_string(),
                scene_name: "序章".to_string(),
                dialog_index: 0,
                play_time: 61.0,
                game_state: Default::default(),
            },
            "2024-01-01 12:00",
        )
    }

    fn center(rect: Rect) -> (f32, f32) {
        (rect.x + rect.w / 2.0, rect.y + rect.h / 2.0)
    }

    #[test]
    fn test_main_menu_keyboard() {
        let mut menu = controller();
        menu.open_main();
        assert_eq!(menu.handle(&InputEvent::Confirm), MenuOutcome::StartGame);

        // 上移循环到最后一个按钮（退出）
        menu.handle(&InputEvent::Up);
        assert_eq!(menu.handle(&InputEvent::Confirm), MenuOutcome::Exit);
    }

    #[test]
    fn test_continue_without_saves_starts_game() {
        let mut menu = controller();
        menu.open_main();
        menu.handle(&InputEvent::Down);
        assert_eq!(menu.handle(&InputEvent::Confirm), MenuOutcome::StartGame);
    }

    #[test]
    fn test_continue_opens_load_screen() {
        let mut menu = controller();
        menu.set_slots(vec![record(2)]);
        menu.open_main();
        menu.handle(&InputEvent::Down);
        assert_eq!(menu.handle(&InputEvent::Confirm), MenuOutcome::None);
        assert_eq!(menu.screen(), Some(MenuScreen::MainLoad));

        // 空槽位不可读取
        assert_eq!(menu.handle(&InputEvent::Confirm), MenuOutcome::None);
        menu.handle(&InputEvent::Down);
        assert_eq!(menu.handle(&InputEvent::Confirm), MenuOutcome::LoadSlot(2));

        assert_eq!(menu.handle(&InputEvent::Back), MenuOutcome::None);
        assert_eq!(menu.screen(), Some(MenuScreen::Main));
        assert_eq!(menu.handle(&InputEvent::Back), MenuOutcome::Exit);
    }

    #[test]
    fn test_pointer_click_button() {
        let mut menu = controller();
        menu.open_main();
        let settings = MainMenuConfig::default().buttons[2].rect(ScreenSize::default());
        let (x, y) = center(settings);
        menu.handle(&InputEvent::pointer_moved(x, y));
        assert_eq!(menu.handle(&InputEvent::pointer_pressed(x, y)), MenuOutcome::None);
        assert_eq!(menu.screen(), Some(MenuScreen::MainSettings));
    }

    #[test]
    fn test_settings_slider() {
        let mut menu = controller();
        menu.open_main();
        menu.enter(MenuScreen::MainSettings);
        menu.take_audio();

        // 第一个滑块是音乐音量
        menu.handle(&InputEvent::Left);
        assert!((menu.volumes().music - 0.7).abs() < 1e-6);

        let slider = MainMenuConfig::default().sliders[1].rect(ScreenSize::default());
        menu.handle(&InputEvent::pointer_pressed(slider.x + slider.w * 0.25, slider.y + 1.0));
        assert_eq!(menu.volumes().sound, 0.25);

        let audio = menu.take_audio();
        assert_eq!(
            audio.last(),
            Some(&AudioCommand::SetVolume {
                channel: AudioChannel::Sound,
                volume: 0.25
            })
        );
    }

    #[test]
    fn test_pause_menu_flow() {
        let mut menu = controller();
        menu.open_pause();
        assert_eq!(menu.handle(&InputEvent::Back), MenuOutcome::Resume);

        menu.handle(&InputEvent::Down);
        assert_eq!(menu.handle(&InputEvent::Confirm), MenuOutcome::None);
        assert_eq!(menu.screen(), Some(MenuScreen::PauseSave));

        menu.handle(&InputEvent::Right);
        assert_eq!(menu.page(), 1);
        assert_eq!(menu.handle(&InputEvent::Confirm), MenuOutcome::SaveToSlot(5));

        assert_eq!(menu.handle(&InputEvent::Back), MenuOutcome::None);
        assert_eq!(menu.screen(), Some(MenuScreen::Pause));
    }

    #[test]
    fn test_page_wraps() {
        let mut menu = controller();
        menu.open_pause();
        menu.enter(MenuScreen::PauseLoad);
        menu.handle(&InputEvent::Left);
        assert_eq!(menu.page(), 4);
        menu.handle(&InputEvent::Right);
        assert_eq!(menu.page(), 0);
    }

    #[test]
    fn test_menu_sounds() {
        let mut pause = PauseMenuConfig::default();
        pause.open_sound = Some(PathBuf::from("open.ogg"));
        pause.close_sound = Some(PathBuf::from("close.ogg"));
        let mut menu = MenuController::new(
            MainMenuConfig::default(),
            pause,
            ScreenSize::default(),
            Volumes::default(),
        );
        menu.open_pause();
        menu.close();
        assert_eq!(
            menu.take_audio(),
            vec![
                AudioCommand::PlaySound {
                    path: PathBuf::from("open.ogg")
                },
                AudioCommand::PlaySound {
                    path: PathBuf::from("close.ogg")
                },
            ]
        );
        assert!(!menu.is_open());
    }

    #[test]
    fn test_view() {
        let mut res = ResourceCache::new(Box::new(MemoryLoader::new()));
        let mut menu = controller();
        assert!(menu.view(&mut res).is_none());

        menu.set_slots(vec![record(1)]);
        menu.open_pause();
        menu.update(0.1);
        let view = menu.view(&mut res).unwrap();
        assert_eq!(view.buttons.len(), 6);
        assert!(view.buttons[0].focused);
        assert!((view.opacity - 180.0 / 255.0 * 0.5).abs() < 1e-4);

        menu.enter(MenuScreen::PauseLoad);
        let view = menu.view(&mut res).unwrap();
        assert_eq!(view.slots.len(), 4);
        assert_eq!(view.slots[0].scene_name.as_deref(), Some("序章"));
        assert_eq!(view.slots[0].play_time.as_deref(), Some("00:01:01"));
        assert_eq!(view.slots[1].scene_name, None);
        assert_eq!(view.page, Some((1, 5)));
    }
}
