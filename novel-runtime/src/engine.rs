//! # Engine 模块
//!
//! 引擎顶层：在主菜单、游戏、暂停之间分派输入，并按固定顺序推进一帧。
//!
//! ## 一帧的顺序
//!
//! 1. 处理本帧全部输入事件
//! 2. 推进状态（暂停时只推进菜单）
//! 3. 生成画面描述
//!
//! 音频指令在一帧内累积，由宿主通过 [`NovelEngine::take_audio`] 取出。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::command::{AudioCommand, AudioQueue};
use crate::error::{NovelError, NovelResult, RuntimeError, StoryError};
use crate::frame::Frame;
use crate::input::{InputEvent, InputSnapshot};
use crate::layout::{ScreenSize, skip_button_rect};
use crate::menu::{MenuController, MenuOutcome, Volumes};
use crate::resources::{ResourceCache, ResourceLoader};
use crate::save::{GameState, SaveRequest, SaveStore};
use crate::scene::{DEFAULT_SKIP_INTERVAL, SceneController, SceneOptions, ScenePhase};
use crate::story::Story;
use crate::typewriter::DEFAULT_CHARS_PER_SECOND;

/// 引擎模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// 主菜单（含设置与读档画面）
    MainMenu,
    /// 游戏进行中
    Playing,
    /// 暂停菜单打开，场景时钟冻结
    Paused,
    /// 已退出
    Stopped,
}

/// 引擎参数
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub screen: ScreenSize,
    /// 默认打字速度（字符/秒）
    pub text_speed: f32,
    pub skip_interval: Duration,
    pub volumes: Volumes,
    /// 允许 [`InputEvent::JumpToScene`]
    pub debug_scene_jump: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            screen: ScreenSize::default(),
            text_speed: DEFAULT_CHARS_PER_SECOND,
            skip_interval: DEFAULT_SKIP_INTERVAL,
            volumes: Volumes::default(),
            debug_scene_jump: false,
        }
    }
}

impl EngineOptions {
    pub fn with_screen(mut self, screen: ScreenSize) -> Self {
        self.screen = screen;
        self
    }

    pub fn with_volumes(mut self, volumes: Volumes) -> Self {
        self.volumes = volumes;
        self
    }

    pub fn with_debug_scene_jump(mut self, enabled: bool) -> Self {
        self.debug_scene_jump = enabled;
        self
    }

    fn scene_options(&self) -> SceneOptions {
        SceneOptions {
            screen: self.screen,
            text_speed: self.text_speed,
            skip_interval: self.skip_interval,
        }
    }
}

/// 视觉小说引擎
pub struct NovelEngine {
    story: Arc<Story>,
    options: EngineOptions,
    scene: SceneController,
    menu: MenuController,
    resources: ResourceCache,
    saves: Box<dyn SaveStore>,
    audio: AudioQueue,
    mode: EngineMode,
    /// 打开暂停菜单时的画面，用作存档缩略图
    pause_snapshot: Option<Frame>,
    play_time: f64,
    /// 随存档读写的附加状态
    game_state: GameState,
    skip_held: bool,
}

impl NovelEngine {
    /// 创建引擎并进入初始模式
    ///
    /// 剧本必须已经通过校验；起始场景不存在时返回错误，引擎不会以残缺状态启动。
    pub fn new(
        story: Story,
        loader: Box<dyn ResourceLoader>,
        saves: Box<dyn SaveStore>,
        options: EngineOptions,
    ) -> NovelResult<Self> {
        story.validate()?;
        let story = Arc::new(story);
        let mut engine = Self {
            scene: SceneController::new(Arc::clone(&story), options.scene_options()),
            menu: Self::build_menu(&story, &options),
            story,
            options,
            resources: ResourceCache::new(loader),
            saves,
            audio: AudioQueue::new(),
            mode: EngineMode::Stopped,
            pause_snapshot: None,
            play_time: 0.0,
            game_state: GameState::new(),
            skip_held: false,
        };
        engine.boot()?;
        Ok(engine)
    }

    fn build_menu(story: &Story, options: &EngineOptions) -> MenuController {
        MenuController::new(
            story.main_menu.clone(),
            story.pause_menu.clone(),
            options.screen,
            options.volumes,
        )
    }

    fn boot(&mut self) -> NovelResult<()> {
        info!(
            title = %self.story.title,
            scenes = self.story.scenes.len(),
            characters = self.story.characters.len(),
            "加载剧本"
        );
        for command in self.menu.volumes().commands() {
            self.audio.push(command);
        }
        self.refresh_slots();
        if self.story.main_menu.enabled {
            self.open_main_menu();
            Ok(())
        } else {
            self.start_game()
        }
    }

    /// 替换剧本并重新启动（资源缓存随之清空）
    pub fn reload_story(&mut self, story: Story) -> NovelResult<()> {
        story.validate()?;
        self.scene.return_to_menu();
        for command in self.scene.take_audio() {
            self.audio.push(command);
        }
        self.resources.clear();
        self.story = Arc::new(story);
        self.scene = SceneController::new(Arc::clone(&self.story), self.options.scene_options());
        let volumes = self.menu.volumes();
        self.options.volumes = volumes;
        self.menu = Self::build_menu(&self.story, &self.options);
        self.pause_snapshot = None;
        self.boot()
    }

    // ========== 模式切换 ==========

    fn open_main_menu(&mut self) {
        self.mode = EngineMode::MainMenu;
        self.menu.open_main();
    }

    fn start_game(&mut self) -> NovelResult<()> {
        let start = self.story.start_scene_id.clone();
        info!(scene = %start, "开始游戏");
        self.menu.close();
        self.play_time = 0.0;
        self.game_state.clear();
        self.scene.go_to_scene(&start, &mut self.resources).map_err(|_| {
            NovelError::from(StoryError::UnknownStartScene { scene_id: start })
        })?;
        self.mode = EngineMode::Playing;
        Ok(())
    }

    fn pause(&mut self) {
        self.pause_snapshot = Some(Frame::capture(
            &self.scene,
            self.options.screen,
            false,
        ));
        self.refresh_slots();
        self.menu.open_pause();
        self.mode = EngineMode::Paused;
        debug!("暂停");
    }

    fn resume(&mut self) {
        self.menu.close();
        self.pause_snapshot = None;
        self.mode = EngineMode::Playing;
        debug!("继续游戏");
    }

    fn return_to_main_menu(&mut self) {
        self.scene.return_to_menu();
        self.pause_snapshot = None;
        self.menu.close();
        if self.story.main_menu.enabled {
            info!("返回主菜单");
            self.refresh_slots();
            self.open_main_menu();
        } else {
            self.stop();
        }
    }

    fn stop(&mut self) {
        if self.mode != EngineMode::Stopped {
            info!(play_time = self.play_time, "退出");
        }
        self.mode = EngineMode::Stopped;
    }

    fn refresh_slots(&mut self) {
        self.menu.set_slots(self.saves.list());
    }

    // ========== 存档 ==========

    /// 保存到指定槽位
    pub fn save_to_slot(&mut self, slot: u32) -> NovelResult<()> {
        let scene = self.scene.current_scene().ok_or(RuntimeError::StateMismatch {
            expected: "游戏进行中".to_string(),
            actual: format!("{:?}", self.mode),
        })?;
        let request = SaveRequest {
            slot,
            scene_id: scene.id.clone(),
            scene_name: if scene.name.is_empty() {
                scene.id.clone()
            } else {
                scene.name.clone()
            },
            dialog_index: self.scene.dialog_index(),
            play_time: self.play_time,
            game_state: self.game_state.clone(),
        };
        let snapshot = match &self.pause_snapshot {
            Some(frame) => frame.clone(),
            None => Frame::capture(&self.scene, self.options.screen, false),
        };
        let record = self.saves.save(&request, &snapshot)?;
        info!(slot, scene = %record.scene_id, index = record.dialog_index, "存档保存成功");
        self.refresh_slots();
        Ok(())
    }

    /// 读取指定槽位并继续游戏
    pub fn load_slot(&mut self, slot: u32) -> NovelResult<()> {
        let record = self.saves.load(slot)?;
        let index = self
            .scene
            .restore(&record.scene_id, record.dialog_index, &mut self.resources)?;
        info!(slot, scene = %record.scene_id, index, "存档读取成功");
        self.play_time = record.play_time;
        self.game_state = record.game_state;
        self.pause_snapshot = None;
        self.menu.close();
        self.mode = EngineMode::Playing;
        Ok(())
    }

    // ========== 输入 ==========

    /// 处理一帧的输入
    pub fn handle_input(&mut self, input: &InputSnapshot) {
        self.skip_held = input.skip_held;
        for event in &input.events {
            if self.mode == EngineMode::Stopped {
                break;
            }
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Quit => return self.stop(),
            InputEvent::JumpToScene { scene_id } => return self.debug_jump(scene_id),
            _ => {}
        }
        match self.mode {
            EngineMode::MainMenu | EngineMode::Paused => {
                let outcome = self.menu.handle(event);
                self.apply_menu_outcome(outcome);
            }
            EngineMode::Playing => self.handle_game_event(event),
            EngineMode::Stopped => {}
        }
    }

    fn handle_game_event(&mut self, event: &InputEvent) {
        if *event == InputEvent::Back {
            return self.escape();
        }
        match self.scene.phase() {
            ScenePhase::Dialog => match event {
                InputEvent::Confirm => {
                    self.scene.advance(&mut self.resources);
                }
                InputEvent::ToggleSkip => {
                    self.scene.toggle_skip();
                }
                InputEvent::PointerPressed { x, y } => {
                    if skip_button_rect(self.options.screen).contains(*x, *y) {
                        self.scene.toggle_skip();
                    } else {
                        self.scene.advance(&mut self.resources);
                    }
                }
                _ => {}
            },
            ScenePhase::Choice => {
                self.scene.handle_choice_event(event, &mut self.resources);
            }
            ScenePhase::End => {
                if matches!(
                    event,
                    InputEvent::Confirm | InputEvent::PointerPressed { .. }
                ) {
                    self.return_to_main_menu();
                }
            }
        }
    }

    /// Escape：能暂停就暂停，否则回主菜单，再否则退出
    fn escape(&mut self) {
        let in_story = matches!(self.scene.phase(), ScenePhase::Dialog | ScenePhase::Choice);
        if self.story.pause_menu.enabled && in_story && self.scene.is_active() {
            self.pause();
        } else {
            self.return_to_main_menu();
        }
    }

    fn apply_menu_outcome(&mut self, outcome: MenuOutcome) {
        match outcome {
            MenuOutcome::None => {}
            MenuOutcome::StartGame => {
                if let Err(e) = self.start_game() {
                    warn!(error = %e, "无法开始游戏");
                }
            }
            MenuOutcome::Resume => self.resume(),
            MenuOutcome::SaveToSlot(slot) => {
                if let Err(e) = self.save_to_slot(slot) {
                    warn!(slot, error = %e, "存档保存失败");
                }
            }
            MenuOutcome::LoadSlot(slot) => {
                if let Err(e) = self.load_slot(slot) {
                    warn!(slot, error = %e, "存档读取失败");
                }
            }
            MenuOutcome::ReturnToMainMenu => self.return_to_main_menu(),
            MenuOutcome::Exit => self.stop(),
        }
    }

    fn debug_jump(&mut self, scene_id: &str) {
        if !self.options.debug_scene_jump {
            debug!(scene = %scene_id, "场景跳转未启用，忽略");
            return;
        }
        match self.scene.go_to_scene(scene_id, &mut self.resources) {
            Ok(()) => {
                info!(scene = %scene_id, "调试跳转");
                self.menu.close();
                self.pause_snapshot = None;
                self.mode = EngineMode::Playing;
            }
            Err(e) => warn!(error = %e, "调试跳转失败"),
        }
    }

    // ========== 推进 ==========

    /// 推进一帧的时间
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        match self.mode {
            EngineMode::MainMenu | EngineMode::Paused => self.menu.update(dt),
            EngineMode::Playing => {
                self.scene
                    .update(dt, self.skip_held, &mut self.resources);
                if self.scene.is_active() {
                    self.play_time += f64::from(dt);
                }
            }
            EngineMode::Stopped => {}
        }
    }

    /// 当前画面
    pub fn frame(&mut self) -> Frame {
        let screen = self.options.screen;
        match self.mode {
            EngineMode::MainMenu => {
                let mut frame = Frame::blank(screen);
                frame.menu = self.menu.view(&mut self.resources);
                frame
            }
            EngineMode::Playing => Frame::capture(&self.scene, screen, self.skip_held),
            EngineMode::Paused => {
                let mut frame = match &self.pause_snapshot {
                    Some(snapshot) => snapshot.clone(),
                    None => Frame::capture(&self.scene, screen, false),
                };
                frame.paused = true;
                frame.menu = self.menu.view(&mut self.resources);
                frame
            }
            EngineMode::Stopped => Frame::blank(screen),
        }
    }

    /// 完整的一帧：输入 → 推进 → 画面
    pub fn tick(&mut self, input: &InputSnapshot, dt: f32) -> Frame {
        self.handle_input(input);
        self.update(dt);
        self.frame()
    }

    /// 取出本帧累积的音频指令
    pub fn take_audio(&mut self) -> Vec<AudioCommand> {
        let mut commands = self.audio.drain();
        commands.extend(self.scene.take_audio());
        commands.extend(self.menu.take_audio());
        commands
    }

    // ========== 查询 ==========

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode != EngineMode::Stopped
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn scene(&self) -> &SceneController {
        &self.scene
    }

    pub fn menu(&self) -> &MenuController {
        &self.menu
    }

    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    pub fn saves(&self) -> &dyn SaveStore {
        self.saves.as_ref()
    }

    /// 游戏时长（秒）
    pub fn play_time(&self) -> f64 {
        self.play_time
    }

    /// 随存档保存的附加状态
    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn game_state_mut(&mut self) -> &mut GameState {
        &mut self.game_state
    }
}

impl std::fmt::Debug for NovelEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NovelEngine")
            .field("title", &self.story.title)
            .field("mode", &self.mode)
            .field("scene", &self.scene.current_scene_id())
            .field("play_time", &self.play_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuScreen;
    use crate::resources::MemoryLoader;
    use crate::save::MemorySaveStore;
    use crate::story::{Choice, DialogLine, Scene};

    fn story(main_menu: bool) -> Story {
        let mut story = Story::new(
            Scene::new("intro")
                .with_dialog(DialogLine::narration("第一行"))
                .with_dialog(DialogLine::narration("第二行"))
                .with_dialog(DialogLine::narration("第三行"))
                .with_choice(Choice::new("继续", "ending")),
        )
        .with_scene(Scene::new("ending").with_dialog(DialogLine::narration("完")));
        story.main_menu.enabled = main_menu;
        story
    }

    fn engine(story: Story) -> NovelEngine {
        NovelEngine::new(
            story,
            Box::new(MemoryLoader::new()),
            Box::new(MemorySaveStore::new()),
            EngineOptions::default(),
        )
        .unwrap()
    }

    fn press(engine: &mut NovelEngine, event: InputEvent) {
        engine.tick(&InputSnapshot::single(event), 1.0 / 60.0);
    }

    #[test]
    fn test_starts_in_main_menu() {
        let mut e = engine(story(true));
        assert_eq!(e.mode(), EngineMode::MainMenu);
        let frame = e.frame();
        assert_eq!(frame.menu.unwrap().screen, MenuScreen::Main);

        press(&mut e, InputEvent::Confirm);
        assert_eq!(e.mode(), EngineMode::Playing);
        assert_eq!(e.scene().current_scene_id(), Some("intro"));
    }

    #[test]
    fn test_starts_directly_without_main_menu() {
        let e = engine(story(false));
        assert_eq!(e.mode(), EngineMode::Playing);
    }

    #[test]
    fn test_invalid_story_is_rejected() {
        let mut story = story(false);
        story.start_scene_id = "missing".to_string();
        let result = NovelEngine::new(
            story,
            Box::new(MemoryLoader::new()),
            Box::new(MemorySaveStore::new()),
            EngineOptions::default(),
        );
        assert!(matches!(
            result,
            Err(NovelError::Story(StoryError::UnknownStartScene { .. }))
        ));
    }

    #[test]
    fn test_pause_freezes_scene_clock() {
        let mut e = engine(story(false));
        press(&mut e, InputEvent::Back);
        assert_eq!(e.mode(), EngineMode::Paused);

        let typed = e.scene().dialog().visible_text().to_string();
        let play_time = e.play_time();
        for _ in 0..30 {
            e.tick(&InputSnapshot::new(), 1.0 / 60.0);
        }
        assert_eq!(e.scene().dialog().visible_text(), typed);
        assert_eq!(e.play_time(), play_time);
        assert!(e.frame().paused);

        press(&mut e, InputEvent::Back);
        assert_eq!(e.mode(), EngineMode::Playing);
        assert_eq!(e.scene().phase(), ScenePhase::Dialog);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let mut e = engine(story(false));
        for _ in 0..3 {
            press(&mut e, InputEvent::Confirm);
        }
        assert_eq!(e.scene().dialog_index(), 1);

        e.save_to_slot(3).unwrap();
        let record = e.saves().load(3).unwrap();
        assert_eq!(record.scene_id, "intro");
        assert_eq!(record.dialog_index, 1);

        for _ in 0..3 {
            press(&mut e, InputEvent::Confirm);
        }
        assert_eq!(e.scene().phase(), ScenePhase::Choice);

        e.load_slot(3).unwrap();
        assert_eq!(e.scene().phase(), ScenePhase::Dialog);
        assert_eq!(e.scene().dialog_index(), 1);
        assert!(e.load_slot(9).is_err());
    }

    #[test]
    fn test_game_state_survives_save_and_load() {
        let mut e = engine(story(false));
        e.game_state_mut()
            .insert("affection".to_string(), serde_json::json!(5));
        e.save_to_slot(1).unwrap();

        e.game_state_mut()
            .insert("affection".to_string(), serde_json::json!(0));
        e.load_slot(1).unwrap();
        assert_eq!(e.game_state()["affection"], serde_json::json!(5));
        assert_eq!(e.game_state()["current_scene_id"], serde_json::json!("intro"));
        assert!(e.game_state().contains_key("play_time"));
    }

    #[test]
    fn test_end_returns_to_main_menu() {
        let mut e = engine(story(true));
        press(&mut e, InputEvent::Confirm);
        e.debug_jump("ending");
        // 未启用调试跳转
        assert_eq!(e.scene().current_scene_id(), Some("intro"));

        e.options.debug_scene_jump = true;
        press(&mut e, InputEvent::jump("ending"));
        // 单字行在跳转那一帧就已打完
        press(&mut e, InputEvent::Confirm);
        assert_eq!(e.scene().phase(), ScenePhase::End);
        assert!(e.frame().end_screen);

        press(&mut e, InputEvent::Confirm);
        assert_eq!(e.mode(), EngineMode::MainMenu);
        assert!(!e.scene().is_active());
    }

    #[test]
    fn test_end_without_main_menu_quits() {
        let mut e = engine(story(false));
        e.options.debug_scene_jump = true;
        press(&mut e, InputEvent::jump("ending"));
        press(&mut e, InputEvent::Confirm);
        assert_eq!(e.scene().phase(), ScenePhase::End);
        press(&mut e, InputEvent::Confirm);
        assert!(!e.is_running());
    }

    #[test]
    fn test_skip_button_toggles_skip() {
        let mut e = engine(story(false));
        let button = skip_button_rect(ScreenSize::default());
        press(
            &mut e,
            InputEvent::pointer_pressed(button.x + 1.0, button.y + 1.0),
        );
        assert!(e.scene().is_skip_toggled());
        assert_eq!(e.scene().dialog_index(), 0);
    }

    #[test]
    fn test_initial_volume_commands() {
        let mut e = engine(story(false));
        let audio = e.take_audio();
        assert_eq!(
            audio
                .iter()
                .filter(|c| matches!(c, AudioCommand::SetVolume { .. }))
                .count(),
            3
        );
    }

    #[test]
    fn test_quit() {
        let mut e = engine(story(true));
        press(&mut e, InputEvent::Quit);
        assert_eq!(e.mode(), EngineMode::Stopped);
    }
}
