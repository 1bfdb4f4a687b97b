//! # Scene 模块
//!
//! 场景控制器：顶层状态机。
//!
//! ## 状态
//!
//! ```text
//! Dialog ──对话结束且有选项──▶ Choice ──选择──▶ (进入目标场景) Dialog
//!    │
//!    ├──对话结束、无选项、有下一场景──▶ (进入下一场景) Dialog
//!    └──对话结束、无选项、无下一场景──▶ End
//! ```
//!
//! 暂停由上层引擎负责：暂停期间不调用 [`SceneController::update`]，
//! 所有计时（打字、等待、动画、叠加层）自然冻结。
//!
//! ## 进入场景的顺序
//!
//! 停止音乐 → 背景 → 自由图片（按层级）→ 文字叠加层（按顺序，启动第一个）
//! → 预置角色 → 播放音乐 → 启动背景动画 → 显示第 0 行（或立即结算空对话场景）。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::animation::{AnimationTarget, KeyframeAnimator, Pose};
use crate::choice::ChoiceResolver;
use crate::command::{AudioCommand, AudioQueue};
use crate::dialog::{DialogExit, DialogSequencer, DialogStep};
use crate::error::RuntimeError;
use crate::input::InputEvent;
use crate::layout::ScreenSize;
use crate::overlay::OverlayQueue;
use crate::resources::{ImageInfo, ResourceCache};
use crate::story::{
    AnimationDef, Character, DialogLine, Rgba, Scene, StagePosition, Story, Transform2D,
};
use crate::typewriter::DEFAULT_CHARS_PER_SECOND;

/// 连续跳过空对话场景的最大次数，防止场景互相引用造成死循环
pub const MAX_SCENE_HOPS: usize = 64;

/// 默认快进间隔
pub const DEFAULT_SKIP_INTERVAL: Duration = Duration::from_millis(50);

/// 场景阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePhase {
    Dialog,
    Choice,
    End,
}

/// 背景
#[derive(Debug, Clone, PartialEq)]
pub enum Backdrop {
    /// 背景图
    Image(Arc<ImageInfo>),
    /// 纯色背景
    Color(Rgba),
    /// 默认渐变背景
    Gradient,
}

/// 角色立绘
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSprite {
    pub character_id: String,
    pub emotion: String,
    /// 立绘加载失败时为 `None`
    pub image: Option<Arc<ImageInfo>>,
    pub transform: Transform2D,
    pub alpha: f32,
}

/// 自由图片
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSprite {
    pub id: String,
    pub image: Option<Arc<ImageInfo>>,
    pub layer: i32,
    pub transform: Transform2D,
    pub alpha: f32,
}

/// 当前场景在屏幕上的内容
#[derive(Debug, Clone)]
pub struct Stage {
    pub backdrop: Backdrop,
    /// 按层级升序排列
    pub images: Vec<ImageSprite>,
    pub actors: Vec<ActorSprite>,
    pub overlays: OverlayQueue,
    pub music: Option<PathBuf>,
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            backdrop: Backdrop::Gradient,
            images: Vec::new(),
            actors: Vec::new(),
            overlays: OverlayQueue::new(),
            music: None,
        }
    }
}

impl Stage {
    pub fn actor(&self, character_id: &str) -> Option<&ActorSprite> {
        self.actors.iter().find(|a| a.character_id == character_id)
    }

    pub fn image(&self, id: &str) -> Option<&ImageSprite> {
        self.images.iter().find(|i| i.id == id)
    }

    fn apply_pose(&mut self, target: &AnimationTarget, pose: Pose) {
        let apply = |transform: &mut Transform2D, alpha: &mut f32| {
            transform.x = pose.x;
            transform.y = pose.y;
            transform.scale = pose.scale;
            transform.rotation = pose.rotation;
            *alpha = pose.alpha.clamp(0.0, 1.0);
        };
        match target {
            AnimationTarget::Actor { id } => {
                if let Some(actor) = self.actors.iter_mut().find(|a| &a.character_id == id) {
                    apply(&mut actor.transform, &mut actor.alpha);
                }
            }
            AnimationTarget::Image { id } => {
                if let Some(image) = self.images.iter_mut().find(|i| &i.id == id) {
                    apply(&mut image.transform, &mut image.alpha);
                }
            }
        }
    }
}

/// 场景控制器参数
#[derive(Debug, Clone, Copy)]
pub struct SceneOptions {
    pub screen: ScreenSize,
    /// 默认打字速度（字符/秒）
    pub text_speed: f32,
    /// 快进时两次推进的最小间隔
    pub skip_interval: Duration,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            screen: ScreenSize::default(),
            text_speed: DEFAULT_CHARS_PER_SECOND,
            skip_interval: DEFAULT_SKIP_INTERVAL,
        }
    }
}

/// 场景控制器
#[derive(Debug)]
pub struct SceneController {
    story: Arc<Story>,
    current: Option<String>,
    phase: ScenePhase,
    dialog: DialogSequencer,
    choices: ChoiceResolver,
    animator: KeyframeAnimator,
    stage: Stage,
    audio: AudioQueue,
    voice_playing: bool,
    skip_toggled: bool,
    skip_timer: f32,
    skip_interval: f32,
}

impl SceneController {
    pub fn new(story: Arc<Story>, options: SceneOptions) -> Self {
        let skip_interval = options.skip_interval.as_secs_f32();
        Self {
            story,
            current: None,
            phase: ScenePhase::Dialog,
            dialog: DialogSequencer::with_text_speed(options.text_speed),
            choices: ChoiceResolver::new(options.screen),
            animator: KeyframeAnimator::new(),
            stage: Stage::default(),
            audio: AudioQueue::new(),
            voice_playing: false,
            skip_toggled: false,
            skip_timer: skip_interval,
            skip_interval,
        }
    }

    // ========== 场景切换 ==========

    /// 进入场景
    ///
    /// 场景不存在时记录警告、保持当前状态并返回错误。
    /// 没有对话的场景会立即结算：有选项进入 Choice，有下一场景继续跳转，否则进入 End。
    pub fn go_to_scene(
        &mut self,
        scene_id: &str,
        res: &mut ResourceCache,
    ) -> Result<(), RuntimeError> {
        self.enter(scene_id, None, res)
    }

    /// 从存档恢复：进入场景并直接停在 `index` 行
    ///
    /// 跳过的行不会重放音效和动画，只补上说话人的立绘；
    /// 音效和动画只对落点行触发。返回实际落到的行号。
    pub fn restore(
        &mut self,
        scene_id: &str,
        index: usize,
        res: &mut ResourceCache,
    ) -> Result<usize, RuntimeError> {
        self.enter(scene_id, Some(index), res)?;
        Ok(self.dialog.index())
    }

    fn enter(
        &mut self,
        scene_id: &str,
        landing: Option<usize>,
        res: &mut ResourceCache,
    ) -> Result<(), RuntimeError> {
        let story = Arc::clone(&self.story);
        let mut target = scene_id.to_string();
        let mut landing = landing;

        for hop in 0..MAX_SCENE_HOPS {
            let Some(scene) = story.scene(&target) else {
                warn!(scene = %target, "场景不存在，保持当前状态");
                if hop == 0 {
                    return Err(RuntimeError::SceneNotFound { scene_id: target });
                }
                return Ok(());
            };

            info!(scene = %scene.id, name = %scene.name, "进入场景");
            self.build_stage(scene, res);

            let step = match landing.take().and_then(|i| self.dialog.jump_to(scene, i)) {
                Some(index) => {
                    for line in &scene.dialogs[..index] {
                        if !line.is_delay_only {
                            self.show_speaker(line, res);
                        }
                    }
                    DialogStep::Entered(index)
                }
                None => self.dialog.enter_scene(scene),
            };

            match step {
                DialogStep::Entered(index) => {
                    self.on_line_entered(scene, index, res);
                    return Ok(());
                }
                DialogStep::Exhausted(exit) if !exit.has_choices => {
                    match &scene.next_scene_id {
                        Some(next) => {
                            debug!(from = %scene.id, to = %next, "空对话场景，直接跳转");
                            target = next.clone();
                        }
                        None => {
                            self.phase = ScenePhase::End;
                            return Ok(());
                        }
                    }
                }
                DialogStep::Exhausted(_) => {
                    self.present_choices(scene);
                    return Ok(());
                }
                DialogStep::Blocked | DialogStep::Revealed => return Ok(()),
            }
        }

        warn!(scene = %target, hops = MAX_SCENE_HOPS, "空对话场景链过长，停止跳转");
        Ok(())
    }

    fn build_stage(&mut self, scene: &Scene, res: &mut ResourceCache) {
        self.audio.push(AudioCommand::StopMusic);
        self.stop_voice();

        self.current = Some(scene.id.clone());
        self.phase = ScenePhase::Dialog;
        self.choices.clear();

        let backdrop = match scene.background.as_deref().and_then(|p| res.image(p)) {
            Some(image) => Backdrop::Image(image),
            None => match scene.background_rgb() {
                Some(color) => Backdrop::Color(color),
                None => Backdrop::Gradient,
            },
        };

        let mut images: Vec<ImageSprite> = scene
            .images_on_screen
            .iter()
            .map(|placement| ImageSprite {
                id: placement.id.clone(),
                image: placement.path.as_deref().and_then(|p| res.image(p)),
                layer: placement.layer,
                transform: placement.transform,
                alpha: 1.0,
            })
            .collect();
        images.sort_by_key(|i| i.layer);

        let mut overlays = OverlayQueue::new();
        overlays.load(&scene.texts_on_screen);

        let mut actors = Vec::new();
        for placement in &scene.characters_on_screen {
            let Some(character) = self.story.character(&placement.id) else {
                warn!(scene = %scene.id, character = %placement.id, "场景引用了不存在的角色");
                continue;
            };
            actors.push(ActorSprite {
                character_id: character.id.clone(),
                emotion: placement.emotion.clone(),
                image: character.image_for(&placement.emotion).and_then(|p| res.image(p)),
                transform: placement.transform(),
                alpha: 1.0,
            });
        }

        let music = scene.music.clone();
        if let Some(path) = &music {
            if res.sound(path).is_some() {
                self.audio.push(AudioCommand::PlayMusic {
                    path: path.clone(),
                    looping: true,
                });
            }
        }

        self.stage = Stage {
            backdrop,
            images,
            actors,
            overlays,
            music,
        };

        self.animator.clear();
        self.add_animations(&scene.background_animations);
        self.animator.start_all();
    }

    /// 注册动画轨道，返回注册了的目标
    fn add_animations(&mut self, defs: &[AnimationDef]) -> Vec<AnimationTarget> {
        let mut targets = Vec::new();
        for def in defs {
            if let Some(target) = def.target() {
                self.animator
                    .add_track(target.clone(), def.keyframes.clone(), def.looping);
                targets.push(target);
            }
        }
        targets
    }

    /// 进入新行的副作用：音效、行动画、说话人立绘
    fn on_line_entered(&mut self, scene: &Scene, index: usize, res: &mut ResourceCache) {
        let Some(line) = scene.dialogs.get(index) else {
            return;
        };
        self.stop_voice();
        if let Some(path) = &line.sound_file {
            if res.sound(path).is_some() {
                self.audio.push(AudioCommand::PlayVoice { path: path.clone() });
                self.voice_playing = true;
            }
        }
        if !line.animations.is_empty() {
            // 只启动本行的轨道，正在播放的背景动画保持进度
            for target in self.add_animations(&line.animations) {
                self.animator.start(&target);
            }
        }
        if !line.is_delay_only {
            self.show_speaker(line, res);
        }
    }

    /// 刷新或创建说话人的立绘
    fn show_speaker(&mut self, line: &DialogLine, res: &mut ResourceCache) {
        let story = Arc::clone(&self.story);
        let Some(character) = line.character_id.as_deref().and_then(|id| story.character(id))
        else {
            return;
        };
        let Some(path) = character.image_for(&line.emotion) else {
            return;
        };

        if let Some(actor) = self
            .stage
            .actors
            .iter_mut()
            .find(|a| a.character_id == character.id)
        {
            if let Some(image) = res.image(path) {
                actor.image = Some(image);
            }
            actor.emotion = line.emotion.clone();
            if let Some(position) = line.position {
                actor.transform = position;
            }
            return;
        }

        // 新立绘只在图片可用时上场
        if let Some(image) = res.image(path) {
            self.stage.actors.push(ActorSprite {
                character_id: character.id.clone(),
                emotion: line.emotion.clone(),
                image: Some(image),
                transform: line
                    .position
                    .unwrap_or_else(|| StagePosition::Center.transform()),
                alpha: 1.0,
            });
        }
    }

    fn present_choices(&mut self, scene: &Scene) {
        self.phase = ScenePhase::Choice;
        self.choices.present(&scene.choices);
        self.skip_toggled = false;
    }

    fn stop_voice(&mut self) {
        if self.voice_playing {
            self.audio.push(AudioCommand::StopVoice);
            self.voice_playing = false;
        }
    }

    fn apply_step(&mut self, scene: &Scene, step: DialogStep, res: &mut ResourceCache) {
        match step {
            DialogStep::Entered(index) => self.on_line_entered(scene, index, res),
            DialogStep::Exhausted(exit) => self.on_exhausted(scene, exit, res),
            DialogStep::Blocked | DialogStep::Revealed => {}
        }
    }

    fn on_exhausted(&mut self, scene: &Scene, exit: DialogExit, res: &mut ResourceCache) {
        if exit.has_choices {
            self.present_choices(scene);
        } else if let Some(next) = &scene.next_scene_id {
            // 目标不存在时已记录警告，停留在当前行
            let _ = self.go_to_scene(next, res);
        } else {
            info!(scene = %scene.id, "故事结束");
            self.phase = ScenePhase::End;
        }
    }

    // ========== 推进 ==========

    /// 玩家请求推进对话
    ///
    /// 不在 Dialog 阶段时返回 `None`。
    pub fn advance(&mut self, res: &mut ResourceCache) -> Option<DialogStep> {
        if self.phase != ScenePhase::Dialog {
            return None;
        }
        let story = Arc::clone(&self.story);
        let scene = self.current.as_deref().and_then(|id| story.scene(id))?;
        let step = self.dialog.advance(scene, self.stage.overlays.is_blocking());
        self.apply_step(scene, step, res);
        Some(step)
    }

    /// 推进一帧
    ///
    /// `skip_held` 为本帧采样的快进修饰键状态。
    pub fn update(&mut self, dt: f32, skip_held: bool, res: &mut ResourceCache) {
        if self.current.is_none() {
            return;
        }
        let dt = dt.max(0.0);

        if self.phase == ScenePhase::Dialog && (skip_held || self.skip_toggled) {
            self.skip_timer += dt;
            if self.skip_timer >= self.skip_interval {
                self.skip_timer = 0.0;
                self.advance(res);
            }
        } else {
            self.skip_timer = self.skip_interval;
        }

        if self.phase == ScenePhase::Dialog {
            let story = Arc::clone(&self.story);
            if let Some(scene) = self.current.as_deref().and_then(|id| story.scene(id)) {
                let blocking = self.stage.overlays.is_blocking();
                if let Some(step) = self.dialog.update(scene, dt, blocking) {
                    self.apply_step(scene, step, res);
                }
            }
        }

        for (target, pose) in self.animator.advance(dt) {
            self.stage.apply_pose(&target, pose);
        }
        self.stage.overlays.update(dt);
    }

    // ========== 选项 ==========

    /// 处理 Choice 阶段的输入，返回事件是否被消费
    pub fn handle_choice_event(&mut self, event: &InputEvent, res: &mut ResourceCache) -> bool {
        if self.phase != ScenePhase::Choice {
            return false;
        }
        let target = match event {
            InputEvent::Up => {
                self.choices.move_selection(-1);
                return true;
            }
            InputEvent::Down => {
                self.choices.move_selection(1);
                return true;
            }
            InputEvent::PointerMoved { x, y } => {
                self.choices.hover(*x, *y);
                return true;
            }
            InputEvent::Confirm => self.choices.confirm(),
            InputEvent::SelectChoice { index } => self.choices.select(*index),
            InputEvent::PointerPressed { x, y } => self.choices.select_at(*x, *y),
            _ => return false,
        };
        if let Some(target) = target.map(str::to_string) {
            self.skip_toggled = false;
            info!(target = %target, "选择了选项");
            let _ = self.go_to_scene(&target, res);
        }
        true
    }

    /// 选择第 `index` 个选项
    pub fn select_choice(
        &mut self,
        index: usize,
        res: &mut ResourceCache,
    ) -> Result<(), RuntimeError> {
        if self.phase != ScenePhase::Choice {
            return Err(RuntimeError::StateMismatch {
                expected: "Choice".to_string(),
                actual: format!("{:?}", self.phase),
            });
        }
        let target = self
            .choices
            .select(index)
            .map(str::to_string)
            .ok_or(RuntimeError::InvalidChoiceIndex {
                index,
                max: self.choices.choices().len(),
            })?;
        self.skip_toggled = false;
        self.go_to_scene(&target, res)
    }

    // ========== 快进 ==========

    /// 切换快进模式，只在 Dialog 阶段生效，返回切换后的状态
    pub fn toggle_skip(&mut self) -> bool {
        if self.phase == ScenePhase::Dialog && self.current.is_some() {
            self.skip_toggled = !self.skip_toggled;
            info!(enabled = self.skip_toggled, "快进模式");
        }
        self.skip_toggled
    }

    pub fn is_skip_toggled(&self) -> bool {
        self.skip_toggled
    }

    /// 本帧快进是否生效
    pub fn is_skipping(&self, skip_held: bool) -> bool {
        self.phase == ScenePhase::Dialog
            && self.current.is_some()
            && (skip_held || self.skip_toggled)
    }

    // ========== 生命周期 ==========

    /// 离开游戏回到主菜单：停止音频并清空舞台
    pub fn return_to_menu(&mut self) {
        self.audio.push(AudioCommand::StopMusic);
        self.stop_voice();
        self.current = None;
        self.phase = ScenePhase::Dialog;
        self.stage = Stage::default();
        self.animator.clear();
        self.choices.clear();
        self.dialog.reset();
        self.skip_toggled = false;
        self.skip_timer = self.skip_interval;
    }

    // ========== 查询 ==========

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    pub fn story(&self) -> &Arc<Story> {
        &self.story
    }

    pub fn current_scene_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.as_deref().and_then(|id| self.story.scene(id))
    }

    pub fn current_line(&self) -> Option<&DialogLine> {
        self.current_scene()
            .and_then(|scene| self.dialog.current_line(scene))
    }

    /// 当前行的说话人（纯等待行没有说话人）
    pub fn speaker(&self) -> Option<&Character> {
        let line = self.current_line()?;
        if line.is_delay_only {
            return None;
        }
        line.character_id
            .as_deref()
            .and_then(|id| self.story.character(id))
    }

    pub fn dialog(&self) -> &DialogSequencer {
        &self.dialog
    }

    pub fn dialog_index(&self) -> usize {
        self.dialog.index()
    }

    pub fn choices(&self) -> &ChoiceResolver {
        &self.choices
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn animator(&self) -> &KeyframeAnimator {
        &self.animator
    }

    /// 取出本帧产生的音频指令
    pub fn take_audio(&mut self) -> Vec<AudioCommand> {
        self.audio.drain()
    }
}
