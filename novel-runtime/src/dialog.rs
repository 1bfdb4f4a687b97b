//! # Dialog 模块
//!
//! 单个场景内的对话推进：等待门限、打字机效果与逐行前进。
//!
//! ## 推进规则
//!
//! 每次 [`DialogSequencer::advance`] 依次检查：
//!
//! 1. 有阻塞中的文字叠加层动画 → 不做任何事
//! 2. 当前行的等待时间未结束 → 不做任何事
//! 3. 文本仍在打字（纯等待行除外）→ 立即显示全文，本次推进到此为止
//! 4. 前进到下一行；已是最后一行时报告对话结束
//!
//! 纯等待行（`is_delay_only`）在等待结束后由 [`DialogSequencer::update`] 自动推进。
//!
//! 进入新行时的副作用（音效、动画、说话人立绘）由场景层根据
//! [`DialogStep::Entered`] 执行，这里只管理时序状态。

use crate::story::{DialogLine, Scene};
use crate::typewriter::Typewriter;

/// 对话结束时的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogExit {
    pub has_choices: bool,
    pub has_next_scene: bool,
    /// 既没有选项也没有下一场景
    pub is_end: bool,
}

impl DialogExit {
    pub fn of(scene: &Scene) -> Self {
        let has_choices = !scene.choices.is_empty();
        let has_next_scene = scene.next_scene_id.is_some();
        Self {
            has_choices,
            has_next_scene,
            is_end: !has_choices && !has_next_scene,
        }
    }
}

/// 一次推进的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogStep {
    /// 被叠加层动画或等待门限挡住
    Blocked,
    /// 跳过了打字效果，行号不变
    Revealed,
    /// 进入了新的一行
    Entered(usize),
    /// 对话已经全部显示完
    Exhausted(DialogExit),
}

/// 对话推进器
#[derive(Debug, Clone)]
pub struct DialogSequencer {
    index: usize,
    typewriter: Typewriter,
    delay: f32,
    delay_elapsed: f32,
    delay_only: bool,
}

impl Default for DialogSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogSequencer {
    pub fn new() -> Self {
        Self::with_text_speed(crate::typewriter::DEFAULT_CHARS_PER_SECOND)
    }

    /// 指定默认打字速度（字符/秒）
    pub fn with_text_speed(chars_per_second: f32) -> Self {
        Self {
            index: 0,
            typewriter: Typewriter::with_default_rate(chars_per_second),
            delay: 0.0,
            delay_elapsed: 0.0,
            delay_only: false,
        }
    }

    /// 进入场景并显示第 0 行
    ///
    /// 场景没有对话时直接返回 [`DialogStep::Exhausted`]。
    pub fn enter_scene(&mut self, scene: &Scene) -> DialogStep {
        self.reset();
        if scene.dialogs.is_empty() {
            return DialogStep::Exhausted(DialogExit::of(scene));
        }
        self.show_line(scene, 0);
        DialogStep::Entered(0)
    }

    /// 显示指定行（只重置时序状态）
    pub fn show_line(&mut self, scene: &Scene, index: usize) {
        let Some(line) = scene.dialogs.get(index) else {
            return;
        };
        self.index = index;
        self.delay = line.delay_seconds();
        self.delay_elapsed = 0.0;
        self.delay_only = line.is_delay_only;
        if line.is_delay_only {
            self.typewriter.set_text("", Some(0.0));
        } else {
            self.typewriter.set_text(line.text.clone(), line.typing_speed);
        }
    }

    /// 直接跳到指定行（读档用），越界时夹到最后一行
    ///
    /// 返回实际落到的行号；场景没有对话时返回 `None`。
    pub fn jump_to(&mut self, scene: &Scene, index: usize) -> Option<usize> {
        let last = scene.dialogs.len().checked_sub(1)?;
        let index = index.min(last);
        self.show_line(scene, index);
        Some(index)
    }

    /// 玩家请求推进
    pub fn advance(&mut self, scene: &Scene, overlay_blocking: bool) -> DialogStep {
        if overlay_blocking || self.is_delay_active() {
            return DialogStep::Blocked;
        }
        if !self.typewriter.is_complete() && !self.delay_only {
            self.typewriter.skip();
            return DialogStep::Revealed;
        }
        let next = self.index + 1;
        if next < scene.dialogs.len() {
            self.show_line(scene, next);
            DialogStep::Entered(next)
        } else {
            DialogStep::Exhausted(DialogExit::of(scene))
        }
    }

    /// 推进时间
    ///
    /// 纯等待行的等待结束时自动推进，并返回推进结果。
    pub fn update(&mut self, scene: &Scene, dt: f32, overlay_blocking: bool) -> Option<DialogStep> {
        let dt = dt.max(0.0);
        self.typewriter.advance(dt);
        if self.delay_elapsed < self.delay {
            self.delay_elapsed += dt;
        }
        if self.delay_only && !self.is_delay_active() {
            return match self.advance(scene, overlay_blocking) {
                DialogStep::Blocked => None,
                step => Some(step),
            };
        }
        None
    }

    /// 等待门限是否生效
    pub fn is_delay_active(&self) -> bool {
        self.delay > 0.0 && self.delay_elapsed < self.delay
    }

    pub fn is_typing(&self) -> bool {
        !self.typewriter.is_complete()
    }

    pub fn is_delay_only(&self) -> bool {
        self.delay_only
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_line<'a>(&self, scene: &'a Scene) -> Option<&'a DialogLine> {
        scene.dialogs.get(self.index)
    }

    pub fn visible_text(&self) -> &str {
        self.typewriter.visible_text()
    }

    /// 回到初始状态
    pub fn reset(&mut self) {
        self.index = 0;
        self.delay = 0.0;
        self.delay_elapsed = 0.0;
        self.delay_only = false;
        self.typewriter.clear();
    }
}
