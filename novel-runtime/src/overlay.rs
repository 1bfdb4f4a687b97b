//! # Overlay 模块
//!
//! 场景文字叠加层的淡入淡出动画。
//!
//! 同一场景的叠加层按 `order` 依次出场：前一个动画结束后才启动下一个。
//! 设置了 `block_skip` 的叠加层在动画完成前会阻止对话推进。

use serde::{Deserialize, Serialize};

use crate::story::{OverlayAnimation, Rgba, TextOverlayDef};

/// 叠加层动画阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPhase {
    /// 等待启动
    Waiting,
    FadeIn,
    Hold,
    FadeOut,
    Complete,
}

/// 运行中的文字叠加层
#[derive(Debug, Clone)]
pub struct TextOverlay {
    def: TextOverlayDef,
    phase: OverlayPhase,
    /// 当前阶段已经过的时间
    phase_elapsed: f32,
    started: bool,
    alpha: f32,
    visible: bool,
}

fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration > 0.0 {
        (elapsed / duration).min(1.0)
    } else {
        1.0
    }
}

impl TextOverlay {
    pub fn new(def: TextOverlayDef) -> Self {
        let immediate = def.animation == OverlayAnimation::None;
        Self {
            def,
            phase: if immediate {
                OverlayPhase::Complete
            } else {
                OverlayPhase::Waiting
            },
            phase_elapsed: 0.0,
            started: immediate,
            alpha: if immediate { 1.0 } else { 0.0 },
            visible: immediate,
        }
    }

    /// 启动动画，已启动或无动画时不做任何事
    pub fn start(&mut self) {
        if self.started || self.def.animation == OverlayAnimation::None {
            return;
        }
        self.started = true;
        self.visible = true;
        self.phase_elapsed = 0.0;
        match self.def.animation {
            OverlayAnimation::FadeIn | OverlayAnimation::FadeInOut => {
                self.alpha = 0.0;
                self.phase = OverlayPhase::FadeIn;
            }
            OverlayAnimation::FadeOut => {
                self.alpha = 1.0;
                self.phase = OverlayPhase::FadeOut;
            }
            OverlayAnimation::None => {}
        }
    }

    /// 推进动画，返回本次是否刚刚完成
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.started || self.is_complete() {
            return false;
        }
        self.phase_elapsed += dt.max(0.0);
        let fade_in = self.def.effective_fade_in();
        let fade_out = self.def.fade_out_duration;

        match (self.def.animation, self.phase) {
            (OverlayAnimation::FadeIn, _) => {
                let p = progress(self.phase_elapsed, fade_in);
                self.alpha = p;
                if p >= 1.0 {
                    self.finish(true);
                }
            }
            (OverlayAnimation::FadeOut, _) => {
                let p = progress(self.phase_elapsed, fade_out);
                self.alpha = 1.0 - p;
                if p >= 1.0 {
                    self.finish(false);
                }
            }
            (OverlayAnimation::FadeInOut, OverlayPhase::FadeIn) => {
                let p = progress(self.phase_elapsed, fade_in);
                self.alpha = p;
                if p >= 1.0 {
                    self.enter(OverlayPhase::Hold);
                }
            }
            (OverlayAnimation::FadeInOut, OverlayPhase::Hold) => {
                if self.phase_elapsed >= self.def.hold_duration {
                    self.enter(OverlayPhase::FadeOut);
                }
            }
            (OverlayAnimation::FadeInOut, OverlayPhase::FadeOut) => {
                let p = progress(self.phase_elapsed, fade_out);
                self.alpha = 1.0 - p;
                if p >= 1.0 {
                    self.finish(false);
                }
            }
            _ => {}
        }
        self.is_complete()
    }

    fn enter(&mut self, phase: OverlayPhase) {
        self.phase = phase;
        self.phase_elapsed = 0.0;
    }

    fn finish(&mut self, visible: bool) {
        self.phase = OverlayPhase::Complete;
        self.visible = visible;
    }

    pub fn is_complete(&self) -> bool {
        self.phase == OverlayPhase::Complete
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// 动画进行中且禁止跳过
    pub fn is_blocking(&self) -> bool {
        self.def.block_skip && !self.is_complete()
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn def(&self) -> &TextOverlayDef {
        &self.def
    }

    pub fn color(&self) -> Rgba {
        Rgba::parse_or_white(&self.def.color)
    }
}

/// 叠加层队列
#[derive(Debug, Clone, Default)]
pub struct OverlayQueue {
    overlays: Vec<TextOverlay>,
}

impl OverlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 替换为新场景的叠加层（按 `order` 稳定排序）并启动第一个
    pub fn load(&mut self, defs: &[TextOverlayDef]) {
        let mut overlays: Vec<TextOverlay> = defs.iter().cloned().map(TextOverlay::new).collect();
        overlays.sort_by_key(|o| o.def.order);
        self.overlays = overlays;
        self.start_next();
    }

    /// 启动第一个尚未启动的动画叠加层
    pub fn start_next(&mut self) -> bool {
        match self.overlays.iter_mut().find(|o| !o.is_started()) {
            Some(overlay) => {
                overlay.start();
                true
            }
            None => false,
        }
    }

    /// 推进所有叠加层，有叠加层完成时启动下一个
    pub fn update(&mut self, dt: f32) {
        let mut any_completed = false;
        for overlay in &mut self.overlays {
            any_completed |= overlay.update(dt);
        }
        if any_completed {
            self.start_next();
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.overlays.iter().any(TextOverlay::is_blocking)
    }

    pub fn clear(&mut self) {
        self.overlays.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextOverlay> {
        self.overlays.iter()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}
