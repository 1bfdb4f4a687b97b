//! # Input 模块
//!
//! 定义宿主每帧传给运行时的输入采样。
//!
//! ## 设计说明
//!
//! - 运行时不直接读取键盘鼠标，只处理语义化的 [`InputEvent`]
//! - 按住型状态（如按住 Ctrl 快进）在每帧开始时采样一次，放在 [`InputSnapshot`] 中
//! - 一帧内先处理全部输入，再推进状态

use serde::{Deserialize, Serialize};

/// 输入事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// 确认 / 推进（空格、回车）
    Confirm,
    Up,
    Down,
    Left,
    Right,
    /// 返回 / 暂停（Escape）
    Back,
    /// 切换快进模式
    ToggleSkip,
    /// 直接选择第 `index` 个选项
    SelectChoice { index: usize },
    /// 指针移动（屏幕像素坐标）
    PointerMoved { x: f32, y: f32 },
    /// 指针按下
    PointerPressed { x: f32, y: f32 },
    /// 指针抬起
    PointerReleased { x: f32, y: f32 },
    /// 调试：跳转到指定场景
    JumpToScene { scene_id: String },
    /// 关闭窗口
    Quit,
}

impl InputEvent {
    pub fn pointer_pressed(x: f32, y: f32) -> Self {
        Self::PointerPressed { x, y }
    }

    pub fn pointer_moved(x: f32, y: f32) -> Self {
        Self::PointerMoved { x, y }
    }

    pub fn jump(scene_id: impl Into<String>) -> Self {
        Self::JumpToScene {
            scene_id: scene_id.into(),
        }
    }
}

/// 单帧输入采样
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// 本帧发生的事件，按发生顺序排列
    pub events: Vec<InputEvent>,
    /// 快进修饰键是否按住
    pub skip_held: bool,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只含一个事件的采样
    pub fn single(event: InputEvent) -> Self {
        Self {
            events: vec![event],
            skip_held: false,
        }
    }

    pub fn with_event(mut self, event: InputEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_skip_held(mut self, held: bool) -> Self {
        self.skip_held = held;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && !self.skip_held
    }
}
