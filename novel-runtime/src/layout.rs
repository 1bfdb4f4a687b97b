//! # Layout 模块
//!
//! 屏幕尺寸与命中测试用的矩形。
//!
//! 剧本中的位置使用 0..1 的归一化坐标，尺寸使用像素；
//! 这里负责把两者换算成屏幕像素矩形。

use serde::{Deserialize, Serialize};

/// 屏幕尺寸（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width_f(&self) -> f32 {
        self.width as f32
    }

    pub fn height_f(&self) -> f32 {
        self.height as f32
    }

    /// 归一化坐标转换为像素坐标
    pub fn to_pixels(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.width_f(), y * self.height_f())
    }
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// 轴对齐矩形（像素）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// 以中心点构造
    pub fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }

    /// 以归一化中心点和像素尺寸构造
    pub fn from_normalized_center(screen: ScreenSize, nx: f32, ny: f32, w: f32, h: f32) -> Self {
        let (cx, cy) = screen.to_pixels(nx, ny);
        Self::centered(cx, cy, w, h)
    }

    /// 点是否落在矩形内（左上闭、右下开）
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// 对话框距屏幕边缘的距离
const DIALOG_MARGIN: f32 = 20.0;
/// 对话框高度
const DIALOG_HEIGHT: f32 = 200.0;

/// 对话框矩形：贴底，左右与底部各留 20 像素
pub fn dialog_box_rect(screen: ScreenSize) -> Rect {
    Rect::new(
        DIALOG_MARGIN,
        screen.height_f() - DIALOG_HEIGHT - DIALOG_MARGIN,
        screen.width_f() - DIALOG_MARGIN * 2.0,
        DIALOG_HEIGHT,
    )
}

/// 对话框右下角的快进按钮
pub fn skip_button_rect(screen: ScreenSize) -> Rect {
    let dialog = dialog_box_rect(screen);
    Rect::new(dialog.x + dialog.w - 100.0, dialog.y + dialog.h - 35.0, 50.0, 24.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_edges() {
        let r = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(109.9, 59.9));
        assert!(!r.contains(110.0, 30.0));
        assert!(!r.contains(50.0, 60.0));
    }

    #[test]
    fn test_normalized_center() {
        let r = Rect::from_normalized_center(ScreenSize::new(1000, 500), 0.5, 0.5, 100.0, 50.0);
        assert_eq!(r, Rect::new(450.0, 225.0, 100.0, 50.0));
    }

    #[test]
    fn test_adjacent_rects_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::new(5.0, 5.0, 10.0, 10.0)));
    }

    #[test]
    fn test_skip_button_inside_dialog_box() {
        let screen = ScreenSize::default();
        let dialog = dialog_box_rect(screen);
        assert_eq!(dialog, Rect::new(20.0, 500.0, 1240.0, 200.0));
        let skip = skip_button_rect(screen);
        assert_eq!(skip, Rect::new(1160.0, 665.0, 50.0, 24.0));
        assert!(dialog.overlaps(&skip));
    }
}
