//! # Choice 模块
//!
//! 选项菜单：展示选项、键盘与指针选择，返回目标场景 id。
//!
//! 选项按纵向列表居中排列，每项 500×50 像素，间隔 10 像素，互不重叠。

use crate::layout::{Rect, ScreenSize};
use crate::story::Choice;

/// 选项宽度（像素）
pub const CHOICE_WIDTH: f32 = 500.0;
/// 选项高度（像素）
pub const CHOICE_HEIGHT: f32 = 50.0;
/// 选项间距（像素）
pub const CHOICE_SPACING: f32 = 10.0;

/// 选项解析器
#[derive(Debug, Clone)]
pub struct ChoiceResolver {
    choices: Vec<Choice>,
    selected: usize,
    screen: ScreenSize,
}

impl ChoiceResolver {
    pub fn new(screen: ScreenSize) -> Self {
        Self {
            choices: Vec::new(),
            selected: 0,
            screen,
        }
    }

    /// 展示一组选项，选中项重置为第一个
    pub fn present(&mut self, choices: &[Choice]) {
        self.choices = choices.to_vec();
        self.selected = 0;
    }

    pub fn clear(&mut self) {
        self.choices.clear();
        self.selected = 0;
    }

    pub fn is_active(&self) -> bool {
        !self.choices.is_empty()
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// 按索引选择，越界返回 `None`
    pub fn select(&self, index: usize) -> Option<&str> {
        self.choices.get(index).map(|c| c.next_scene_id.as_str())
    }

    /// 按屏幕坐标选择
    pub fn select_at(&self, x: f32, y: f32) -> Option<&str> {
        self.index_at(x, y).and_then(|i| self.select(i))
    }

    /// 确认当前选中项
    pub fn confirm(&self) -> Option<&str> {
        self.select(self.selected)
    }

    /// 指针移动时更新选中项
    pub fn hover(&mut self, x: f32, y: f32) {
        if let Some(index) = self.index_at(x, y) {
            self.selected = index;
        }
    }

    /// 上下移动选中项，首尾循环
    pub fn move_selection(&mut self, delta: isize) {
        let count = self.choices.len();
        if count == 0 {
            return;
        }
        let count = count as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(count) as usize;
    }

    /// 第 `index` 个选项的矩形
    pub fn rect(&self, index: usize) -> Rect {
        let count = self.choices.len() as f32;
        let total_height = count * (CHOICE_HEIGHT + CHOICE_SPACING);
        let start_y = ((self.screen.height_f() - total_height) / 2.0).floor();
        let x = ((self.screen.width_f() - CHOICE_WIDTH) / 2.0).floor();
        let y = start_y + index as f32 * (CHOICE_HEIGHT + CHOICE_SPACING);
        Rect::new(x, y, CHOICE_WIDTH, CHOICE_HEIGHT)
    }

    pub fn rects(&self) -> Vec<Rect> {
        (0..self.choices.len()).map(|i| self.rect(i)).collect()
    }

    fn index_at(&self, x: f32, y: f32) -> Option<usize> {
        (0..self.choices.len()).find(|&i| self.rect(i).contains(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ChoiceResolver {
        let mut r = ChoiceResolver::new(ScreenSize::new(1280, 720));
        r.present(&[
            Choice::new("Go left", "scene_L"),
            Choice::new("Go right", "scene_R"),
        ]);
        r
    }

    #[test]
    fn test_select_by_index() {
        let r = resolver();
        assert_eq!(r.select(1), Some("scene_R"));
        assert_eq!(r.select(2), None);
    }

    #[test]
    fn test_layout_is_centered_and_disjoint() {
        let r = resolver();
        let rects = r.rects();
        assert_eq!(rects[0], Rect::new(390.0, 300.0, 500.0, 50.0));
        assert_eq!(rects[1].y, 360.0);
        assert!(!rects[0].overlaps(&rects[1]));
    }

    #[test]
    fn test_pointer_selection() {
        let mut r = resolver();
        assert_eq!(r.select_at(640.0, 380.0), Some("scene_R"));
        // 间隔区域不命中
        assert_eq!(r.select_at(640.0, 355.0), None);

        r.hover(640.0, 380.0);
        assert_eq!(r.selected(), 1);
        r.hover(0.0, 0.0);
        assert_eq!(r.selected(), 1);
    }

    #[test]
    fn test_keyboard_wraps() {
        let mut r = resolver();
        r.move_selection(-1);
        assert_eq!(r.selected(), 1);
        r.move_selection(1);
        assert_eq!(r.selected(), 0);
        assert_eq!(r.confirm(), Some("scene_L"));
    }

    #[test]
    fn test_inactive_without_choices() {
        let mut r = ChoiceResolver::new(ScreenSize::default());
        assert!(!r.is_active());
        r.move_selection(1);
        assert_eq!(r.confirm(), None);
    }
}
