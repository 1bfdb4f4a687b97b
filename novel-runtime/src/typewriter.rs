//! # Typewriter 模块
//!
//! 打字机效果：按速度逐字显示对话文本。
//!
//! ## 显示速度
//!
//! - `None`：默认速度（每秒 [`DEFAULT_CHARS_PER_SECOND`] 个字符）
//! - `Some(0.0)`：立即完整显示
//! - `Some(d)`：在 `d` 秒内匀速显示完整文本

/// 默认打字速度（字符/秒），相当于 60 FPS 下每帧一个字符
pub const DEFAULT_CHARS_PER_SECOND: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Reveal {
    /// 按固定速度（字符/秒）
    Rate(f32),
    /// 按总时长（秒）
    Duration(f32),
}

/// 打字机
#[derive(Debug, Clone)]
pub struct Typewriter {
    text: String,
    char_count: usize,
    revealed: f32,
    elapsed: f32,
    reveal: Reveal,
    complete: bool,
    default_rate: f32,
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Typewriter {
    pub fn new() -> Self {
        Self::with_default_rate(DEFAULT_CHARS_PER_SECOND)
    }

    /// 指定默认速度（字符/秒）
    ///
    /// 非正数或非有限值会回退到 [`DEFAULT_CHARS_PER_SECOND`]。
    pub fn with_default_rate(chars_per_second: f32) -> Self {
        let default_rate = if chars_per_second.is_finite() && chars_per_second > 0.0 {
            chars_per_second
        } else {
            DEFAULT_CHARS_PER_SECOND
        };
        Self {
            text: String::new(),
            char_count: 0,
            revealed: 0.0,
            elapsed: 0.0,
            reveal: Reveal::Rate(default_rate),
            complete: true,
            default_rate,
        }
    }

    /// 设置新文本并从头开始显示
    ///
    /// `duration` 为负数或非有限值时按默认速度处理。
    pub fn set_text(&mut self, text: impl Into<String>, duration: Option<f32>) {
        self.text = text.into();
        self.char_count = self.text.chars().count();
        self.revealed = 0.0;
        self.elapsed = 0.0;
        self.complete = false;

        self.reveal = match duration {
            Some(d) if d == 0.0 => {
                self.skip();
                Reveal::Duration(0.0)
            }
            Some(d) if d.is_finite() && d > 0.0 => Reveal::Duration(d),
            _ => Reveal::Rate(self.default_rate),
        };

        if self.char_count == 0 {
            self.skip();
        }
    }

    /// 推进 `dt` 秒
    pub fn advance(&mut self, dt: f32) {
        if self.complete {
            return;
        }
        let dt = dt.max(0.0);
        match self.reveal {
            Reveal::Rate(rate) => {
                self.revealed += rate * dt;
                if self.revealed >= self.char_count as f32 {
                    self.skip();
                }
            }
            Reveal::Duration(duration) => {
                self.elapsed += dt;
                if self.elapsed >= duration {
                    self.skip();
                } else {
                    self.revealed = self.char_count as f32 * (self.elapsed / duration);
                }
            }
        }
    }

    /// 立即显示全部文本（幂等）
    pub fn skip(&mut self) {
        self.revealed = self.char_count as f32;
        self.complete = true;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// 当前可见的文本前缀
    pub fn visible_text(&self) -> &str {
        let visible = self.visible_chars();
        if visible >= self.char_count {
            return &self.text;
        }
        match self.text.char_indices().nth(visible) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }

    /// 可见字符数
    pub fn visible_chars(&self) -> usize {
        (self.revealed.floor() as usize).min(self.char_count)
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }

    /// 清空文本
    pub fn clear(&mut self) {
        self.set_text("", None);
    }
}
