//! 颜色解析
//!
//! 剧本中的颜色以 `#RRGGBB` 或 `#RRGGBBAA` 字符串保存。

use serde::{Deserialize, Serialize};

/// RGBA 颜色（0-255）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// 解析十六进制颜色
    ///
    /// 接受 `#RRGGBB` 与 `#RRGGBBAA`，`#` 可省略。格式错误时返回 `None`。
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// 解析颜色，失败时回退为白色
    pub fn parse_or_white(s: &str) -> Self {
        Self::parse_hex(s).unwrap_or(Self::WHITE)
    }

    /// 从 `[r, g, b]` 三元组构造
    pub fn from_triplet(rgb: [u8; 3]) -> Self {
        Self::rgb(rgb[0], rgb[1], rgb[2])
    }

    /// 返回调整透明度后的颜色
    pub fn with_alpha(self, alpha: f32) -> Self {
        let a = (f32::from(self.a) * alpha.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgba::parse_hex("#646496"), Some(Rgba::rgb(0x64, 0x64, 0x96)));
        assert_eq!(
            Rgba::parse_hex("#14142890"),
            Some(Rgba::rgba(0x14, 0x14, 0x28, 0x90))
        );
        assert_eq!(Rgba::parse_hex("FFFFFF"), Some(Rgba::WHITE));
    }

    #[test]
    fn test_invalid_hex_falls_back_to_white() {
        assert_eq!(Rgba::parse_hex("#12"), None);
        assert_eq!(Rgba::parse_hex("#GGGGGG"), None);
        assert_eq!(Rgba::parse_hex("#颜色色"), None);
        assert_eq!(Rgba::parse_or_white("not a color"), Rgba::WHITE);
    }

    #[test]
    fn test_with_alpha() {
        assert_eq!(Rgba::WHITE.with_alpha(0.5).a, 128);
        assert_eq!(Rgba::WHITE.with_alpha(2.0).a, 255);
    }
}
