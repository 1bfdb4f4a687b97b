//! # Pose 模块
//!
//! 关键帧与插值结果。

use serde::{Deserialize, Serialize};

/// 插值得到的姿态
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// 归一化横坐标
    pub x: f32,
    /// 归一化纵坐标
    pub y: f32,
    pub scale: f32,
    /// 旋转角度（度）
    pub rotation: f32,
    /// 透明度 (0.0 - 1.0)
    pub alpha: f32,
}

impl Pose {
    /// 线性插值
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            x: mix(self.x, other.x),
            y: mix(self.y, other.y),
            scale: mix(self.scale, other.scale),
            rotation: mix(self.rotation, other.rotation),
            alpha: mix(self.alpha, other.alpha),
        }
    }
}

/// 关键帧
///
/// 缺省字段：`time` 0、`x` 0.5、`y` 0.7、`scale` 1、`rotation` 0、`alpha` 1。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keyframe {
    /// 相对动画开始的时间（秒）
    pub time: f32,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub rotation: f32,
    pub alpha: f32,
}

impl Default for Keyframe {
    fn default() -> Self {
        Self {
            time: 0.0,
            x: 0.5,
            y: 0.7,
            scale: 1.0,
            rotation: 0.0,
            alpha: 1.0,
        }
    }
}

impl Keyframe {
    /// 在指定时间、指定位置的关键帧
    pub fn at(time: f32, x: f32, y: f32) -> Self {
        Self {
            time,
            x,
            y,
            ..Self::default()
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn pose(&self) -> Pose {
        Pose {
            x: self.x,
            y: self.y,
            scale: self.scale,
            rotation: self.rotation,
            alpha: self.alpha,
        }
    }
}
