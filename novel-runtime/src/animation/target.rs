//! # Target 模块
//!
//! 动画目标，标识关键帧动画作用的对象。

use serde::{Deserialize, Serialize};

/// 动画目标
///
/// 角色和自由图片使用独立的命名空间，同名 id 不会互相干扰。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AnimationTarget {
    /// 角色立绘
    Actor {
        /// 角色 id
        id: String,
    },

    /// 自由图片
    Image {
        /// 图片 id
        id: String,
    },
}

impl AnimationTarget {
    /// 创建角色目标
    pub fn actor(id: impl Into<String>) -> Self {
        Self::Actor { id: id.into() }
    }

    /// 创建图片目标
    pub fn image(id: impl Into<String>) -> Self {
        Self::Image { id: id.into() }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Actor { id } | Self::Image { id } => id,
        }
    }

    /// 获取目标的描述字符串（用于调试）
    pub fn description(&self) -> String {
        match self {
            Self::Actor { id } => format!("Actor({})", id),
            Self::Image { id } => format!("Image({})", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_do_not_collide() {
        assert_ne!(AnimationTarget::actor("sun"), AnimationTarget::image("sun"));
        assert_eq!(AnimationTarget::image("sun").id(), "sun");
    }

    #[test]
    fn test_description() {
        assert_eq!(AnimationTarget::actor("alice").description(), "Actor(alice)");
        assert_eq!(AnimationTarget::image("bg").description(), "Image(bg)");
    }
}
