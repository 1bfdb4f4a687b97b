//! # Animation 模块
//!
//! 关键帧动画系统。
//!
//! ## 核心概念
//!
//! - `AnimationTarget`: 动画目标（角色或自由图片）
//! - `Keyframe`: 带时间戳的目标姿态
//! - `KeyframeTrack`: 一组按时间排序的关键帧，可循环
//! - `KeyframeAnimator`: 管理所有轨道的播放器
//!
//! 动画系统只负责时间轴：它输出每个目标的 [`Pose`]，
//! 由场景层决定如何把姿态应用到精灵上。

mod animator;
mod pose;
mod target;
mod track;

pub use animator::KeyframeAnimator;
pub use pose::{Keyframe, Pose};
pub use target::AnimationTarget;
pub use track::KeyframeTrack;
