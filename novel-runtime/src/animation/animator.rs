//! # Animator 模块
//!
//! 关键帧动画播放器，同时驱动角色、自由图片和场景背景动画。

use std::collections::BTreeMap;

use tracing::debug;

use super::pose::{Keyframe, Pose};
use super::target::AnimationTarget;
use super::track::KeyframeTrack;

/// 正在播放的轨道
#[derive(Debug, Clone)]
struct ActiveTrack {
    track: KeyframeTrack,
    elapsed: f32,
}

/// 关键帧动画播放器
///
/// 先用 [`add_track`](Self::add_track) 注册轨道，再 `start` 开始播放。
/// 每帧调用 [`advance`](Self::advance) 推进时间并取得所有活跃轨道的姿态。
/// 暂停时不调用 `advance` 即可冻结所有动画。
#[derive(Debug, Clone, Default)]
pub struct KeyframeAnimator {
    tracks: BTreeMap<AnimationTarget, KeyframeTrack>,
    active: BTreeMap<AnimationTarget, ActiveTrack>,
}

impl KeyframeAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册轨道，同一目标的旧轨道被替换
    ///
    /// 没有关键帧的轨道会被忽略。
    pub fn add_track(&mut self, target: AnimationTarget, keyframes: Vec<Keyframe>, looping: bool) {
        match KeyframeTrack::new(keyframes, looping) {
            Some(track) => {
                self.tracks.insert(target, track);
            }
            None => debug!(animation = %target.description(), "忽略没有关键帧的动画"),
        }
    }

    /// 从头开始播放某个目标的轨道
    pub fn start(&mut self, target: &AnimationTarget) -> bool {
        match self.tracks.get(target) {
            Some(track) => {
                self.active.insert(
                    target.clone(),
                    ActiveTrack {
                        track: track.clone(),
                        elapsed: 0.0,
                    },
                );
                true
            }
            None => false,
        }
    }

    /// 从头开始播放所有已注册的轨道
    pub fn start_all(&mut self) {
        for (target, track) in &self.tracks {
            self.active.insert(
                target.clone(),
                ActiveTrack {
                    track: track.clone(),
                    elapsed: 0.0,
                },
            );
        }
    }

    pub fn stop(&mut self, target: &AnimationTarget) {
        self.active.remove(target);
    }

    /// 清空所有轨道
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.active.clear();
    }

    /// 推进时间并返回每个活跃轨道的当前姿态
    ///
    /// 非循环轨道越过最后一帧时，本次仍返回终点姿态，随后从活跃集合中移除。
    pub fn advance(&mut self, dt: f32) -> Vec<(AnimationTarget, Pose)> {
        let mut poses = Vec::with_capacity(self.active.len());
        let mut finished = Vec::new();

        for (target, active) in &mut self.active {
            active.elapsed += dt.max(0.0);
            poses.push((target.clone(), active.track.sample(active.elapsed)));
            if active.track.is_finished_at(active.elapsed) {
                finished.push(target.clone());
            }
        }

        for target in finished {
            debug!(animation = %target.description(), "动画播放完毕");
            self.active.remove(&target);
        }
        poses
    }

    pub fn is_active(&self, target: &AnimationTarget) -> bool {
        self.active.contains_key(target)
    }

    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
