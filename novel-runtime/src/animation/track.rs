//! # Track 模块
//!
//! 单条关键帧轨道的采样逻辑。

use super::pose::{Keyframe, Pose};

/// 关键帧轨道
///
/// 关键帧按时间升序保存，采样时严格线性插值，没有缓动。
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTrack {
    keyframes: Vec<Keyframe>,
    looping: bool,
}

impl KeyframeTrack {
    /// 创建轨道，没有关键帧时返回 `None`
    pub fn new(mut keyframes: Vec<Keyframe>, looping: bool) -> Option<Self> {
        if keyframes.is_empty() {
            return None;
        }
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Some(Self { keyframes, looping })
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// 总时长，即最后一个关键帧的时间
    pub fn duration(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |kf| kf.time)
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// 循环轨道把时间折回一个周期内
    pub fn local_time(&self, elapsed: f32) -> f32 {
        let duration = self.duration();
        if self.looping && duration > 0.0 {
            elapsed.rem_euclid(duration)
        } else {
            elapsed
        }
    }

    /// 非循环轨道超过最后一个关键帧后结束
    pub fn is_finished_at(&self, elapsed: f32) -> bool {
        !self.looping && elapsed > self.duration()
    }

    /// 在 `elapsed` 时刻采样
    pub fn sample(&self, elapsed: f32) -> Pose {
        let t = self.local_time(elapsed);
        let (prev, next) = self.bracket(t);

        let span = next.time - prev.time;
        let ratio = if span == 0.0 {
            0.0
        } else {
            ((t - prev.time) / span).clamp(0.0, 1.0)
        };
        prev.pose().lerp(next.pose(), ratio)
    }

    /// 找到满足 `prev.time <= t < next.time` 的关键帧对
    ///
    /// 早于第一帧时返回 (第一帧, 第一帧之后的帧)，越过最后一帧时返回 (最后一帧, 最后一帧)。
    fn bracket(&self, t: f32) -> (&Keyframe, &Keyframe) {
        let first = &self.keyframes[0];
        let last = &self.keyframes[self.keyframes.len() - 1];
        let mut prev = first;
        let mut next = last;
        for (i, kf) in self.keyframes.iter().enumerate() {
            if kf.time <= t {
                prev = kf;
                if let Some(following) = self.keyframes.get(i + 1) {
                    next = following;
                } else {
                    next = kf;
                }
            } else {
                next = kf;
                break;
            }
        }
        (prev, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide() -> Vec<Keyframe> {
        vec![Keyframe::at(0.0, 0.2, 0.7), Keyframe::at(2.0, 0.8, 0.7)]
    }

    #[test]
    fn test_linear_midpoint() {
        let track = KeyframeTrack::new(slide(), false).unwrap();
        let pose = track.sample(1.0);
        assert!((pose.x - 0.5).abs() < 1e-6);
        assert_eq!(pose.y, 0.7);
    }

    #[test]
    fn test_past_end_holds_last_pose() {
        let track = KeyframeTrack::new(slide(), false).unwrap();
        assert_eq!(track.sample(5.0).x, 0.8);
        assert!(track.is_finished_at(2.01));
        assert!(!track.is_finished_at(2.0));
    }

    #[test]
    fn test_loop_periodicity() {
        let track = KeyframeTrack::new(slide(), true).unwrap();
        let base = track.sample(0.5);
        for k in 1..5 {
            assert_eq!(track.sample(0.5 + 2.0 * k as f32), base);
        }
        assert!(!track.is_finished_at(100.0));
    }

    #[test]
    fn test_single_keyframe_holds() {
        let track = KeyframeTrack::new(vec![Keyframe::at(1.0, 0.3, 0.4)], false).unwrap();
        assert_eq!(track.sample(0.0).x, 0.3);
        assert_eq!(track.sample(0.5).x, 0.3);
        assert_eq!(track.sample(3.0).x, 0.3);
    }

    #[test]
    fn test_before_first_keyframe_clamps() {
        let frames = vec![Keyframe::at(1.0, 0.0, 0.0), Keyframe::at(2.0, 1.0, 0.0)];
        let track = KeyframeTrack::new(frames, false).unwrap();
        assert_eq!(track.sample(0.25).x, 0.0);
    }

    #[test]
    fn test_empty_track_rejected() {
        assert!(KeyframeTrack::new(Vec::new(), true).is_none());
    }

    #[test]
    fn test_unsorted_input_sorted() {
        let frames = vec![Keyframe::at(2.0, 0.8, 0.7), Keyframe::at(0.0, 0.2, 0.7)];
        let track = KeyframeTrack::new(frames, false).unwrap();
        assert_eq!(track.keyframes()[0].time, 0.0);
    }
}
