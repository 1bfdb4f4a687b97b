//! # Runtime Loop 模块
//!
//! 固定步长主循环：测量帧间隔 → 累加 → 按固定 dt 运行若干逻辑帧 → 休眠到下一帧。
//!
//! 时钟通过 [`Clock`] 注入。[`ManualClock`] 的休眠只是把时间往前拨，
//! 因此 headless 运行和测试不需要真的等待。

use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use novel_runtime::{EngineMode, NovelEngine};

use crate::audio::AudioDispatcher;
use crate::config::TickConfig;
use crate::error::HostResult;
use crate::frame_sink::FrameSink;
use crate::input::InputSource;

/// 主循环参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    /// 模拟时间上限，到达后停止
    pub max_sim_time: Option<Duration>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            max_sim_time: None,
        }
    }
}

impl From<&TickConfig> for LoopConfig {
    fn from(config: &TickConfig) -> Self {
        Self {
            target_tps: config.target_tps,
            max_frame_delta: Duration::from_millis(config.max_frame_delta_ms),
            max_ticks_per_frame: config.max_ticks_per_frame,
            max_sim_time: None,
        }
    }
}

impl LoopConfig {
    pub fn with_max_sim_time(mut self, limit: Option<Duration>) -> Self {
        self.max_sim_time = limit;
        self
    }

    fn fixed_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_tps.max(1) as f64)
    }
}

/// 时钟
pub trait Clock {
    /// 自某个固定起点以来的时间
    fn now(&self) -> Duration;

    fn sleep(&mut self, duration: Duration);
}

/// 系统时钟
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// 手动时钟：休眠即拨快时间
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 拨快时间（模拟一帧卡顿）
    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.now += duration;
    }
}

/// 一帧的步进计划
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    /// 超出单帧上限而丢弃的时间
    pub dropped_backlog: Duration,
}

/// 计算本帧要运行的逻辑帧数
pub fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

/// 限制单帧时间差
pub fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

/// 停止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 引擎退出（玩家退出或故事结束后退出）
    EngineStopped,
    /// 到达模拟时间上限
    TimeLimit,
}

/// 运行结果
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    /// 模拟时间（秒）
    pub sim_seconds: f64,
    pub reason: StopReason,
    pub final_mode: EngineMode,
    pub final_scene: Option<String>,
    pub play_time: f64,
    pub audio_failures: u64,
}

/// 主循环
pub struct RuntimeLoop<'a> {
    config: LoopConfig,
    engine: &'a mut NovelEngine,
    input: &'a mut dyn InputSource,
    audio: &'a mut AudioDispatcher,
    sink: &'a mut dyn FrameSink,
}

impl<'a> RuntimeLoop<'a> {
    pub fn new(
        config: LoopConfig,
        engine: &'a mut NovelEngine,
        input: &'a mut dyn InputSource,
        audio: &'a mut AudioDispatcher,
        sink: &'a mut dyn FrameSink,
    ) -> Self {
        Self {
            config,
            engine,
            input,
            audio,
            sink,
        }
    }

    /// 运行直到引擎停止或到达时间上限
    pub fn run(&mut self, clock: &mut dyn Clock) -> HostResult<RunSummary> {
        let fixed_dt = self.config.fixed_dt();
        let fixed_dt_seconds = fixed_dt.as_secs_f32();
        let max_ticks_per_frame = self.config.max_ticks_per_frame.max(1);
        let max_frame_delta = if self.config.max_frame_delta.is_zero() {
            Duration::from_millis(250)
        } else {
            self.config.max_frame_delta
        };

        info!(
            target_tps = self.config.target_tps,
            max_frame_delta_ms = max_frame_delta.as_millis() as u64,
            max_ticks_per_frame,
            max_sim_seconds = self.config.max_sim_time.map(|d| d.as_secs_f64()),
            "主循环配置"
        );

        // 启动时的指令（音量、主菜单音乐）
        self.audio.apply(self.engine.take_audio());

        let mut accumulator = Duration::ZERO;
        let mut last = clock.now();
        let mut sim_time = Duration::ZERO;
        let mut ticks: u64 = 0;

        let reason = 'outer: loop {
            let now = clock.now();
            let frame_dt = clamp_frame_delta(now.saturating_sub(last), max_frame_delta);
            last = now;
            accumulator += frame_dt;

            let plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
            accumulator = plan.remaining_accumulator;
            if !plan.dropped_backlog.is_zero() {
                warn!(
                    dropped_ms = plan.dropped_backlog.as_millis() as u64,
                    max_ticks_per_frame, "逻辑帧追赶达到上限，丢弃积压时间"
                );
            }

            for _ in 0..plan.ticks_to_run {
                let input = self.input.poll(sim_time.as_secs_f64(), &*self.engine);
                let frame = self.engine.tick(&input, fixed_dt_seconds);
                self.audio.apply(self.engine.take_audio());
                sim_time += fixed_dt;
                self.sink.write(ticks, sim_time.as_secs_f64(), &frame)?;
                ticks += 1;

                if !self.engine.is_running() {
                    break 'outer StopReason::EngineStopped;
                }
                if self.config.max_sim_time.is_some_and(|limit| sim_time >= limit) {
                    break 'outer StopReason::TimeLimit;
                }
            }

            if plan.ticks_to_run == 0 {
                clock.sleep(fixed_dt.saturating_sub(accumulator));
            }
        };

        self.sink.flush()?;
        let summary = RunSummary {
            ticks,
            sim_seconds: sim_time.as_secs_f64(),
            reason,
            final_mode: self.engine.mode(),
            final_scene: self.engine.scene().current_scene_id().map(str::to_string),
            play_time: self.engine.play_time(),
            audio_failures: self.audio.failures(),
        };
        info!(
            ticks = summary.ticks,
            sim_seconds = summary.sim_seconds,
            reason = ?summary.reason,
            mode = ?summary.final_mode,
            resources = %self.engine.resources().stats().format(),
            "主循环结束"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn test_plan_sim_steps_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let plan = plan_sim_steps(Duration::from_millis(50), fixed_dt, 5);
        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(2));
        assert_eq!(plan.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn test_plan_sim_steps_drops_backlog() {
        let fixed_dt = Duration::from_millis(16);
        let plan = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);
        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        assert_eq!(plan.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn test_manual_clock_sleep_advances() {
        let mut clock = ManualClock::new();
        clock.sleep(Duration::from_millis(16));
        clock.advance(Duration::from_millis(4));
        assert_eq!(clock.now(), Duration::from_millis(20));
    }
}
