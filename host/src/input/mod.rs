//! # Input 模块
//!
//! headless 运行时的输入来源，每个逻辑帧产生一份 [`InputSnapshot`]。
//!
//! ## 输入脚本格式
//!
//! 每行一个事件，`#` 开头为注释：
//!
//! ```text
//! # 秒数  事件      参数
//! 0.5     confirm
//! 1.0     press     640 360
//! 2.0     hold_skip on
//! 4.0     hold_skip off
//! 5.0     select    1
//! 6.0     jump      chapter_2
//! 9.0     quit
//! ```
//!
//! 时间是模拟时间（逻辑帧累计的秒数），与真实时钟无关，因此回放是确定的。

use std::path::Path;

use novel_runtime::{EngineMode, InputEvent, InputSnapshot, NovelEngine, ScenePhase};

use crate::error::{HostError, HostResult};

/// 输入来源
pub trait InputSource {
    /// 采样一帧输入
    ///
    /// `now` 为本帧开始时的模拟时间（秒）。
    fn poll(&mut self, now: f64, engine: &NovelEngine) -> InputSnapshot;

    /// 是否已经没有后续输入
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// 不产生任何输入
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self, _now: f64, _engine: &NovelEngine) -> InputSnapshot {
        InputSnapshot::new()
    }
}

/// 脚本中的一条动作
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptAction {
    Event(InputEvent),
    /// 按下 / 松开快进修饰键
    HoldSkip(bool),
}

/// 按时间回放的输入脚本
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    /// 按时间升序
    actions: Vec<(f64, ScriptAction)>,
    cursor: usize,
    skip_held: bool,
}

impl ScriptedInput {
    pub fn from_actions(mut actions: Vec<(f64, ScriptAction)>) -> Self {
        actions.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            actions,
            cursor: 0,
            skip_held: false,
        }
    }

    /// 解析输入脚本
    pub fn parse(text: &str) -> HostResult<Self> {
        let mut actions = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let action = parse_line(line).map_err(|message| HostError::InputScript {
                line: i + 1,
                message,
            })?;
            actions.push(action);
        }
        Ok(Self::from_actions(actions))
    }

    pub fn load(path: &Path) -> HostResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| HostError::InputScript {
            line: 0,
            message: format!("无法读取 {:?}: {}", path, e),
        })?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

fn parse_line(line: &str) -> Result<(f64, ScriptAction), String> {
    let mut parts = line.split_whitespace();
    let time: f64 = parts
        .next()
        .ok_or("缺少时间")?
        .parse()
        .map_err(|_| "时间不是数字".to_string())?;
    if !time.is_finite() || time < 0.0 {
        return Err("时间必须是非负数".to_string());
    }
    let name = parts.next().ok_or("缺少事件名")?;
    let args: Vec<&str> = parts.collect();

    let point = |args: &[&str]| -> Result<(f32, f32), String> {
        match args {
            [x, y] => Ok((
                x.parse().map_err(|_| format!("无效坐标: {}", x))?,
                y.parse().map_err(|_| format!("无效坐标: {}", y))?,
            )),
            _ => Err(format!("{} 需要两个坐标参数", name)),
        }
    };

    let event = match name {
        "confirm" => InputEvent::Confirm,
        "up" => InputEvent::Up,
        "down" => InputEvent::Down,
        "left" => InputEvent::Left,
        "right" => InputEvent::Right,
        "back" => InputEvent::Back,
        "skip" => InputEvent::ToggleSkip,
        "quit" => InputEvent::Quit,
        "select" => {
            let index = args
                .first()
                .and_then(|s| s.parse().ok())
                .ok_or("select 需要选项序号")?;
            InputEvent::SelectChoice { index }
        }
        "move" => {
            let (x, y) = point(args.as_slice())?;
            InputEvent::PointerMoved { x, y }
        }
        "press" => {
            let (x, y) = point(args.as_slice())?;
            InputEvent::PointerPressed { x, y }
        }
        "release" => {
            let (x, y) = point(args.as_slice())?;
            InputEvent::PointerReleased { x, y }
        }
        "jump" => {
            let scene_id = args.first().ok_or("jump 需要场景 id")?;
            InputEvent::jump(*scene_id)
        }
        "hold_skip" => {
            let held = match args.first().copied() {
                Some("on") => true,
                Some("off") => false,
                _ => return Err("hold_skip 需要 on 或 off".to_string()),
            };
            return Ok((time, ScriptAction::HoldSkip(held)));
        }
        other => return Err(format!("未知事件: {}", other)),
    };
    Ok((time, ScriptAction::Event(event)))
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, now: f64, _engine: &NovelEngine) -> InputSnapshot {
        let mut snapshot = InputSnapshot::new();
        while let Some((time, action)) = self.actions.get(self.cursor) {
            if *time > now {
                break;
            }
            match action {
                ScriptAction::Event(event) => snapshot.events.push(event.clone()),
                ScriptAction::HoldSkip(held) => self.skip_held = *held,
            }
            self.cursor += 1;
        }
        snapshot.skip_held = self.skip_held;
        snapshot
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.actions.len()
    }
}

/// 自动播放
///
/// 每隔固定时间确认一次；选项总是选当前高亮的一项；
/// 故事结束时退出。
#[derive(Debug, Clone)]
pub struct Autopilot {
    interval: f64,
    next_at: f64,
    finished: bool,
}

impl Autopilot {
    /// 默认确认间隔（秒）
    pub const DEFAULT_INTERVAL: f64 = 0.5;

    pub fn new(interval: f64) -> Self {
        Self {
            interval: interval.max(0.0),
            next_at: 0.0,
            finished: false,
        }
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

impl InputSource for Autopilot {
    fn poll(&mut self, now: f64, engine: &NovelEngine) -> InputSnapshot {
        if self.finished {
            return InputSnapshot::new();
        }
        let at_end = engine.mode() == EngineMode::Playing
            && engine.scene().phase() == ScenePhase::End;
        if at_end {
            self.finished = true;
            return InputSnapshot::single(InputEvent::Quit);
        }
        if now + f64::EPSILON < self.next_at {
            return InputSnapshot::new();
        }
        self.next_at = now + self.interval;
        InputSnapshot::single(InputEvent::Confirm)
    }

    fn is_exhausted(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = ScriptedInput::parse(
            "# 注释\n\
             0.5 confirm\n\
             0.1 press 10 20\n\
             \n\
             1 hold_skip on\n\
             2 jump chapter_2\n",
        )
        .unwrap();
        assert_eq!(script.len(), 4);
        // 按时间排序
        assert_eq!(
            script.actions[0],
            (0.1, ScriptAction::Event(InputEvent::pointer_pressed(10.0, 20.0)))
        );
        assert_eq!(script.actions[2], (1.0, ScriptAction::HoldSkip(true)));
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = ScriptedInput::parse("0 confirm\n1 dance\n").unwrap_err();
        assert!(matches!(err, HostError::InputScript { line: 2, .. }));

        assert!(ScriptedInput::parse("x confirm").is_err());
        assert!(ScriptedInput::parse("1 press 10").is_err());
        assert!(ScriptedInput::parse("1 hold_skip maybe").is_err());
    }
}
