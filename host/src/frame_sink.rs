//! # Frame Sink 模块
//!
//! headless 运行时画面的去处。

use std::io::Write;

use serde::Serialize;

use novel_runtime::Frame;

use crate::error::{HostError, HostResult};

/// 画面输出
pub trait FrameSink {
    /// 写出一帧
    fn write(&mut self, tick: u64, time: f64, frame: &Frame) -> HostResult<()>;

    fn flush(&mut self) -> HostResult<()> {
        Ok(())
    }
}

/// 丢弃所有画面
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn write(&mut self, _tick: u64, _time: f64, _frame: &Frame) -> HostResult<()> {
        Ok(())
    }
}

#[derive(Serialize)]
struct FrameLine<'a> {
    tick: u64,
    time: f64,
    frame: &'a Frame,
}

/// JSON Lines 输出：每行一个 `{tick, time, frame}`
///
/// 默认只在画面变化时写出。
pub struct JsonLinesSink<W: Write> {
    writer: W,
    changes_only: bool,
    last: Option<Frame>,
    written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            changes_only: true,
            last: None,
            written: 0,
        }
    }

    /// 每一帧都写出
    pub fn every_frame(mut self) -> Self {
        self.changes_only = false;
        self
    }

    /// 已写出的行数
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn write(&mut self, tick: u64, time: f64, frame: &Frame) -> HostResult<()> {
        if self.changes_only && self.last.as_ref() == Some(frame) {
            return Ok(());
        }
        let line = serde_json::to_string(&FrameLine { tick, time, frame })
            .map_err(|e| HostError::FrameSink(e.to_string()))?;
        writeln!(self.writer, "{}", line).map_err(|e| HostError::FrameSink(e.to_string()))?;
        self.written += 1;
        if self.changes_only {
            self.last = Some(frame.clone());
        }
        Ok(())
    }

    fn flush(&mut self) -> HostResult<()> {
        self.writer
            .flush()
            .map_err(|e| HostError::FrameSink(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novel_runtime::ScreenSize;

    #[test]
    fn test_changes_only() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let frame = Frame::blank(ScreenSize::default());
        sink.write(0, 0.0, &frame).unwrap();
        sink.write(1, 0.1, &frame).unwrap();

        let mut paused = frame.clone();
        paused.paused = true;
        sink.write(2, 0.2, &paused).unwrap();
        assert_eq!(sink.written(), 2);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[1]["tick"], 2);
        assert_eq!(lines[1]["frame"]["paused"], true);
        assert_eq!(lines[0]["frame"]["background"]["kind"], "gradient");
    }

    #[test]
    fn test_every_frame() {
        let mut sink = JsonLinesSink::new(Vec::new()).every_frame();
        let frame = Frame::blank(ScreenSize::default());
        for tick in 0..3 {
            sink.write(tick, tick as f64 / 60.0, &frame).unwrap();
        }
        assert_eq!(sink.written(), 3);
    }
}
