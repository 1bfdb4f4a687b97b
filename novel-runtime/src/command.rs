//! # Command 模块
//!
//! 运行时向宿主发出的音频指令。
//!
//! 运行时不直接播放声音，而是把指令放进 [`AudioQueue`]，
//! 宿主每帧取出后交给具体的音频后端执行。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 音频通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioChannel {
    /// 背景音乐
    Music,
    /// 对话行音效 / 语音
    Voice,
    /// 界面音效
    Sound,
}

/// 音频指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AudioCommand {
    /// 播放背景音乐，替换当前音乐
    PlayMusic { path: PathBuf, looping: bool },
    /// 停止背景音乐
    StopMusic,
    /// 播放对话行音效，替换上一行的音效
    PlayVoice { path: PathBuf },
    /// 停止对话行音效
    StopVoice,
    /// 播放一次性界面音效
    PlaySound { path: PathBuf },
    /// 设置通道音量 (0.0 - 1.0)
    SetVolume { channel: AudioChannel, volume: f32 },
}

impl AudioCommand {
    /// 是否为停止类指令
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::StopMusic | Self::StopVoice)
    }
}

/// 音频指令队列
#[derive(Debug, Clone, Default)]
pub struct AudioQueue {
    commands: Vec<AudioCommand>,
}

impl AudioQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: AudioCommand) {
        self.commands.push(command);
    }

    /// 取出并清空所有指令
    pub fn drain(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = AudioQueue::new();
        queue.push(AudioCommand::StopMusic);
        queue.push(AudioCommand::PlayVoice {
            path: PathBuf::from("a.wav"),
        });
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert!(drained[0].is_stop());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_value(AudioCommand::SetVolume {
            channel: AudioChannel::Music,
            volume: 0.5,
        })
        .unwrap();
        assert_eq!(json["op"], "set_volume");
        assert_eq!(json["channel"], "music");
    }
}
