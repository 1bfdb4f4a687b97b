//! # Audio 模块
//!
//! 把运行时发出的 [`AudioCommand`] 交给具体的音频后端。
//!
//! ## 设计说明
//!
//! - 后端通过 [`AudioBackend`] trait 注入，仓库内提供静音后端和记录后端
//! - 后端报错只记录警告，不会中断主循环（退化为"没有声音"）
//! - 调度器记录当前音乐和各通道音量，便于日志和测试观察

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};

use novel_runtime::{AudioChannel, AudioCommand};

use crate::error::AudioError;

/// 音频后端
pub trait AudioBackend {
    /// 播放音乐，替换当前音乐
    fn play_music(&mut self, path: &Path, looping: bool) -> Result<(), AudioError>;

    fn stop_music(&mut self);

    /// 播放对话行音效，替换上一条
    fn play_voice(&mut self, path: &Path) -> Result<(), AudioError>;

    fn stop_voice(&mut self);

    /// 播放一次性音效
    fn play_sound(&mut self, path: &Path) -> Result<(), AudioError>;

    fn set_volume(&mut self, channel: AudioChannel, volume: f32);
}

/// 静音后端
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioBackend for NullAudio {
    fn play_music(&mut self, _path: &Path, _looping: bool) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop_music(&mut self) {}

    fn play_voice(&mut self, _path: &Path) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop_voice(&mut self) {}

    fn play_sound(&mut self, _path: &Path) -> Result<(), AudioError> {
        Ok(())
    }

    fn set_volume(&mut self, _channel: AudioChannel, _volume: f32) {}
}

/// 记录后端：按顺序保存收到的所有指令
///
/// 克隆出的句柄共享同一份记录，交给调度器之后仍可从外部读取。
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    log: Rc<RefCell<Vec<AudioCommand>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// 目前为止收到的指令
    pub fn log(&self) -> Vec<AudioCommand> {
        self.log.borrow().clone()
    }

    fn record(&self, command: AudioCommand) {
        self.log.borrow_mut().push(command);
    }
}

impl AudioBackend for RecordingAudio {
    fn play_music(&mut self, path: &Path, looping: bool) -> Result<(), AudioError> {
        self.record(AudioCommand::PlayMusic {
            path: path.to_path_buf(),
            looping,
        });
        Ok(())
    }

    fn stop_music(&mut self) {
        self.record(AudioCommand::StopMusic);
    }

    fn play_voice(&mut self, path: &Path) -> Result<(), AudioError> {
        self.record(AudioCommand::PlayVoice {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn stop_voice(&mut self) {
        self.record(AudioCommand::StopVoice);
    }

    fn play_sound(&mut self, path: &Path) -> Result<(), AudioError> {
        self.record(AudioCommand::PlaySound {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn set_volume(&mut self, channel: AudioChannel, volume: f32) {
        self.record(AudioCommand::SetVolume { channel, volume });
    }
}

/// 音频调度器
pub struct AudioDispatcher {
    backend: Box<dyn AudioBackend>,
    current_music: Option<PathBuf>,
    music_volume: f32,
    sound_volume: f32,
    voice_volume: f32,
    failures: u64,
}

impl AudioDispatcher {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            current_music: None,
            music_volume: 1.0,
            sound_volume: 1.0,
            voice_volume: 1.0,
            failures: 0,
        }
    }

    /// 按顺序执行一批指令
    pub fn apply(&mut self, commands: impl IntoIterator<Item = AudioCommand>) {
        for command in commands {
            self.apply_one(command);
        }
    }

    fn apply_one(&mut self, command: AudioCommand) {
        let result = match &command {
            AudioCommand::PlayMusic { path, looping } => {
                if self.current_music.as_deref() == Some(path.as_path()) {
                    debug!(path = ?path, "音乐已在播放");
                    return;
                }
                let result = self.backend.play_music(path, *looping);
                if result.is_ok() {
                    self.current_music = Some(path.clone());
                }
                result
            }
            AudioCommand::StopMusic => {
                self.current_music = None;
                self.backend.stop_music();
                Ok(())
            }
            AudioCommand::PlayVoice { path } => self.backend.play_voice(path),
            AudioCommand::StopVoice => {
                self.backend.stop_voice();
                Ok(())
            }
            AudioCommand::PlaySound { path } => self.backend.play_sound(path),
            AudioCommand::SetVolume { channel, volume } => {
                match channel {
                    AudioChannel::Music => self.music_volume = *volume,
                    AudioChannel::Sound => self.sound_volume = *volume,
                    AudioChannel::Voice => self.voice_volume = *volume,
                }
                self.backend.set_volume(*channel, *volume);
                Ok(())
            }
        };
        if let Err(e) = result {
            self.failures += 1;
            warn!(error = %e, "音频指令执行失败，忽略");
        }
    }

    pub fn current_music(&self) -> Option<&Path> {
        self.current_music.as_deref()
    }

    pub fn volume(&self, channel: AudioChannel) -> f32 {
        match channel {
            AudioChannel::Music => self.music_volume,
            AudioChannel::Sound => self.sound_volume,
            AudioChannel::Voice => self.voice_volume,
        }
    }

    /// 失败的指令数
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 总是失败的后端
    struct BrokenAudio;

    impl AudioBackend for BrokenAudio {
        fn play_music(&mut self, path: &Path, _looping: bool) -> Result<(), AudioError> {
            Err(AudioError::PlaybackFailed {
                path: path.to_path_buf(),
                message: "无法解码".to_string(),
            })
        }
        fn stop_music(&mut self) {}
        fn play_voice(&mut self, _path: &Path) -> Result<(), AudioError> {
            Err(AudioError::DeviceUnavailable("无设备".to_string()))
        }
        fn stop_voice(&mut self) {}
        fn play_sound(&mut self, _path: &Path) -> Result<(), AudioError> {
            Ok(())
        }
        fn set_volume(&mut self, _channel: AudioChannel, _volume: f32) {}
    }

    #[test]
    fn test_failures_degrade() {
        let mut audio = AudioDispatcher::new(Box::new(BrokenAudio));
        audio.apply([
            AudioCommand::PlayMusic {
                path: PathBuf::from("bgm.ogg"),
                looping: true,
            },
            AudioCommand::PlayVoice {
                path: PathBuf::from("line.ogg"),
            },
            AudioCommand::SetVolume {
                channel: AudioChannel::Music,
                volume: 0.5,
            },
        ]);
        assert_eq!(audio.failures(), 2);
        assert_eq!(audio.current_music(), None);
        assert_eq!(audio.volume(AudioChannel::Music), 0.5);
    }

    #[test]
    fn test_same_music_is_not_restarted() {
        let mut audio = AudioDispatcher::new(Box::new(NullAudio));
        let play = AudioCommand::PlayMusic {
            path: PathBuf::from("bgm.ogg"),
            looping: true,
        };
        audio.apply([play.clone(), play]);
        assert_eq!(audio.current_music(), Some(Path::new("bgm.ogg")));

        audio.apply([AudioCommand::StopMusic]);
        assert_eq!(audio.current_music(), None);
    }

    #[test]
    fn test_recording_handle_is_shared() {
        let recording = RecordingAudio::new();
        let mut audio = AudioDispatcher::new(Box::new(recording.clone()));
        audio.apply([
            AudioCommand::StopVoice,
            AudioCommand::PlaySound {
                path: PathBuf::from("click.wav"),
            },
        ]);
        assert_eq!(
            recording.log(),
            vec![
                AudioCommand::StopVoice,
                AudioCommand::PlaySound {
                    path: PathBuf::from("click.wav")
                },
            ]
        );
    }
}
