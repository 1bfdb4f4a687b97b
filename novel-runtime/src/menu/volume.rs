//! 音量设置

use serde::{Deserialize, Serialize};

use crate::command::{AudioChannel, AudioCommand};
use crate::story::VolumeSetting;

/// 默认音量
pub const DEFAULT_VOLUME: f32 = 0.8;

/// 三个音频通道的音量 (0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volumes {
    pub music: f32,
    pub sound: f32,
    pub voice: f32,
    /// 静音时所有通道的实际音量为 0，但保留设置值
    #[serde(default)]
    pub muted: bool,
}

impl Default for Volumes {
    fn default() -> Self {
        Self {
            music: DEFAULT_VOLUME,
            sound: DEFAULT_VOLUME,
            voice: DEFAULT_VOLUME,
            muted: false,
        }
    }
}

/// 设置项对应的音频通道
pub fn channel_of(setting: VolumeSetting) -> Option<AudioChannel> {
    match setting {
        VolumeSetting::MusicVolume => Some(AudioChannel::Music),
        VolumeSetting::SoundVolume => Some(AudioChannel::Sound),
        VolumeSetting::VoiceVolume => Some(AudioChannel::Voice),
        VolumeSetting::Unknown => None,
    }
}

impl Volumes {
    pub fn get(&self, channel: AudioChannel) -> f32 {
        match channel {
            AudioChannel::Music => self.music,
            AudioChannel::Sound => self.sound,
            AudioChannel::Voice => self.voice,
        }
    }

    /// 设置音量（夹到 0..=1），返回对应的音频指令
    pub fn set(&mut self, channel: AudioChannel, volume: f32) -> AudioCommand {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match channel {
            AudioChannel::Music => self.music = volume,
            AudioChannel::Sound => self.sound = volume,
            AudioChannel::Voice => self.voice = volume,
        }
        self.command(channel)
    }

    /// 通道的实际音量
    pub fn effective(&self, channel: AudioChannel) -> f32 {
        if self.muted { 0.0 } else { self.get(channel) }
    }

    fn command(&self, channel: AudioChannel) -> AudioCommand {
        AudioCommand::SetVolume {
            channel,
            volume: self.effective(channel),
        }
    }

    /// 同步所有通道的指令
    pub fn commands(&self) -> Vec<AudioCommand> {
        [AudioChannel::Music, AudioChannel::Sound, AudioChannel::Voice]
            .into_iter()
            .map(|c| self.command(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clamps() {
        let mut volumes = Volumes::default();
        let command = volumes.set(AudioChannel::Music, 1.5);
        assert_eq!(volumes.music, 1.0);
        assert_eq!(
            command,
            AudioCommand::SetVolume {
                channel: AudioChannel::Music,
                volume: 1.0
            }
        );
        volumes.set(AudioChannel::Voice, f32::NAN);
        assert_eq!(volumes.voice, 0.0);
    }

    #[test]
    fn test_muted_commands() {
        let volumes = Volumes {
            muted: true,
            ..Volumes::default()
        };
        assert!(volumes.commands().iter().all(|c| matches!(
            c,
            AudioCommand::SetVolume { volume, .. } if *volume == 0.0
        )));
        assert_eq!(volumes.get(AudioChannel::Sound), DEFAULT_VOLUME);
    }

    #[test]
    fn test_channel_mapping() {
        assert_eq!(
            channel_of(VolumeSetting::VoiceVolume),
            Some(AudioChannel::Voice)
        );
        assert_eq!(channel_of(VolumeSetting::Unknown), None);
    }
}
