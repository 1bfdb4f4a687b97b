//! # Config 模块
//!
//! 运行时配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use novel_runtime::{EngineOptions, ScreenSize, Volumes};

pub use crate::error::ConfigError;

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 剧本文件路径
    #[serde(default)]
    pub story_path: Option<PathBuf>,

    /// 存档目录，未配置时使用剧本所在目录下的 `saves`
    #[serde(default)]
    pub saves_dir: Option<PathBuf>,

    /// 画面尺寸
    #[serde(default)]
    pub screen: ScreenConfig,

    /// 主循环配置
    #[serde(default)]
    pub tick: TickConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 调试配置
    #[serde(default)]
    pub debug: DebugConfig,
}

/// 画面尺寸
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    #[serde(default = "default_screen_width")]
    pub width: u32,

    #[serde(default = "default_screen_height")]
    pub height: u32,
}

/// 固定步长主循环配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    /// 每秒逻辑帧数
    #[serde(default = "default_target_tps")]
    pub target_tps: u32,

    /// 单帧最大时间差（毫秒），超出部分丢弃
    #[serde(default = "default_max_frame_delta_ms")]
    pub max_frame_delta_ms: u64,

    /// 单帧最多追赶的逻辑帧数
    #[serde(default = "default_max_ticks_per_frame")]
    pub max_ticks_per_frame: u32,
}

/// 播放配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// 默认打字速度（字符/秒）
    #[serde(default = "default_text_speed")]
    pub text_speed: f32,

    /// 快进时两次推进的间隔（毫秒）
    #[serde(default = "default_skip_interval_ms")]
    pub skip_interval_ms: u64,
}

/// 音频配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// 音乐音量 (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub music_volume: f32,

    /// 界面音效音量 (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub sound_volume: f32,

    /// 对话音效音量 (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub voice_volume: f32,

    /// 是否静音
    #[serde(default)]
    pub muted: bool,
}

/// 调试配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// 是否允许按场景 id 跳转
    #[serde(default)]
    pub scene_jump: bool,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// 默认值函数
fn default_screen_width() -> u32 {
    1280
}

fn default_screen_height() -> u32 {
    720
}

fn default_target_tps() -> u32 {
    60
}

fn default_max_frame_delta_ms() -> u64 {
    250
}

fn default_max_ticks_per_frame() -> u32 {
    5
}

fn default_text_speed() -> f32 {
    novel_runtime::typewriter::DEFAULT_CHARS_PER_SECOND
}

fn default_skip_interval_ms() -> u64 {
    50
}

fn default_volume() -> f32 {
    novel_runtime::menu::DEFAULT_VOLUME
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            story_path: None,
            saves_dir: None,
            screen: ScreenConfig::default(),
            tick: TickConfig::default(),
            playback: PlaybackConfig::default(),
            audio: AudioConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            target_tps: default_target_tps(),
            max_frame_delta_ms: default_max_frame_delta_ms(),
            max_ticks_per_frame: default_max_ticks_per_frame(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            text_speed: default_text_speed(),
            skip_interval_ms: default_skip_interval_ms(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            music_volume: default_volume(),
            sound_volume: default_volume(),
            voice_volume: default_volume(),
            muted: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            scene_jump: false,
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = ?path, "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = ?path, error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(ConfigError::ValidationFailed(
                "画面尺寸不能为 0".to_string(),
            ));
        }

        if self.tick.target_tps == 0 {
            return Err(ConfigError::ValidationFailed(
                "target_tps 必须大于 0".to_string(),
            ));
        }

        if !(self.playback.text_speed >= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "打字速度不能为负数".to_string(),
            ));
        }

        // 检查音量范围
        let volumes = [
            ("音乐", self.audio.music_volume),
            ("音效", self.audio.sound_volume),
            ("语音", self.audio.voice_volume),
        ];
        for (name, volume) in volumes {
            if !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::ValidationFailed(format!(
                    "{}音量必须在 0.0 - 1.0 之间",
                    name
                )));
            }
        }

        if self.debug.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "未知的日志级别: {}",
                self.debug.log_level
            )));
        }

        Ok(())
    }

    /// 存档目录：优先使用配置值，否则放在剧本旁边
    pub fn saves_dir_for(&self, story_path: &Path) -> PathBuf {
        match &self.saves_dir {
            Some(dir) => dir.clone(),
            None => story_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("saves"),
        }
    }

    pub fn screen_size(&self) -> ScreenSize {
        ScreenSize::new(self.screen.width, self.screen.height)
    }

    pub fn volumes(&self) -> Volumes {
        Volumes {
            music: self.audio.music_volume,
            sound: self.audio.sound_volume,
            voice: self.audio.voice_volume,
            muted: self.audio.muted,
        }
    }

    /// 引擎参数
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            screen: self.screen_size(),
            text_speed: self.playback.text_speed,
            skip_interval: Duration::from_millis(self.playback.skip_interval_ms),
            volumes: self.volumes(),
            debug_scene_jump: self.debug.scene_jump,
        }
    }
}
