//! # Error 模块
//!
//! 宿主层错误类型。

use std::path::PathBuf;

use thiserror::Error;

use novel_runtime::{NovelError, SaveError};

/// 配置错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

/// 音频后端错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AudioError {
    /// 音频文件无法播放
    #[error("无法播放音频 {path:?}: {message}")]
    PlaybackFailed { path: PathBuf, message: String },

    /// 音频设备不可用
    #[error("音频设备不可用: {0}")]
    DeviceUnavailable(String),
}

/// 宿主层统一错误
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] NovelError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    /// 剧本文件读取失败
    #[error("无法读取剧本 {path:?}: {message}")]
    StoryRead { path: PathBuf, message: String },

    /// 输入脚本解析失败
    #[error("输入脚本第 {line} 行无效: {message}")]
    InputScript { line: usize, message: String },

    /// 画面输出失败
    #[error("画面输出失败: {0}")]
    FrameSink(String),
}

pub type HostResult<T> = Result<T, HostError>;
