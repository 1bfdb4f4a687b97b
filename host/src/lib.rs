//! # Host 层
//!
//! 视觉小说引擎的宿主层实现：把 `novel-runtime` 接到文件系统、音频后端和主循环上。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置加载
//! - 剧本读取与资源探测
//! - 存档文件与缩略图
//! - 音频指令分发
//! - 输入采集（headless 模式下为输入脚本或自动播放）
//! - 固定步长主循环
//!
//! Host 层不包含剧情逻辑，只负责执行 Runtime 发出的指令。

pub mod audio;
pub mod config;
pub mod error;
pub mod frame_sink;
pub mod input;
pub mod resources;
pub mod runtime_loop;
pub mod save_store;
pub mod story_file;
pub mod thumbnail;

pub use audio::{AudioBackend, AudioDispatcher, NullAudio, RecordingAudio};
pub use config::AppConfig;
pub use error::{AudioError, ConfigError, HostError, HostResult};
pub use frame_sink::{FrameSink, JsonLinesSink, NullSink};
pub use input::{Autopilot, InputSource, NoInput, ScriptedInput};
pub use resources::FsResourceLoader;
pub use runtime_loop::{
    Clock, LoopConfig, ManualClock, RunSummary, RuntimeLoop, StopReason, SystemClock,
};
pub use save_store::FsSaveStore;
pub use story_file::{check_story, load_story};
pub use thumbnail::ThumbnailRenderer;

use std::path::Path;

use novel_runtime::NovelEngine;

/// 按配置创建引擎：文件系统资源加载器 + 文件系统存档
pub fn open_engine(story_path: &Path, config: &AppConfig) -> HostResult<NovelEngine> {
    let story = load_story(story_path)?;
    let saves_dir = config.saves_dir_for(story_path);
    let engine = NovelEngine::new(
        story,
        Box::new(FsResourceLoader::new()),
        Box::new(FsSaveStore::new(saves_dir)),
        config.engine_options(),
    )?;
    Ok(engine)
}
