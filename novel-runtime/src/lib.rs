//! # Novel Runtime
//!
//! 视觉小说播放引擎的核心运行时库。
//!
//! ## 架构概述
//!
//! `novel-runtime` 是纯逻辑核心，不做文件 IO、不绘制、不发声。
//! 宿主每帧把输入交给引擎，取回画面描述和音频指令：
//!
//! ```text
//! Host                              Runtime
//!   │                                  │
//!   │──── InputSnapshot, dt ─────────►│
//!   │                                  │ tick()
//!   │◄─── Frame ──────────────────────│
//!   │◄─── Vec<AudioCommand> ──────────│ take_audio()
//!   │                                  │
//! ```
//!
//! 图片尺寸和音频文件是否可用由宿主提供的 [`ResourceLoader`] 回答，
//! 存档的持久化由宿主提供的 [`SaveStore`] 完成。
//!
//! ## 核心类型
//!
//! - [`Story`]：剧本（场景、角色、菜单配置）
//! - [`NovelEngine`]：顶层引擎，在主菜单、游戏、暂停之间切换
//! - [`SceneController`]：场景内的对话、选项、舞台和快进
//! - [`Frame`]：一帧画面的完整描述
//!
//! ## 使用示例
//!
//! ```ignore
//! use novel_runtime::{EngineOptions, InputSnapshot, MemoryLoader, MemorySaveStore, NovelEngine, Story};
//!
//! let story = Story::from_json(&text, base_dir)?;
//! let mut engine = NovelEngine::new(
//!     story,
//!     Box::new(loader),
//!     Box::new(saves),
//!     EngineOptions::default(),
//! )?;
//!
//! while engine.is_running() {
//!     let frame = engine.tick(&input, dt);
//!     audio.execute(engine.take_audio());
//!     renderer.draw(&frame);
//! }
//! ```

pub mod animation;
pub mod choice;
pub mod command;
pub mod dialog;
pub mod engine;
pub mod error;
pub mod frame;
pub mod input;
pub mod layout;
pub mod menu;
pub mod overlay;
pub mod resources;
pub mod save;
pub mod scene;
pub mod story;
pub mod typewriter;

// 重导出核心类型
pub use animation::{AnimationTarget, Keyframe, KeyframeAnimator, Pose};
pub use choice::ChoiceResolver;
pub use command::{AudioChannel, AudioCommand, AudioQueue};
pub use dialog::{DialogExit, DialogSequencer, DialogStep};
pub use engine::{EngineMode, EngineOptions, NovelEngine};
pub use error::{NovelError, NovelResult, RuntimeError, StoryError};
pub use frame::Frame;
pub use input::{InputEvent, InputSnapshot};
pub use layout::{Rect, ScreenSize};
pub use menu::{MenuController, MenuOutcome, MenuScreen, Volumes};
pub use overlay::{OverlayQueue, TextOverlay};
pub use resources::{ImageInfo, MemoryLoader, ResourceCache, ResourceError, ResourceLoader};
pub use save::{
    GameState, MemorySaveStore, SaveError, SaveRecord, SaveRequest, SaveStore, SaveVersion,
};
pub use scene::{SceneController, SceneOptions, ScenePhase, Stage};
pub use story::{Character, Choice, DialogLine, Rgba, Scene, Story};
pub use typewriter::Typewriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let story = Story::new(Scene::new("start").with_dialog(DialogLine::narration("你好")));
        assert!(story.validate().is_ok());

        let _input = InputSnapshot::single(InputEvent::Confirm);
        let _frame = Frame::blank(ScreenSize::default());
        let _command = AudioCommand::StopMusic;
    }
}
