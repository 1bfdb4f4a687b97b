//! # Resources 模块
//!
//! 资源加载与缓存。
//!
//! 图片和音频按路径寻址。资源缺失或损坏时记录警告，并以"无资源"继续运行，
//! 永远不会让游戏循环中断。

mod cache;
mod error;
mod loader;

pub use cache::{CacheStats, ResourceCache};
pub use error::ResourceError;
pub use loader::{ImageInfo, MemoryLoader, ResourceLoader, SoundInfo};
