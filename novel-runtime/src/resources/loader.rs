//! # Resource Loader 模块
//!
//! 资源加载抽象。运行时核心不做 IO，具体的读取由宿主实现。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::ResourceError;

/// 已加载的图片
///
/// 运行时只关心图片是否可用以及尺寸，像素数据由宿主的渲染层自行管理。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// 已加载的音频
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundInfo {
    pub path: PathBuf,
    pub byte_len: u64,
}

/// 资源加载器 trait
///
/// 实现需要区分"文件不存在"（[`ResourceError::NotFound`]）
/// 和"文件存在但无法解码"（[`ResourceError::LoadFailed`] / [`ResourceError::InvalidFormat`]）。
pub trait ResourceLoader {
    /// 加载图片
    fn load_image(&self, path: &Path) -> Result<ImageInfo, ResourceError>;

    /// 加载音频
    fn load_sound(&self, path: &Path) -> Result<SoundInfo, ResourceError>;
}

/// 内存资源加载器
///
/// 只认识预先登记的路径，主要用于测试和无资源的试运行。
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    images: HashMap<PathBuf, (u32, u32)>,
    sounds: HashMap<PathBuf, u64>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        self.images.insert(path.into(), (width, height));
        self
    }

    pub fn with_sound(mut self, path: impl Into<PathBuf>) -> Self {
        self.sounds.insert(path.into(), 0);
        self
    }
}

impl ResourceLoader for MemoryLoader {
    fn load_image(&self, path: &Path) -> Result<ImageInfo, ResourceError> {
        self.images
            .get(path)
            .map(|&(width, height)| ImageInfo {
                path: path.to_path_buf(),
                width,
                height,
            })
            .ok_or_else(|| ResourceError::NotFound {
                path: path.display().to_string(),
            })
    }

    fn load_sound(&self, path: &Path) -> Result<SoundInfo, ResourceError> {
        self.sounds
            .get(path)
            .map(|&byte_len| SoundInfo {
                path: path.to_path_buf(),
                byte_len,
            })
            .ok_or_else(|| ResourceError::NotFound {
                path: path.display().to_string(),
            })
    }
}
