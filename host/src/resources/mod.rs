//! # Resources 模块
//!
//! 文件系统资源加载器。
//!
//! 运行时只需要知道图片尺寸和音频是否可用：
//! 图片只解析文件头取得尺寸，不解码像素；音频只检查文件。
//! 剧本加载时路径已解析为绝对路径，这里不再拼接根目录。

use std::fs;
use std::io;
use std::path::Path;

use image::ImageError;
use tracing::debug;

use novel_runtime::resources::SoundInfo;
use novel_runtime::{ImageInfo, ResourceError, ResourceLoader};

/// 文件系统资源加载器
#[derive(Debug, Clone, Default)]
pub struct FsResourceLoader;

impl FsResourceLoader {
    pub fn new() -> Self {
        Self
    }
}

fn not_found(path: &Path) -> ResourceError {
    ResourceError::NotFound {
        path: path.display().to_string(),
    }
}

fn load_failed(path: &Path, kind: &str, message: impl ToString) -> ResourceError {
    ResourceError::LoadFailed {
        path: path.display().to_string(),
        kind: kind.to_string(),
        message: message.to_string(),
    }
}

impl ResourceLoader for FsResourceLoader {
    fn load_image(&self, path: &Path) -> Result<ImageInfo, ResourceError> {
        if !path.is_file() {
            return Err(not_found(path));
        }
        let (width, height) = image::image_dimensions(path).map_err(|e| match e {
            ImageError::IoError(io) if io.kind() == io::ErrorKind::NotFound => not_found(path),
            ImageError::IoError(io) => load_failed(path, "image", io),
            other => ResourceError::InvalidFormat {
                path: path.display().to_string(),
                message: other.to_string(),
            },
        })?;
        debug!(path = ?path, width, height, "图片可用");
        Ok(ImageInfo {
            path: path.to_path_buf(),
            width,
            height,
        })
    }

    fn load_sound(&self, path: &Path) -> Result<SoundInfo, ResourceError> {
        let metadata = fs::metadata(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                not_found(path)
            } else {
                load_failed(path, "sound", e)
            }
        })?;
        if !metadata.is_file() {
            return Err(not_found(path));
        }
        if metadata.len() == 0 {
            return Err(ResourceError::InvalidFormat {
                path: path.display().to_string(),
                message: "空文件".to_string(),
            });
        }
        Ok(SoundInfo {
            path: path.to_path_buf(),
            byte_len: metadata.len(),
        })
    }
}
