//! # Resource Cache 模块
//!
//! 按路径缓存资源加载结果。
//!
//! ## 缓存策略
//!
//! - 成功和失败都会缓存，同一个缺失资源只加载一次、只警告一次
//! - 会话内不做淘汰；重新加载剧本时调用 [`ResourceCache::clear`]
//! - 只在游戏循环线程内访问，不需要加锁

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use super::{ImageInfo, ResourceError, ResourceLoader, SoundInfo};

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 缓存条目数量（含失败条目）
    pub entries: usize,
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 加载失败次数
    pub failures: u64,
}

impl CacheStats {
    /// 命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }

    /// 格式化为可读字符串
    pub fn format(&self) -> String {
        format!(
            "Cache: {} entries, hit rate: {:.1}%, failures: {}",
            self.entries,
            self.hit_rate() * 100.0,
            self.failures
        )
    }
}

type Slot<T> = Result<Arc<T>, ResourceError>;

/// 资源缓存
pub struct ResourceCache {
    loader: Box<dyn ResourceLoader>,
    images: HashMap<PathBuf, Slot<ImageInfo>>,
    sounds: HashMap<PathBuf, Slot<SoundInfo>>,
    hits: u64,
    misses: u64,
    failures: u64,
}

impl ResourceCache {
    pub fn new(loader: Box<dyn ResourceLoader>) -> Self {
        Self {
            loader,
            images: HashMap::new(),
            sounds: HashMap::new(),
            hits: 0,
            misses: 0,
            failures: 0,
        }
    }

    /// 加载图片，返回完整的加载结果
    pub fn try_image(&mut self, path: &Path) -> Result<Arc<ImageInfo>, ResourceError> {
        if let Some(slot) = self.images.get(path) {
            self.hits += 1;
            return slot.clone();
        }
        self.misses += 1;
        let slot = self.loader.load_image(path).map(Arc::new);
        if let Err(e) = &slot {
            self.failures += 1;
            warn!(path = ?path, error = %e, "图片加载失败，将以空图片继续");
        }
        self.images.insert(path.to_path_buf(), slot.clone());
        slot
    }

    /// 加载图片，失败时返回 `None`
    pub fn image(&mut self, path: &Path) -> Option<Arc<ImageInfo>> {
        self.try_image(path).ok()
    }

    pub fn try_sound(&mut self, path: &Path) -> Result<Arc<SoundInfo>, ResourceError> {
        if let Some(slot) = self.sounds.get(path) {
            self.hits += 1;
            return slot.clone();
        }
        self.misses += 1;
        let slot = self.loader.load_sound(path).map(Arc::new);
        if let Err(e) = &slot {
            self.failures += 1;
            warn!(path = ?path, error = %e, "音频加载失败，将静音继续");
        }
        self.sounds.insert(path.to_path_buf(), slot.clone());
        slot
    }

    /// 加载音频，失败时返回 `None`
    pub fn sound(&mut self, path: &Path) -> Option<Arc<SoundInfo>> {
        self.try_sound(path).ok()
    }

    /// 清空缓存（统计保留）
    pub fn clear(&mut self) {
        self.images.clear();
        self.sounds.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits,
            misses: self.misses,
            failures: self.failures,
        }
    }

    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.failures = 0;
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
