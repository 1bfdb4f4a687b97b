//! # SaveStore 模块
//!
//! 存档文件管理，负责存档的读写和 slot 管理。
//!
//! ## 文件布局
//!
//! ```text
//! saves/
//! ├── slot_001.json
//! ├── slot_001.png
//! ├── slot_002.json
//! ├── slot_002.png
//! └── ...
//! ```
//!
//! 记录和缩略图都先写临时文件再替换，写到一半退出不会留下半截存档。

mod atomic;

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::Local;
use image::ImageOutputFormat;
use tracing::{debug, info, warn};

use novel_runtime::{Frame, SaveError, SaveRecord, SaveRequest, SaveStore};

use crate::thumbnail::ThumbnailRenderer;

/// 最大存档槽位数
pub const MAX_SAVE_SLOTS: u32 = 999;

/// 存档时间格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 文件系统存档存储
pub struct FsSaveStore {
    /// 存档目录
    saves_dir: PathBuf,
    thumbnails: ThumbnailRenderer,
    /// 固定时间戳（测试用），为 `None` 时使用本地时间
    fixed_timestamp: Option<String>,
}

impl FsSaveStore {
    /// 创建存档存储
    ///
    /// 目录在第一次保存时创建。
    pub fn new(saves_dir: impl AsRef<Path>) -> Self {
        Self {
            saves_dir: saves_dir.as_ref().to_path_buf(),
            thumbnails: ThumbnailRenderer::new(),
            fixed_timestamp: None,
        }
    }

    pub fn with_fixed_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.fixed_timestamp = Some(timestamp.into());
        self
    }

    pub fn saves_dir(&self) -> &Path {
        &self.saves_dir
    }

    /// 确保存档目录存在
    pub fn ensure_dir(&self) -> Result<(), SaveError> {
        if !self.saves_dir.exists() {
            fs::create_dir_all(&self.saves_dir)
                .map_err(|e| SaveError::IoError(format!("无法创建存档目录: {}", e)))?;
        }
        Ok(())
    }

    /// 获取存档文件路径
    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.saves_dir.join(format!("slot_{:03}.json", slot))
    }

    /// 获取缩略图路径
    pub fn thumbnail_path(&self, slot: u32) -> PathBuf {
        self.saves_dir.join(format!("slot_{:03}.png", slot))
    }

    fn timestamp(&self) -> String {
        match &self.fixed_timestamp {
            Some(ts) => ts.clone(),
            None => Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    fn encode_thumbnail(&mut self, frame: &Frame) -> Result<Vec<u8>, SaveError> {
        let image = self.thumbnails.render(frame);
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageOutputFormat::Png)
            .map_err(|e| SaveError::ThumbnailFailed(e.to_string()))?;
        Ok(bytes.into_inner())
    }

    /// 列出所有 `slot_XXX.json` 文件的槽位号
    fn slot_numbers(&self) -> Vec<u32> {
        let Ok(entries) = fs::read_dir(&self.saves_dir) else {
            return Vec::new();
        };
        let mut slots: Vec<u32> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                name.strip_prefix("slot_")?
                    .strip_suffix(".json")?
                    .parse::<u32>()
                    .ok()
            })
            .collect();
        slots.sort_unstable();
        slots
    }

    /// 获取下一个可用的存档槽位
    pub fn next_available_slot(&self) -> Option<u32> {
        (1..=MAX_SAVE_SLOTS).find(|slot| !self.slot_path(*slot).exists())
    }
}

impl SaveStore for FsSaveStore {
    fn save(&mut self, request: &SaveRequest, snapshot: &Frame) -> Result<SaveRecord, SaveError> {
        if request.slot == 0 || request.slot > MAX_SAVE_SLOTS {
            return Err(SaveError::IoError(format!(
                "槽位号超出范围: {} (1 - {})",
                request.slot, MAX_SAVE_SLOTS
            )));
        }
        self.ensure_dir()?;

        let record = SaveRecord::from_request(request, self.timestamp());
        let json = record.to_json()?;
        let png = self.encode_thumbnail(snapshot)?;

        // 槽位以记录文件为准，缩略图先落盘
        let path = self.slot_path(request.slot);
        atomic::write_bytes_atomic(&self.thumbnail_path(request.slot), &png)
            .map_err(|e| SaveError::ThumbnailFailed(e.to_string()))?;
        atomic::write_text_atomic(&path, &json)
            .map_err(|e| SaveError::IoError(format!("无法写入存档文件: {}", e)))?;

        info!(path = ?path, slot = request.slot, "存档保存成功");
        Ok(record)
    }

    fn load(&self, slot: u32) -> Result<SaveRecord, SaveError> {
        let path = self.slot_path(slot);

        if !path.exists() {
            return Err(SaveError::NotFound(path.to_string_lossy().to_string()));
        }

        // 读不出来的存档视为空槽位
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) => {
                warn!(path = ?path, error = %e, "无法读取存档文件");
                return Err(SaveError::NotFound(path.to_string_lossy().to_string()));
            }
        };

        match SaveRecord::from_json(&json) {
            Ok(record) => {
                debug!(path = ?path, "存档读取成功");
                Ok(record)
            }
            // 损坏的存档视为空槽位
            Err(SaveError::DeserializationFailed(e)) => {
                warn!(path = ?path, error = %e, "存档已损坏");
                Err(SaveError::NotFound(path.to_string_lossy().to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn delete(&mut self, slot: u32) -> Result<(), SaveError> {
        for path in [self.slot_path(slot), self.thumbnail_path(slot)] {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| SaveError::IoError(format!("无法删除存档文件: {}", e)))?;
            }
        }
        info!(slot, "存档删除成功");
        Ok(())
    }

    fn list(&self) -> Vec<SaveRecord> {
        self.slot_numbers()
            .into_iter()
            .filter_map(|slot| match self.load(slot) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(slot, error = %e, "跳过无法读取的存档");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novel_runtime::{GameState, ScreenSize};
    use serde_json::json;

    fn request(slot: u32) -> SaveRequest {
        let mut game_state = GameState::new();
        game_state.insert("route".to_string(), json!("alice"));
        game_state.insert("seen_scenes".to_string(), json!(["intro", "chapter_1"]));
        SaveRequest {
            slot,
            scene_id: "chapter_1".to_string(),
            scene_name: "第一章".to_string(),
            dialog_index: 2,
            play_time: 61.0,
            game_state,
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsSaveStore::new(dir.path().join("saves"));
        let frame = Frame::blank(ScreenSize::default());

        let saved = store.save(&request(1), &frame).unwrap();
        assert!(store.slot_path(1).ends_with("slot_001.json"));
        assert!(store.thumbnail_path(1).exists());

        let loaded = store.load(1).unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.dialog_index, 2);
        assert_eq!(loaded.timestamp.len(), "2024-05-01 20:15".len());
        assert_eq!(loaded.game_state["route"], json!("alice"));
        assert_eq!(loaded.game_state["seen_scenes"][1], json!("chapter_1"));
        assert_eq!(loaded.game_state["play_time"], json!(61.0));
    }

    #[test]
    fn test_thumbnail_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsSaveStore::new(dir.path());
        store
            .save(&request(4), &Frame::blank(ScreenSize::default()))
            .unwrap();
        let thumb = image::open(store.thumbnail_path(4)).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (280, 157));
    }

    #[test]
    fn test_delete_removes_pair() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsSaveStore::new(dir.path());
        store
            .save(&request(3), &Frame::blank(ScreenSize::default()))
            .unwrap();
        store.delete(3).unwrap();
        assert!(!store.slot_path(3).exists());
        assert!(!store.thumbnail_path(3).exists());
        // 空槽位删除不报错
        store.delete(3).unwrap();
    }

    #[test]
    fn test_corrupted_save_is_empty_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSaveStore::new(dir.path());
        fs::write(store.slot_path(7), "{ broken").unwrap();

        assert!(store.list().is_empty());
        assert!(matches!(store.load(7), Err(SaveError::NotFound(_))));
    }

    #[test]
    fn test_non_utf8_save_is_empty_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSaveStore::new(dir.path());
        fs::write(store.slot_path(5), [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        assert!(matches!(store.load(5), Err(SaveError::NotFound(_))));
        assert!(!store.exists(5));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_thumbnail_failure_leaves_slot_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsSaveStore::new(dir.path());
        // 缩略图路径被目录占用，写入必然失败
        fs::create_dir(store.thumbnail_path(2)).unwrap();

        let result = store.save(&request(2), &Frame::blank(ScreenSize::default()));
        assert!(matches!(result, Err(SaveError::ThumbnailFailed(_))));
        assert!(!store.slot_path(2).exists());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_slot_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsSaveStore::new(dir.path());
        let frame = Frame::blank(ScreenSize::default());
        assert!(store.save(&request(0), &frame).is_err());
        assert_eq!(store.next_available_slot(), Some(1));
    }
}
