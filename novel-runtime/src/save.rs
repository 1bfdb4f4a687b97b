//! # Save 模块
//!
//! 存档/读档系统的数据模型与存储抽象。
//!
//! ## 设计原则
//!
//! - 存档记录必须可序列化（JSON）
//! - 必须有版本号，读档时拒绝不兼容的主版本
//! - 记录与缩略图共享槽位号，成对写入、成对删除
//!
//! 运行时不做文件 IO：[`SaveStore`] 的文件系统实现在宿主里，
//! 这里只提供内存实现 [`MemorySaveStore`]。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// 存档格式版本
///
/// 版本号含义：
/// - MAJOR: 不兼容的格式变更
/// - MINOR: 向后兼容的新字段
pub const SAVE_VERSION_MAJOR: u32 = 1;
pub const SAVE_VERSION_MINOR: u32 = 0;

/// 存档版本信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveVersion {
    pub major: u32,
    pub minor: u32,
}

impl SaveVersion {
    /// 当前版本
    pub fn current() -> Self {
        Self {
            major: SAVE_VERSION_MAJOR,
            minor: SAVE_VERSION_MINOR,
        }
    }

    /// 检查是否兼容
    ///
    /// 兼容规则：
    /// - major 必须相同
    /// - minor 可以不同（向后兼容）
    pub fn is_compatible(&self) -> bool {
        self.major == SAVE_VERSION_MAJOR
    }
}

impl Default for SaveVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// 随存档保存的游戏状态
///
/// 由调用方自由填写，存储层原样写入、原样读回。保存时会写入
/// `current_scene_id`、`current_dialog_index` 和 `play_time` 三个键。
pub type GameState = serde_json::Map<String, serde_json::Value>;

/// 保存请求（由引擎生成，时间戳由存储层填写）
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// 存档槽位号（1-based）
    pub slot: u32,
    pub scene_id: String,
    pub scene_name: String,
    pub dialog_index: usize,
    pub play_time: f64,
    /// 调用方附带的状态
    pub game_state: GameState,
}

/// 存档记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    /// 存档格式版本
    #[serde(default)]
    pub version: SaveVersion,
    /// 存档槽位号（1-based）
    pub slot: u32,
    pub scene_id: String,
    #[serde(default)]
    pub scene_name: String,
    pub dialog_index: usize,
    /// 保存时间，`%Y-%m-%d %H:%M`
    #[serde(default)]
    pub timestamp: String,
    /// 游戏时长（秒）
    #[serde(default)]
    pub play_time: f64,
    #[serde(default)]
    pub game_state: GameState,
}

impl SaveRecord {
    /// 根据保存请求创建记录
    pub fn from_request(request: &SaveRequest, timestamp: impl Into<String>) -> Self {
        let mut game_state = request.game_state.clone();
        game_state.insert("current_scene_id".to_string(), request.scene_id.clone().into());
        game_state.insert(
            "current_dialog_index".to_string(),
            request.dialog_index.into(),
        );
        game_state.insert("play_time".to_string(), request.play_time.into());

        Self {
            version: SaveVersion::current(),
            slot: request.slot,
            scene_id: request.scene_id.clone(),
            scene_name: request.scene_name.clone(),
            dialog_index: request.dialog_index,
            timestamp: timestamp.into(),
            play_time: request.play_time,
            game_state,
        }
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> Result<String, SaveError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SaveError::SerializationFailed(e.to_string()))
    }

    /// 从 JSON 字符串反序列化
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let record: SaveRecord = serde_json::from_str(json)
            .map_err(|e| SaveError::DeserializationFailed(e.to_string()))?;

        if !record.version.is_compatible() {
            return Err(SaveError::IncompatibleVersion {
                save_version: record.version.to_string(),
                current_version: SaveVersion::current().to_string(),
            });
        }

        Ok(record)
    }

    /// 游戏时长，格式 `HH:MM:SS`
    pub fn format_play_time(&self) -> String {
        let total = self.play_time.max(0.0) as u64;
        format!(
            "{:02}:{:02}:{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }
}

/// 存档错误
#[derive(Debug, Clone, PartialEq)]
pub enum SaveError {
    /// 序列化失败
    SerializationFailed(String),
    /// 反序列化失败
    DeserializationFailed(String),
    /// 版本不兼容
    IncompatibleVersion {
        save_version: String,
        current_version: String,
    },
    /// 文件操作失败
    IoError(String),
    /// 存档不存在
    NotFound(String),
    /// 缩略图生成或写入失败
    ThumbnailFailed(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::SerializationFailed(e) => write!(f, "序列化失败: {}", e),
            SaveError::DeserializationFailed(e) => write!(f, "反序列化失败: {}", e),
            SaveError::IncompatibleVersion {
                save_version,
                current_version,
            } => {
                write!(
                    f,
                    "存档版本不兼容: 存档版本 {} vs 当前版本 {}",
                    save_version, current_version
                )
            }
            SaveError::IoError(e) => write!(f, "文件操作失败: {}", e),
            SaveError::NotFound(slot) => write!(f, "存档不存在: {}", slot),
            SaveError::ThumbnailFailed(e) => write!(f, "缩略图生成失败: {}", e),
        }
    }
}

impl std::error::Error for SaveError {}

/// 存档存储
///
/// `list` 只返回元数据；无法解析的存档视为空槽位，
/// 对这样的槽位 `load` 返回 [`SaveError::NotFound`]。
pub trait SaveStore {
    /// 写入记录和缩略图，返回写入的记录
    fn save(&mut self, request: &SaveRequest, snapshot: &Frame) -> Result<SaveRecord, SaveError>;

    /// 读取记录
    fn load(&self, slot: u32) -> Result<SaveRecord, SaveError>;

    /// 删除记录和缩略图，槽位为空时什么也不做
    fn delete(&mut self, slot: u32) -> Result<(), SaveError>;

    /// 按槽位号升序列出所有可用存档
    fn list(&self) -> Vec<SaveRecord>;

    fn exists(&self, slot: u32) -> bool {
        self.load(slot).is_ok()
    }

    fn has_any_save(&self) -> bool {
        !self.list().is_empty()
    }
}

/// 内存存档存储
///
/// 主要用于测试；时间戳固定为构造时给定的值。
#[derive(Debug, Clone, Default)]
pub struct MemorySaveStore {
    slots: BTreeMap<u32, (SaveRecord, Frame)>,
    timestamp: String,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// 槽位的缩略图来源画面
    pub fn snapshot(&self, slot: u32) -> Option<&Frame> {
        self.slots.get(&slot).map(|(_, frame)| frame)
    }
}

impl SaveStore for MemorySaveStore {
    fn save(&mut self, request: &SaveRequest, snapshot: &Frame) -> Result<SaveRecord, SaveError> {
        let record = SaveRecord::from_request(request, self.timestamp.clone());
        self.slots
            .insert(request.slot, (record.clone(), snapshot.clone()));
        Ok(record)
    }

    fn load(&self, slot: u32) -> Result<SaveRecord, SaveError> {
        self.slots
            .get(&slot)
            .map(|(record, _)| record.clone())
            .ok_or_else(|| SaveError::NotFound(format!("slot {}", slot)))
    }

    fn delete(&mut self, slot: u32) -> Result<(), SaveError> {
        self.slots.remove(&slot);
        Ok(())
    }

    fn list(&self) -> Vec<SaveRecord> {
        self.slots.values().map(|(record, _)| record.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ScreenSize;
    use serde_json::json;

    fn request(slot: u32) -> SaveRequest {
        let mut game_state = GameState::new();
        game_state.insert("flags".to_string(), json!({ "met_alice": true }));
        SaveRequest {
            slot,
            scene_id: "chapter_1".to_string(),
            scene_name: "第一章".to_string(),
            dialog_index: 3,
            play_time: 3725.5,
            game_state,
        }
    }

    #[test]
    fn test_save_version_compatibility() {
        let current = SaveVersion::current();
        assert!(current.is_compatible());
        assert_eq!(current.to_string(), "1.0");

        let newer_minor = SaveVersion { major: 1, minor: 7 };
        assert!(newer_minor.is_compatible());

        let incompatible = SaveVersion { major: 2, minor: 0 };
        assert!(!incompatible.is_compatible());
    }

    #[test]
    fn test_record_json() {
        let record = SaveRecord::from_request(&request(1), "2024-05-01 20:15");
        let json = record.to_json().unwrap();
        assert!(json.contains("chapter_1"));
        assert!(json.contains("game_state"));

        let loaded = SaveRecord::from_json(&json).unwrap();
        assert_eq!(loaded.scene_id, "chapter_1");
        assert_eq!(loaded.dialog_index, 3);
        assert_eq!(loaded.game_state["current_dialog_index"], json!(3));
        assert_eq!(loaded.game_state["play_time"], json!(3725.5));
        assert_eq!(loaded.game_state["flags"], json!({ "met_alice": true }));
    }

    #[test]
    fn test_record_without_game_state() {
        let json = r#"{
            "slot": 4,
            "scene_id": "chapter_2",
            "dialog_index": 0
        }"#;
        let record = SaveRecord::from_json(json).unwrap();
        assert!(record.game_state.is_empty());
        assert_eq!(record.play_time, 0.0);
    }

    #[test]
    fn test_incompatible_version_rejected() {
        let mut record = SaveRecord::from_request(&request(1), "");
        record.version = SaveVersion { major: 9, minor: 0 };
        let json = record.to_json().unwrap();
        assert!(matches!(
            SaveRecord::from_json(&json),
            Err(SaveError::IncompatibleVersion { .. })
        ));
    }

    #[test]
    fn test_corrupted_json() {
        assert!(matches!(
            SaveRecord::from_json("{ not json"),
            Err(SaveError::DeserializationFailed(_))
        ));
    }

    #[test]
    fn test_play_time_format() {
        let record = SaveRecord::from_request(&request(1), "");
        assert_eq!(record.format_play_time(), "01:02:05");
    }

    #[test]
    fn test_memory_store() {
        let frame = Frame::blank(ScreenSize::default());
        let mut store = MemorySaveStore::new().with_timestamp("2024-05-01 20:15");
        assert!(!store.has_any_save());

        let saved = store.save(&request(2), &frame).unwrap();
        let loaded = store.load(2).unwrap();
        assert_eq!(saved, loaded);
        assert_eq!(loaded.timestamp, "2024-05-01 20:15");
        assert_eq!(loaded.game_state["flags"]["met_alice"], json!(true));
        assert!(store.snapshot(2).is_some());
        assert!(store.has_any_save());

        store.delete(2).unwrap();
        assert!(matches!(store.load(2), Err(SaveError::NotFound(_))));
        assert!(store.snapshot(2).is_none());
    }

    #[test]
    fn test_error_display() {
        let err = SaveError::NotFound("slot 3".to_string());
        assert_eq!(err.to_string(), "存档不存在: slot 3");
    }
}
