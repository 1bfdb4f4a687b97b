//! # Error 模块
//!
//! 定义 novel-runtime 中使用的错误类型。

use thiserror::Error;

use crate::resources::ResourceError;
use crate::save::SaveError;

/// 剧本加载错误
///
/// 剧本在加载阶段就必须完整可用，任何一个错误都会让加载失败。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoryError {
    /// JSON 格式错误或缺少必需字段
    #[error("剧本解析失败（第 {line} 行，第 {column} 列）：{message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// 序列化失败
    #[error("剧本序列化失败：{message}")]
    Serialize { message: String },

    /// 没有配置起始场景
    #[error("剧本没有配置 start_scene_id")]
    MissingStartScene,

    /// 起始场景不存在
    #[error("起始场景 '{scene_id}' 不存在")]
    UnknownStartScene { scene_id: String },

    /// 场景 id 为空
    #[error("场景键 '{key}' 对应的场景 id 为空")]
    EmptySceneId { key: String },

    /// 场景表的键与场景 id 不一致
    #[error("场景键 '{key}' 与场景 id '{id}' 不一致")]
    SceneIdMismatch { key: String, id: String },

    /// 角色表的键与角色 id 不一致
    #[error("角色键 '{key}' 与角色 id '{id}' 不一致")]
    CharacterIdMismatch { key: String, id: String },

    /// 关键帧时间为负数或不是有限值
    #[error("场景 '{scene_id}' 中存在无效的关键帧时间 {time}")]
    InvalidKeyframeTime { scene_id: String, time: f32 },
}

impl From<serde_json::Error> for StoryError {
    fn from(e: serde_json::Error) -> Self {
        StoryError::Parse {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }
    }
}

/// 运行时错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 场景未找到
    #[error("场景 '{scene_id}' 未找到")]
    SceneNotFound { scene_id: String },

    /// 无效的选择索引
    #[error("无效的选择索引 {index}，有效范围是 0..{max}")]
    InvalidChoiceIndex { index: usize, max: usize },

    /// 状态不匹配
    #[error("当前状态不允许此操作：期望 {expected}，实际 {actual}")]
    StateMismatch { expected: String, actual: String },
}

/// novel-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NovelError {
    /// 剧本错误
    #[error("剧本错误: {0}")]
    Story(#[from] StoryError),

    /// 运行时错误
    #[error("运行时错误: {0}")]
    Runtime(#[from] RuntimeError),

    /// 存档错误
    #[error("存档错误: {0}")]
    Save(#[from] SaveError),

    /// 资源错误
    #[error("资源错误: {0}")]
    Resource(#[from] ResourceError),
}

/// Result 类型别名
pub type NovelResult<T> = Result<T, NovelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_keeps_position() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err();
        let story_err = StoryError::from(err);
        match story_err {
            StoryError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("意外的错误类型: {other:?}"),
        }
    }

    #[test]
    fn test_unified_error_conversion() {
        let err: NovelError = RuntimeError::SceneNotFound {
            scene_id: "missing".to_string(),
        }
        .into();
        assert!(err.to_string().contains("missing"));
    }
}
