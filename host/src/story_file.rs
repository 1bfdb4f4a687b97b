//! # Story File 模块
//!
//! 从磁盘读取剧本。资源路径以剧本文件所在目录为基准解析。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use novel_runtime::story::DanglingReference;
use novel_runtime::{NovelError, Story};

use crate::error::{HostError, HostResult};

/// 剧本所在目录
pub fn story_base_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// 读取并校验剧本
///
/// 格式错误或结构无效时返回错误；悬空引用只记录警告。
pub fn load_story(path: &Path) -> HostResult<Story> {
    let text = fs::read_to_string(path).map_err(|e| HostError::StoryRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let base_dir = story_base_dir(path);
    let base_dir = fs::canonicalize(&base_dir).unwrap_or(base_dir);
    let story = Story::from_json(&text, &base_dir).map_err(NovelError::from)?;

    info!(
        path = ?path,
        title = %story.title,
        scenes = story.scenes.len(),
        characters = story.characters.len(),
        "剧本加载成功"
    );
    for reference in story.dangling_references() {
        warn!(%reference, "悬空引用");
    }
    Ok(story)
}

/// 读取剧本并列出悬空引用
pub fn check_story(path: &Path) -> HostResult<(Story, Vec<DanglingReference>)> {
    let story = load_story(path)?;
    let dangling = story.dangling_references();
    Ok((story, dangling))
}
