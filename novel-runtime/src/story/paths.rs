//! # 路径解析模块
//!
//! 剧本中的资源路径以**相对于剧本文件所在目录**的形式保存，
//! 加载时解析为绝对路径，保存时再转换回相对路径。
//!
//! 这里只做纯字面量处理，不访问文件系统。

use std::path::{Component, Path, PathBuf};

/// 字面量规范化路径
///
/// 去掉 `.` 组件并折叠 `..` 组件。开头无法折叠的 `..` 会被保留。
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // 根目录之上没有父目录
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// 把剧本中的路径解析为绝对路径
///
/// 已经是绝对路径的保持不变（只做规范化）。
pub fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base_dir.join(path))
    }
}

/// 把绝对路径转换为相对于 `base_dir` 的路径
///
/// 两者没有公共前缀（例如位于不同盘符）时原样返回。
pub fn relativize_path(base_dir: &Path, path: &Path) -> PathBuf {
    if !path.is_absolute() {
        return normalize_path(path);
    }
    let base = normalize_path(base_dir);
    let target = normalize_path(path);

    let base_parts: Vec<_> = base.components().collect();
    let target_parts: Vec<_> = target.components().collect();
    let common = base_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 {
        return target;
    }

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &target_parts[common..] {
        rel.push(part.as_os_str());
    }
    rel
}

/// 可选路径字段的 serde 适配
///
/// 剧本里用空字符串表示"没有"，这里映射为 `None`。
pub(crate) mod opt_path {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::path::PathBuf;

    pub fn serialize<S: Serializer>(path: &Option<PathBuf>, s: S) -> Result<S::Ok, S::Error> {
        match path {
            Some(p) => s.serialize_str(&p.to_string_lossy()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PathBuf>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from))
    }
}

/// 空字符串视为缺省的字符串字段
pub(crate) fn empty_as_none<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
