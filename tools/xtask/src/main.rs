//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 novel-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `story-check`: 检查剧本文件（结构、悬空引用、资源文件）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use novel_runtime::Story;
use walkdir::WalkDir;
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask", about = "开发辅助工具")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,
    /// 运行 novel-runtime 覆盖率报告
    CovRuntime,
    /// 运行 workspace 覆盖率报告
    CovWorkspace,
    /// 检查剧本文件
    ///
    /// 不带参数时检查 assets/ 下所有 .json 剧本
    StoryCheck {
        path: Option<PathBuf>,
        /// 以 JSON 输出检查结果
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    match cli.command {
        Task::CheckAll => {
            step("cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;
            step("cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;
            step("cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        Task::CovRuntime => {
            ensure_cargo_llvm_cov_available(&sh)?;
            step("cargo llvm-cov -p novel-runtime --html");
            cmd!(sh, "cargo llvm-cov -p novel-runtime --html").run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Task::CovWorkspace => {
            ensure_cargo_llvm_cov_available(&sh)?;
            // 排除 xtask 以免稀释信号
            step("cargo llvm-cov --workspace --exclude xtask --html");
            cmd!(sh, "cargo llvm-cov --workspace --exclude xtask --html").run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Task::StoryCheck { path, json } => story_check(path.as_deref(), json)?,
    }

    Ok(())
}

fn step(name: &str) {
    eprintln!("\n==> {name}");
}

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_ok() {
        return Ok(());
    }
    anyhow::bail!(
        "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
    )
}

//=============================================================================
// story-check 命令实现
//=============================================================================

/// 单个剧本的检查结果
#[derive(Default)]
struct StoryReport {
    path: PathBuf,
    error: Option<String>,
    warnings: Vec<String>,
    missing_resources: Vec<PathBuf>,
}

fn story_check(path: Option<&Path>, as_json: bool) -> anyhow::Result<()> {
    let root = path.unwrap_or_else(|| Path::new("assets"));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定剧本路径",
            root.display()
        );
    }

    let files = collect_story_files(root);
    if files.is_empty() {
        eprintln!("未找到剧本文件（.json）");
        return Ok(());
    }

    let reports: Vec<StoryReport> = files.iter().map(|f| check_story_file(f)).collect();

    if as_json {
        let value: Vec<serde_json::Value> = reports
            .iter()
            .map(|r| {
                serde_json::json!({
                    "path": r.path,
                    "error": r.error,
                    "warnings": r.warnings,
                    "missing_resources": r.missing_resources,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_reports(&reports);
    }

    if reports.iter().any(|r| r.error.is_some()) {
        anyhow::bail!("剧本检查发现错误");
    }
    Ok(())
}

/// 收集剧本文件；单个文件直接返回
fn collect_story_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

fn check_story_file(file: &Path) -> StoryReport {
    let mut report = StoryReport {
        path: file.to_path_buf(),
        ..Default::default()
    };

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            report.error = Some(format!("无法读取文件 - {e}"));
            return report;
        }
    };

    let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
    let mut story = match Story::from_json(&content, base_dir) {
        Ok(s) => s,
        Err(e) => {
            report.error = Some(e.to_string());
            return report;
        }
    };
    report.warnings = story
        .dangling_references()
        .iter()
        .map(ToString::to_string)
        .collect();

    let mut missing = Vec::new();
    story.for_each_path_mut(&mut |path: &mut PathBuf| {
        if !path.exists() {
            missing.push(path.clone());
        }
    });
    missing.sort();
    missing.dedup();
    report.missing_resources = missing;

    report
}

fn print_reports(reports: &[StoryReport]) {
    for report in reports {
        let name = report.path.display();
        if let Some(error) = &report.error {
            eprintln!("[ERROR] {name}: {error}");
        }
        for warning in &report.warnings {
            eprintln!("[WARN] {name}: {warning}");
        }
        for path in &report.missing_resources {
            eprintln!("[WARN] {name}: 资源不存在 {}", path.display());
        }
    }

    let error_count = reports.iter().filter(|r| r.error.is_some()).count();
    let warn_count: usize = reports
        .iter()
        .map(|r| r.warnings.len() + r.missing_resources.len())
        .sum();

    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个剧本", reports.len());
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_story_reports_missing_resources() {
        let dir = std::env::temp_dir().join(format!("xtask-story-check-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("story.json");
        std::fs::write(
            &file,
            r#"{
                "start_scene_id": "a",
                "scenes": {
                    "a": { "id": "a", "background": "missing.png", "next_scene_id": "b" }
                }
            }"#,
        )
        .unwrap();

        let report = check_story_file(&file);
        assert!(report.error.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.missing_resources.len(), 1);
        assert!(report.missing_resources[0].ends_with("missing.png"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
