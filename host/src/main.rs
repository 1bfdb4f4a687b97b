//! `novel` 命令行
//!
//! - `novel run <story.json>`：headless 运行剧本
//! - `novel slots`：列出存档
//! - `novel check <story.json>`：校验剧本

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use novel_host::{
    AppConfig, AudioDispatcher, Autopilot, FrameSink, FsSaveStore, HostError, HostResult,
    InputSource, JsonLinesSink, LoopConfig, ManualClock, NoInput, NullAudio, NullSink,
    RuntimeLoop, ScriptedInput, SystemClock, check_story, open_engine,
};
use novel_runtime::SaveStore;

#[derive(Parser, Debug)]
#[command(name = "novel", about = "视觉小说播放器（headless）")]
struct Cli {
    /// 配置文件
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// 日志级别，覆盖配置文件
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 运行剧本
    Run(RunArgs),
    /// 列出存档
    Slots {
        /// 存档目录
        #[arg(long)]
        saves: Option<PathBuf>,
    },
    /// 校验剧本
    Check {
        story: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// 剧本文件，未指定时使用配置中的 story_path
    story: Option<PathBuf>,

    /// 存档目录
    #[arg(long)]
    saves: Option<PathBuf>,

    /// 输入脚本
    #[arg(long, conflicts_with = "autoplay")]
    input: Option<PathBuf>,

    /// 自动播放
    #[arg(long)]
    autoplay: bool,

    /// 模拟时间上限（秒）
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f64,

    /// 以 JSON Lines 输出画面
    #[arg(long)]
    frames: Option<PathBuf>,

    /// 按真实时间运行
    #[arg(long)]
    realtime: bool,

    /// 允许调试跳转
    #[arg(long)]
    scene_jump: bool,
}

fn init_logging(level: &str) {
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        AppConfig::load(&cli.config)
    } else {
        AppConfig::default()
    };
    if let Some(level) = &cli.log_level {
        config.debug.log_level = level.clone();
    }
    init_logging(&config.debug.log_level);

    let result = match cli.command {
        Command::Run(args) => run(config, args),
        Command::Slots { saves } => slots(config, saves),
        Command::Check { story } => check(story),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "运行失败");
            ExitCode::FAILURE
        }
    }
}

fn run(mut config: AppConfig, args: RunArgs) -> HostResult<ExitCode> {
    if args.saves.is_some() {
        config.saves_dir = args.saves;
    }
    if args.scene_jump {
        config.debug.scene_jump = true;
    }
    config.validate()?;

    let story_path = args
        .story
        .or_else(|| config.story_path.clone())
        .ok_or_else(|| {
            HostError::Config(novel_host::ConfigError::ValidationFailed(
                "未指定剧本文件".to_string(),
            ))
        })?;

    let mut engine = open_engine(&story_path, &config)?;

    let mut input: Box<dyn InputSource> = match (&args.input, args.autoplay) {
        (Some(path), _) => Box::new(ScriptedInput::load(path)?),
        (None, true) => Box::new(Autopilot::default()),
        (None, false) => Box::new(NoInput),
    };
    let mut sink: Box<dyn FrameSink> = match &args.frames {
        Some(path) => {
            let file = File::create(path).map_err(|e| HostError::FrameSink(e.to_string()))?;
            Box::new(JsonLinesSink::new(BufWriter::new(file)))
        }
        None => Box::new(NullSink),
    };
    let mut audio = AudioDispatcher::new(Box::new(NullAudio));

    let max_sim_time = (args.max_seconds.is_finite() && args.max_seconds > 0.0)
        .then(|| Duration::from_secs_f64(args.max_seconds));
    let loop_config = LoopConfig::from(&config.tick).with_max_sim_time(max_sim_time);

    let mut runtime = RuntimeLoop::new(
        loop_config,
        &mut engine,
        input.as_mut(),
        &mut audio,
        sink.as_mut(),
    );
    let summary = if args.realtime {
        runtime.run(&mut SystemClock::new())?
    } else {
        runtime.run(&mut ManualClock::new())?
    };

    info!(
        ticks = summary.ticks,
        play_time = summary.play_time,
        scene = ?summary.final_scene,
        "运行结束"
    );
    Ok(ExitCode::SUCCESS)
}

fn slots(config: AppConfig, saves: Option<PathBuf>) -> HostResult<ExitCode> {
    let dir = saves
        .or(config.saves_dir)
        .unwrap_or_else(|| PathBuf::from("saves"));
    let store = FsSaveStore::new(&dir);
    let records = store.list();
    if records.is_empty() {
        println!("{:?} 中没有存档", dir);
    }
    for record in records {
        println!(
            "{:03}  {}  {}  {}  (第 {} 行)",
            record.slot,
            record.timestamp,
            record.format_play_time(),
            record.scene_name,
            record.dialog_index + 1
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn check(story: PathBuf) -> HostResult<ExitCode> {
    let (story, dangling) = check_story(&story)?;
    println!(
        "《{}》: {} 个场景, {} 个角色",
        story.title,
        story.scenes.len(),
        story.characters.len()
    );
    if dangling.is_empty() {
        println!("没有悬空引用");
        return Ok(ExitCode::SUCCESS);
    }
    for reference in &dangling {
        println!("  - {}", reference);
    }
    Ok(ExitCode::from(2))
}
