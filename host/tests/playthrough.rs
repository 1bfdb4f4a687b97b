//! 完整播放流程测试：剧本文件 → 引擎 → 主循环（手动时钟）

use std::fs;
use std::path::Path;
use std::time::Duration;

use novel_host::{
    AppConfig, AudioDispatcher, Autopilot, JsonLinesSink, LoopConfig, ManualClock, NullSink,
    RecordingAudio, RuntimeLoop, ScriptedInput, StopReason, open_engine,
};
use novel_runtime::{AudioCommand, EngineMode};

const STORY: &str = r##"{
    "title": "雨夜",
    "start_scene_id": "intro",
    "characters": {
        "alice": { "id": "alice", "name": "爱丽丝", "color": "#ffccaa" }
    },
    "scenes": {
        "intro": {
            "id": "intro",
            "name": "序章",
            "background_color": [20, 20, 40],
            "music": "bgm.ogg",
            "dialogs": [
                { "text": "雨下了一整夜。", "typing_speed": 0 },
                { "character_id": "alice", "text": "要出门吗？", "typing_speed": 0 }
            ],
            "choices": [
                { "text": "出门", "next_scene_id": "outside" },
                { "text": "留下", "next_scene_id": "home" }
            ]
        },
        "outside": {
            "id": "outside",
            "name": "街道",
            "dialogs": [{ "text": "街上空无一人。", "typing_speed": 0 }]
        },
        "home": {
            "id": "home",
            "name": "房间",
            "dialogs": [{ "text": "炉火很暖。", "typing_speed": 0 }]
        }
    }
}"##;

fn write_story(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("story.json");
    fs::write(&path, STORY).unwrap();
    fs::write(dir.join("bgm.ogg"), b"OggS fake").unwrap();
    path
}

fn config() -> LoopConfig {
    LoopConfig::default().with_max_sim_time(Some(Duration::from_secs(120)))
}

#[test]
fn test_autopilot_reaches_ending() {
    let dir = tempfile::tempdir().unwrap();
    let story_path = write_story(dir.path());
    let mut engine = open_engine(&story_path, &AppConfig::default()).unwrap();

    let recording = RecordingAudio::new();
    let mut audio = AudioDispatcher::new(Box::new(recording.clone()));
    let mut input = Autopilot::new(0.2);
    let mut sink = NullSink;

    let summary = RuntimeLoop::new(config(), &mut engine, &mut input, &mut audio, &mut sink)
        .run(&mut ManualClock::new())
        .unwrap();

    assert_eq!(summary.reason, StopReason::EngineStopped);
    assert_eq!(summary.final_mode, EngineMode::Stopped);
    // 自动播放总是选第一个选项
    assert_eq!(summary.final_scene.as_deref(), Some("outside"));
    assert!(summary.play_time > 0.0);
    assert!(summary.sim_seconds >= summary.play_time);

    let log = recording.log();
    assert!(
        log.iter()
            .any(|c| matches!(c, AudioCommand::SetVolume { .. }))
    );
    assert!(log.iter().any(|c| match c {
        AudioCommand::PlayMusic { path, looping } => *looping && path.ends_with("bgm.ogg"),
        _ => false,
    }));
    assert_eq!(audio.failures(), 0);
}

#[test]
fn test_scripted_input_picks_second_choice() {
    let dir = tempfile::tempdir().unwrap();
    let story_path = write_story(dir.path());
    let mut engine = open_engine(&story_path, &AppConfig::default()).unwrap();

    let mut input = ScriptedInput::parse(
        "# 开始游戏\n\
         0.1 confirm\n\
         0.5 confirm\n\
         1.0 confirm\n\
         1.5 select 1\n\
         2.0 confirm\n\
         3.0 quit\n",
    )
    .unwrap();
    let mut audio = AudioDispatcher::new(Box::new(RecordingAudio::new()));
    let mut sink = JsonLinesSink::new(Vec::new());

    let summary = RuntimeLoop::new(config(), &mut engine, &mut input, &mut audio, &mut sink)
        .run(&mut ManualClock::new())
        .unwrap();

    assert_eq!(summary.reason, StopReason::EngineStopped);
    assert_eq!(summary.final_scene.as_deref(), Some("home"));

    // 只记录变化的画面
    assert!(sink.written() > 1);
    assert!(sink.written() < summary.ticks);
    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert!(text.lines().any(|line| line.contains("炉火很暖")));
}

#[test]
fn test_time_limit_stops_idle_engine() {
    let dir = tempfile::tempdir().unwrap();
    let story_path = write_story(dir.path());
    let mut engine = open_engine(&story_path, &AppConfig::default()).unwrap();

    let mut input = novel_host::NoInput;
    let mut audio = AudioDispatcher::new(Box::new(RecordingAudio::new()));
    let mut sink = NullSink;
    let loop_config = LoopConfig::default().with_max_sim_time(Some(Duration::from_secs(2)));

    let summary = RuntimeLoop::new(loop_config, &mut engine, &mut input, &mut audio, &mut sink)
        .run(&mut ManualClock::new())
        .unwrap();

    assert_eq!(summary.reason, StopReason::TimeLimit);
    assert_eq!(summary.final_mode, EngineMode::MainMenu);
    assert!((120..=121).contains(&summary.ticks));
    // 主菜单中不计游戏时间
    assert_eq!(summary.play_time, 0.0);
}
