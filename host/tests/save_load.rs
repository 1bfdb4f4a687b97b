//! 暂停菜单存档与读档，落盘到临时目录

use std::fs;
use std::path::{Path, PathBuf};

use novel_host::{FsResourceLoader, FsSaveStore, load_story};
use novel_runtime::{EngineMode, EngineOptions, InputEvent, InputSnapshot, NovelEngine, ScenePhase};

const STORY: &str = r##"{
    "title": "存档测试",
    "start_scene_id": "day1",
    "scenes": {
        "day1": {
            "id": "day1",
            "name": "第一天",
            "dialogs": [
                { "text": "早上。", "typing_speed": 0 },
                { "text": "中午。", "typing_speed": 0 },
                { "text": "晚上。", "typing_speed": 0 }
            ],
            "next_scene_id": "day2"
        },
        "day2": {
            "id": "day2",
            "dialogs": [{ "text": "第二天。", "typing_speed": 0 }]
        }
    }
}"##;

fn write_story(dir: &Path) -> PathBuf {
    let path = dir.join("story.json");
    fs::write(&path, STORY).unwrap();
    path
}

fn engine(story_path: &Path, saves_dir: &Path) -> NovelEngine {
    NovelEngine::new(
        load_story(story_path).unwrap(),
        Box::new(FsResourceLoader::new()),
        Box::new(FsSaveStore::new(saves_dir).with_fixed_timestamp("2024-05-01 09:30")),
        EngineOptions::default(),
    )
    .unwrap()
}

fn press(engine: &mut NovelEngine, event: InputEvent) {
    engine.tick(&InputSnapshot::single(event), 1.0 / 60.0);
}

#[test]
fn test_pause_save_then_load_in_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let story_path = write_story(dir.path());
    let saves_dir = dir.path().join("saves");

    let mut first = engine(&story_path, &saves_dir);
    press(&mut first, InputEvent::Confirm); // 开始游戏
    press(&mut first, InputEvent::Confirm);
    press(&mut first, InputEvent::Confirm);
    assert_eq!(first.scene().dialog_index(), 2);

    press(&mut first, InputEvent::Back);
    assert_eq!(first.mode(), EngineMode::Paused);
    first.save_to_slot(3).unwrap();

    assert!(saves_dir.join("slot_003.json").exists());
    let thumbnail = image::open(saves_dir.join("slot_003.png")).unwrap();
    assert_eq!(thumbnail.width(), novel_host::thumbnail::THUMBNAIL_WIDTH);
    assert_eq!(thumbnail.height(), novel_host::thumbnail::THUMBNAIL_HEIGHT);

    let record = first.saves().load(3).unwrap();
    assert_eq!(record.scene_name, "第一天");
    assert_eq!(record.dialog_index, 2);
    assert_eq!(record.timestamp, "2024-05-01 09:30");

    let mut second = engine(&story_path, &saves_dir);
    assert_eq!(second.mode(), EngineMode::MainMenu);
    assert!(second.saves().has_any_save());
    second.load_slot(3).unwrap();

    assert_eq!(second.mode(), EngineMode::Playing);
    assert_eq!(second.scene().current_scene_id(), Some("day1"));
    assert_eq!(second.scene().dialog_index(), 2);
    assert_eq!(second.scene().phase(), ScenePhase::Dialog);

    // 读档后继续推进到下一场景
    press(&mut second, InputEvent::Confirm);
    assert_eq!(second.scene().current_scene_id(), Some("day2"));
}

#[test]
fn test_corrupt_slot_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let story_path = write_story(dir.path());
    let saves_dir = dir.path().join("saves");
    fs::create_dir_all(&saves_dir).unwrap();
    fs::write(saves_dir.join("slot_001.json"), "{ not json").unwrap();

    let mut session = engine(&story_path, &saves_dir);
    assert!(session.saves().list().is_empty());
    assert!(session.load_slot(1).is_err());
    assert_eq!(session.mode(), EngineMode::MainMenu);
}
