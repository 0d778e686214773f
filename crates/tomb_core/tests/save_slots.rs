use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tomb_core::codec::Record;
use tomb_core::cursor::{ByteCursor, SkipAccounting};
use tomb_core::gameflow::GameFlow;
use tomb_core::hooks::{CountedInventory, NoopHooks};
use tomb_core::object::ObjectId;
use tomb_core::player::PointerTables;
use tomb_core::session::{GameSession, LevelState, TITLE_SIZE};
use tomb_core::storage::{DiskFileSystem, MemoryFileSystem};
use tomb_core::summary::SaveSummary;
use tomb_core::{SaveError, start_info::StartInfo};

fn session_on(level: u16) -> GameSession {
    let mut session = GameSession::new(GameFlow::default()).with_level(LevelState {
        tables: PointerTables::new(vec![0], vec![0], 0),
        ..LevelState::default()
    });
    session.current_level = level;
    session
}

fn slot_file(title: &str, counter: i32) -> Vec<u8> {
    let mut buf = vec![0u8; TITLE_SIZE + 4];
    let mut c = ByteCursor::new(&mut buf[..], SkipAccounting::Counted);
    c.write_fixed_string(title, TITLE_SIZE).unwrap();
    c.write_i32(counter).unwrap();
    buf
}

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}_{}_{}", std::process::id(), nanos));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

#[test]
fn save_writes_only_consumed_bytes() {
    let fs = MemoryFileSystem::new();
    let mut session = session_on(5);
    session.save_counter = 11;
    session
        .save_to_file(&fs, 2, &CountedInventory::new())
        .unwrap();

    let written = fs.get("saveati.2").unwrap();
    assert_eq!(written.len(), session.filled().len());
    assert!(written.len() < session.buffer().len());
    assert_eq!(&written[..], session.filled());

    assert_eq!(session.save_counter, 12);
    assert_eq!(session.saved_games_count, 1);
    assert!(!session.slots.is_blocked(2));
    assert_eq!(session.slots.entries[2].text, "St. Francis' Folly 11");
}

#[test]
fn header_only_returns_saved_level() {
    let fs = MemoryFileSystem::new();
    let mut saver = session_on(9);
    saver.save_to_file(&fs, 0, &CountedInventory::new()).unwrap();

    let mut loader = session_on(1);
    assert_eq!(loader.load_header_only(&fs, 0).unwrap(), 9);
    assert_eq!(&loader.buffer()[..saver.filled().len()], saver.filled());
}

#[test]
fn header_only_fails_for_missing_file_and_bad_slot() {
    let fs = MemoryFileSystem::new();
    let mut session = session_on(1);
    assert!(matches!(
        session.load_header_only(&fs, 4),
        Err(SaveError::Open { .. })
    ));
    assert!(matches!(
        session.load_header_only(&fs, 16),
        Err(SaveError::InvalidSlot { slot: 16, count: 16 })
    ));
}

#[test]
fn failed_open_leaves_no_file_and_counters_unchanged() {
    let fs = MemoryFileSystem::new();
    fs.lock("saveati.1");
    let mut session = session_on(3);
    session.save_counter = 4;

    let err = session
        .save_to_file(&fs, 1, &CountedInventory::new())
        .unwrap_err();
    assert!(matches!(err, SaveError::Open { .. }));
    assert!(!fs.contains("saveati.1"));
    assert_eq!(session.save_counter, 4);
    assert_eq!(session.saved_games_count, 0);
}

#[test]
fn overflow_never_touches_the_slot_file() {
    let fs = MemoryFileSystem::new();
    fs.insert("saveati.0", vec![1, 2, 3]);
    let mut flow = GameFlow::default();
    flow.save.buffer_capacity = 64;
    let mut session = GameSession::new(flow);

    let err = session
        .save_to_file(&fs, 0, &CountedInventory::new())
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(fs.get("saveati.0").unwrap(), vec![1, 2, 3]);
}

#[test]
fn swapped_gameflow_with_other_level_count_is_rejected() {
    let fs = MemoryFileSystem::new();
    let mut session = session_on(3);
    session.flow.levels.truncate(8);

    assert!(matches!(
        session.fill_buffer(&CountedInventory::new()),
        Err(SaveError::Config(_))
    ));
    let err = session
        .save_to_file(&fs, 0, &CountedInventory::new())
        .unwrap_err();
    assert!(matches!(err, SaveError::Config(_)));
    assert!(!err.is_fatal());
    assert!(!fs.contains("saveati.0"));
    assert_eq!(session.save_counter, 0);

    assert!(matches!(
        session.apply_buffer(&mut CountedInventory::new(), &mut NoopHooks),
        Err(SaveError::Config(_))
    ));
}

#[test]
fn scan_marks_present_slots_and_requests_newest() {
    let fs = MemoryFileSystem::new();
    fs.insert("saveati.0", slot_file("Caves", 3));
    fs.insert("saveati.2", slot_file("Lost Valley", 8));

    let mut session = session_on(1);
    session.scan_saved_games(&fs);

    let slots = &session.slots;
    assert_eq!(slots.entries.len(), 16);
    assert!(!slots.is_blocked(0));
    assert!(slots.is_blocked(1));
    assert!(!slots.is_blocked(2));
    assert!(slots.is_blocked(3));
    assert_eq!(slots.entries[0].text, "Caves 3");
    assert_eq!(slots.entries[2].text, "Lost Valley 8");
    assert_eq!(slots.entries[1].text, "- EMPTY SLOT 2 -");
    assert_eq!(slots.requested, 2);
    assert_eq!(session.saved_games_count, 2);
    assert_eq!(session.save_counter, 9);
}

#[test]
fn scan_scrolls_to_a_requested_slot_below_the_fold() {
    let fs = MemoryFileSystem::new();
    fs.insert("saveati.1", slot_file("Caves", 1));
    fs.insert("saveati.12", slot_file("Atlantis", 40));

    let mut session = session_on(1);
    session.scan_saved_games(&fs);
    assert_eq!(session.slots.requested, 12);
    assert_eq!(session.slots.line_offset, 12 + 1 - session.slots.visible_lines);
}

#[test]
fn scan_tolerates_truncated_slot_files() {
    let fs = MemoryFileSystem::new();
    fs.insert("saveati.0", b"Cav".to_vec());

    let mut session = session_on(1);
    session.scan_saved_games(&fs);
    assert!(!session.slots.is_blocked(0));
    assert_eq!(session.slots.entries[0].text, "Cav 0");
    assert_eq!(session.save_counter, 1);
}

#[test]
fn save_then_scan_then_load_on_disk() {
    let dir = temp_dir("tomb_save_slots");
    let disk = DiskFileSystem::new(&dir);

    let mut saver = session_on(6);
    saver.info.kills = 17;
    saver.save_counter = 3;
    let inventory = CountedInventory::new().with_item(ObjectId::KEY_ITEM2, 1);
    saver.save_to_file(&disk, 5, &inventory).unwrap();

    let on_disk = fs::read(dir.join("saveati.5")).unwrap();
    let summary = SaveSummary::decode(&on_disk, saver.flow.level_count()).unwrap();
    assert_eq!(summary.title, "Colosseum");
    assert_eq!(summary.counter, 3);
    assert_eq!(summary.level, 6);
    assert_eq!(summary.kills, 17);
    assert_eq!(summary.item_stats.key2, 1);
    assert_eq!(summary.start.len(), saver.flow.level_count());
    assert_eq!(
        on_disk.len(),
        TITLE_SIZE + 4 + saver.flow.level_count() * StartInfo::SIZE + 14 + 12 + 4 + 10 + 236 + 8
    );

    let mut loader = session_on(1);
    loader.scan_saved_games(&disk);
    assert_eq!(loader.slots.requested, 5);
    assert_eq!(loader.save_counter, 4);

    loader.current_level = loader.load_header_only(&disk, 5).unwrap();
    let mut loaded_inventory = CountedInventory::new();
    loader
        .apply_buffer(&mut loaded_inventory, &mut NoopHooks)
        .unwrap();
    assert_eq!(loader.info.kills, 17);
    assert_eq!(loader.current_level, 6);

    fs::remove_dir_all(&dir).ok();
}
