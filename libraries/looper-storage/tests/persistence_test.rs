//! Integration tests for sidecar persistence and the recent-file registry
//!
//! Every test works on real files in a temporary directory.

use chrono::Utc;
use looper_playback::{LoopMode, Segment, SegmentId, SessionSnapshot};
use looper_storage::{RecentFiles, SidecarStore, VideoMetadata};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

// ===== Test Helpers =====

fn create_video(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn create_snapshot() -> SessionSnapshot {
    let segments: Vec<Segment> = (0..3)
        .map(|i| Segment {
            id: SegmentId::new(),
            name: format!("Segment {}", i + 1),
            start_time: Duration::from_millis(i * 10_000 + 250),
            end_time: Duration::from_millis(i * 10_000 + 4_750),
            order: i as usize,
            created_at: Utc::now(),
        })
        .collect();

    SessionSnapshot {
        last_segment_id: Some(segments[2].id),
        segments,
        loop_mode: LoopMode::SequentialLoop,
        last_position: Duration::from_millis(23_400),
        was_playing_segments: true,
        was_playing_single_segment: true,
    }
}

// ===== Sidecar =====

#[test]
fn test_save_then_load_reproduces_session() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(&dir, "lesson.mp4", &[1u8; 20_000]);
    let store = SidecarStore::default();
    let snapshot = create_snapshot();

    store.save_snapshot(&video, &snapshot).unwrap();
    let loaded = store.load(&video).expect("sidecar should load");

    assert_eq!(loaded.to_snapshot(), snapshot);
    assert_eq!(loaded.video_file_path, video);
    assert_eq!(loaded.video_file_hash.len(), 16);
}

#[test]
fn test_sidecar_is_indented_json_next_to_video() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(&dir, "lesson.mp4", b"frames");
    let store = SidecarStore::default();

    store.save_snapshot(&video, &create_snapshot()).unwrap();
    let path = store.sidecar_path(&video);

    assert_eq!(path, dir.path().join("lesson.mp4.cornieloop"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\n  \"videoFileHash\""));
    assert!(text.contains("\"defaultLoopMode\": \"SequentialLoop\""));
}

#[test]
fn test_changed_video_invalidates_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(&dir, "lesson.mp4", &[1u8; 4096]);
    let store = SidecarStore::default();
    store.save_snapshot(&video, &create_snapshot()).unwrap();

    // Rewrite the leading bytes
    fs::write(&video, [2u8; 4096]).unwrap();

    assert!(store.load(&video).is_none());
    // Stale sidecar is left in place, just ignored
    assert!(store.sidecar_path(&video).exists());
}

#[test]
fn test_change_past_window_goes_unnoticed() {
    let dir = tempfile::tempdir().unwrap();
    let mut content = vec![5u8; 10_000];
    let video = create_video(&dir, "lesson.mp4", &content);
    let store = SidecarStore::default();
    store.save_snapshot(&video, &create_snapshot()).unwrap();

    content[9_000] = 6;
    fs::write(&video, &content).unwrap();

    assert!(store.load(&video).is_some());
}

#[test]
fn test_corrupt_sidecar_loads_none() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(&dir, "lesson.mp4", b"frames");
    let store = SidecarStore::default();

    fs::write(store.sidecar_path(&video), "{ this is not json").unwrap();

    assert!(store.load(&video).is_none());
}

#[test]
fn test_out_of_range_position_loads_none() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(&dir, "lesson.mp4", b"frames");
    let store = SidecarStore::default();
    store.save_snapshot(&video, &create_snapshot()).unwrap();

    // Fingerprint still matches, only the position is garbage
    let sidecar = store.sidecar_path(&video);
    let mut json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
    json["lastPlaybackPosition"] = "99999999999999999:00:00".into();
    fs::write(&sidecar, serde_json::to_string_pretty(&json).unwrap()).unwrap();

    assert!(store.load(&video).is_none());
}

#[test]
fn test_missing_video_invalidates_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(&dir, "lesson.mp4", b"frames");
    let store = SidecarStore::default();
    store.save_snapshot(&video, &create_snapshot()).unwrap();

    fs::remove_file(&video).unwrap();

    assert!(store.load(&video).is_none());
}

#[test]
fn test_save_stamps_last_modified() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(&dir, "lesson.mp4", b"frames");
    let store = SidecarStore::default();

    let mut metadata = VideoMetadata {
        video_file_path: video.clone(),
        last_modified: Utc::now() - chrono::Duration::days(30),
        ..VideoMetadata::default()
    };
    let before = Utc::now();
    store.save(&mut metadata).unwrap();

    assert!(metadata.last_modified >= before);
    assert!(!metadata.video_file_hash.is_empty());
}

#[test]
fn test_save_into_missing_directory_fails() {
    let store = SidecarStore::default();
    let snapshot = create_snapshot();

    let result = store.save_snapshot(Path::new("/nonexistent/dir/lesson.mp4"), &snapshot);

    assert!(result.is_err());
}

// ===== Recent files =====

#[test]
fn test_recent_files_survive_reload() {
    let dir = tempfile::tempdir().unwrap();
    let a = create_video(&dir, "a.mp4", b"a");
    let b = create_video(&dir, "b.mp4", b"b");
    let data_dir = dir.path().join("data");

    let mut recent = RecentFiles::open(&data_dir, 10);
    recent.add(&a).unwrap();
    recent.add(&b).unwrap();

    let reloaded = RecentFiles::open(&data_dir, 10);
    assert_eq!(reloaded.files(), &[b, a]);
}

#[test]
fn test_recent_files_drop_missing_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let kept = create_video(&dir, "kept.mp4", b"k");
    let gone = create_video(&dir, "gone.mp4", b"g");

    let mut recent = RecentFiles::open(dir.path(), 10);
    recent.add(&kept).unwrap();
    recent.add(&gone).unwrap();

    fs::remove_file(&gone).unwrap();

    let reloaded = RecentFiles::open(dir.path(), 10);
    assert_eq!(reloaded.files(), &[kept]);
}

#[test]
fn test_recent_files_written_as_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let video = create_video(&dir, "a.mp4", b"a");

    let mut recent = RecentFiles::open(dir.path(), 10);
    recent.add(&video).unwrap();

    let json = fs::read_to_string(recent.path()).unwrap();
    let parsed: Vec<PathBuf> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, vec![video]);
}
