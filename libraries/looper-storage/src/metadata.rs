//! Persisted per-video metadata
//!
//! One record per video, stored next to it as a sidecar. Field names are
//! camelCase and durations use the timespan text form so records written by
//! earlier releases keep loading.

use chrono::{DateTime, Utc};
use looper_playback::{LoopMode, Segment, SegmentId, SessionSnapshot};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sidecar record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoMetadata {
    pub video_file_path: PathBuf,

    /// Fingerprint of the video's leading bytes, stamped on save
    pub video_file_hash: String,

    pub segments: Vec<SegmentRecord>,

    #[serde(with = "loop_mode_repr")]
    pub default_loop_mode: LoopMode,

    pub last_modified: DateTime<Utc>,

    #[serde(with = "crate::timespan")]
    pub last_playback_position: Duration,

    pub was_playing_segments: bool,
    pub was_playing_single_segment: bool,
    pub last_playing_segment_id: Option<SegmentId>,
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self {
            video_file_path: PathBuf::new(),
            video_file_hash: String::new(),
            segments: Vec::new(),
            default_loop_mode: LoopMode::Single,
            last_modified: Utc::now(),
            last_playback_position: Duration::ZERO,
            was_playing_segments: false,
            was_playing_single_segment: false,
            last_playing_segment_id: None,
        }
    }
}

impl VideoMetadata {
    /// Build a record from the live session
    pub fn from_snapshot(video: &Path, snapshot: &SessionSnapshot) -> Self {
        Self {
            video_file_path: video.to_path_buf(),
            video_file_hash: String::new(),
            segments: snapshot.segments.iter().map(SegmentRecord::from).collect(),
            default_loop_mode: snapshot.loop_mode,
            last_modified: Utc::now(),
            last_playback_position: snapshot.last_position,
            was_playing_segments: snapshot.was_playing_segments,
            was_playing_single_segment: snapshot.was_playing_single_segment,
            last_playing_segment_id: snapshot.last_segment_id,
        }
    }

    /// Session state to restore on load
    pub fn to_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            segments: self.segments.iter().map(Segment::from).collect(),
            loop_mode: self.default_loop_mode,
            last_position: self.last_playback_position,
            was_playing_segments: self.was_playing_segments,
            was_playing_single_segment: self.was_playing_single_segment,
            last_segment_id: self.last_playing_segment_id,
        }
    }
}

/// Segment as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRecord {
    pub id: SegmentId,

    #[serde(default)]
    pub name: String,

    #[serde(with = "crate::timespan")]
    pub start_time: Duration,

    #[serde(with = "crate::timespan")]
    pub end_time: Duration,

    #[serde(default)]
    pub order: usize,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl From<&Segment> for SegmentRecord {
    fn from(segment: &Segment) -> Self {
        Self {
            id: segment.id,
            name: segment.name.clone(),
            start_time: segment.start_time,
            end_time: segment.end_time,
            order: segment.order,
            created_at: segment.created_at,
        }
    }
}

impl From<&SegmentRecord> for Segment {
    fn from(record: &SegmentRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            start_time: record.start_time,
            end_time: record.end_time,
            order: record.order,
            created_at: record.created_at,
        }
    }
}

/// Loop mode written by name, read by name or by numeric index
mod loop_mode_repr {
    use looper_playback::LoopMode;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Name(String),
        Index(u8),
    }

    pub fn serialize<S>(mode: &LoopMode, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        mode.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<LoopMode, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Name(name) => name.parse().map_err(serde::de::Error::custom),
            Repr::Index(0) => Ok(LoopMode::Single),
            Repr::Index(1) => Ok(LoopMode::Sequential),
            Repr::Index(2) => Ok(LoopMode::Random),
            Repr::Index(3) => Ok(LoopMode::SequentialLoop),
            Repr::Index(other) => Err(serde::de::Error::custom(format!(
                "unknown loop mode index: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_segment(order: usize) -> Segment {
        Segment {
            id: SegmentId::new(),
            name: format!("Segment {}", order + 1),
            start_time: Duration::from_millis(1500 + order as u64 * 10_000),
            end_time: Duration::from_millis(4250 + order as u64 * 10_000),
            order,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn json_uses_camel_case_and_timespans() {
        let snapshot = SessionSnapshot {
            segments: vec![sample_segment(0)],
            loop_mode: LoopMode::SequentialLoop,
            last_position: Duration::from_secs(65),
            was_playing_segments: true,
            was_playing_single_segment: false,
            last_segment_id: None,
        };
        let metadata = VideoMetadata::from_snapshot(Path::new("/videos/a.mp4"), &snapshot);

        let json = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["videoFilePath"], "/videos/a.mp4");
        assert_eq!(json["defaultLoopMode"], "SequentialLoop");
        assert_eq!(json["lastPlaybackPosition"], "00:01:05");
        assert_eq!(json["wasPlayingSegments"], true);
        assert_eq!(json["segments"][0]["startTime"], "00:00:01.5000000");
        assert_eq!(json["segments"][0]["endTime"], "00:00:04.2500000");
        assert!(json["lastPlayingSegmentId"].is_null());
    }

    #[test]
    fn snapshot_round_trip_is_lossless() {
        let segments = vec![sample_segment(0), sample_segment(1)];
        let snapshot = SessionSnapshot {
            last_segment_id: Some(segments[1].id),
            segments,
            loop_mode: LoopMode::Random,
            last_position: Duration::from_millis(12_345),
            was_playing_segments: true,
            was_playing_single_segment: true,
        };

        let metadata = VideoMetadata::from_snapshot(Path::new("/videos/a.mp4"), &snapshot);
        let json = serde_json::to_string_pretty(&metadata).unwrap();
        let parsed: VideoMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, metadata);
        assert_eq!(parsed.to_snapshot(), snapshot);
    }

    #[test]
    fn reads_numeric_loop_mode_and_missing_fields() {
        let json = r#"{
            "videoFilePath": "C:\\videos\\a.mp4",
            "videoFileHash": "ABCDEF0123456789",
            "segments": [{
                "id": "6f1c2a8e-1d7b-4c8e-9a53-2f1d0c7b9e11",
                "name": "Intro",
                "startTime": "00:00:10",
                "endTime": "00:00:20.5",
                "order": 0,
                "createdAt": "2024-03-01T10:15:30.1234567+08:00"
            }],
            "defaultLoopMode": 3,
            "lastModified": "2024-03-01T10:20:00+08:00",
            "lastPlaybackPosition": "00:02:00"
        }"#;

        let metadata: VideoMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(metadata.default_loop_mode, LoopMode::SequentialLoop);
        assert_eq!(metadata.segments[0].end_time, Duration::from_millis(20_500));
        assert!(!metadata.was_playing_segments);
        assert_eq!(metadata.last_playing_segment_id, None);
    }

    #[test]
    fn rejects_unknown_loop_mode() {
        let json = r#"{ "defaultLoopMode": "Shuffle" }"#;
        assert!(serde_json::from_str::<VideoMetadata>(json).is_err());
    }
}
