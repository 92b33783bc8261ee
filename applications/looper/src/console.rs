//! Line-oriented command console
//!
//! Parses stdin lines into commands and renders engine events as text.
//! Segment and recent-file numbers are 1-based, in display order.

use looper_desktop::{EngineCommand, EngineError, EngineStatus};
use looper_playback::{
    format_time, format_time_precise, LoopMode, PlaybackEvent, PlaybackStateEvent, SegmentId,
};
use std::path::PathBuf;
use std::time::Duration;

pub const HELP: &str = "\
Commands:
  open <path>          open a video
  play | pause | toggle | stop
  seek <+/-secs>       relative seek
  goto <percent>       jump to a timeline position
  start | end          mark segment start / end
  hold | release       hold-to-record a segment
  segments             list segments
  loop <n>             loop segment n
  all                  toggle looping the whole list
  next | prev          loop the next / previous segment
  mode <name>|cycle    single, sequential, random, loop
  rename <n> <name>    rename segment n
  delete <n>           delete segment n
  volume <n>|+<n>|-<n> set or adjust volume
  mute                 toggle mute
  recent [n|clear]     list, open or clear recent files
  status               show playback status
  save                 save the current video's state
  quit";

/// Parsed console command
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Open(PathBuf),
    Play,
    Pause,
    Toggle,
    Stop,
    Seek(f64),
    Goto(f64),
    MarkStart,
    MarkEnd,
    Hold,
    Release,
    Segments,
    Loop(usize),
    All,
    Next,
    Prev,
    Mode(LoopMode),
    CycleMode,
    Rename(usize, String),
    Delete(usize),
    SetVolume(i32),
    AdjustVolume(i32),
    Mute,
    Recent,
    OpenRecent(usize),
    ClearRecent,
    Status,
    Save,
    Help,
    Quit,
}

/// Parse one input line; `Ok(None)` for blank lines
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "open" => ConsoleCommand::Open(PathBuf::from(required(rest, "path")?)),
        "play" => ConsoleCommand::Play,
        "pause" => ConsoleCommand::Pause,
        "toggle" | "space" => ConsoleCommand::Toggle,
        "stop" => ConsoleCommand::Stop,
        "seek" => ConsoleCommand::Seek(number(rest, "seconds")?),
        "goto" => ConsoleCommand::Goto(number(rest, "percent")?),
        "start" => ConsoleCommand::MarkStart,
        "end" => ConsoleCommand::MarkEnd,
        "hold" => ConsoleCommand::Hold,
        "release" => ConsoleCommand::Release,
        "segments" | "ls" => ConsoleCommand::Segments,
        "loop" => ConsoleCommand::Loop(index(rest)?),
        "all" => ConsoleCommand::All,
        "next" => ConsoleCommand::Next,
        "prev" | "previous" => ConsoleCommand::Prev,
        "mode" => match required(rest, "mode")? {
            "cycle" => ConsoleCommand::CycleMode,
            name => ConsoleCommand::Mode(name.parse()?),
        },
        "rename" => {
            let (n, name) = required(rest, "segment number")?
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: rename <n> <name>".to_string())?;
            ConsoleCommand::Rename(index(n)?, name.trim().to_string())
        }
        "delete" | "rm" => ConsoleCommand::Delete(index(rest)?),
        "volume" | "vol" => {
            let value = required(rest, "volume")?;
            if value.starts_with('+') || value.starts_with('-') {
                ConsoleCommand::AdjustVolume(integer(value)?)
            } else {
                ConsoleCommand::SetVolume(integer(value)?)
            }
        }
        "mute" => ConsoleCommand::Mute,
        "recent" => match rest {
            "" => ConsoleCommand::Recent,
            "clear" => ConsoleCommand::ClearRecent,
            n => ConsoleCommand::OpenRecent(index(n)?),
        },
        "status" => ConsoleCommand::Status,
        "save" => ConsoleCommand::Save,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command: {other} (try 'help')")),
    };

    Ok(Some(command))
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, String> {
    if value.is_empty() {
        Err(format!("missing {what}"))
    } else {
        Ok(value)
    }
}

fn number(value: &str, what: &str) -> Result<f64, String> {
    required(value, what)?
        .parse()
        .map_err(|_| format!("invalid {what}: {value}"))
}

fn integer(value: &str) -> Result<i32, String> {
    value
        .trim_start_matches('+')
        .parse()
        .map_err(|_| format!("invalid number: {value}"))
}

fn index(value: &str) -> Result<usize, String> {
    match required(value, "number")?.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid number: {value}")),
    }
}

/// Segment id shown as number `n`
pub fn segment_at(status: &EngineStatus, n: usize) -> Result<SegmentId, String> {
    status
        .segments
        .get(n - 1)
        .map(|segment| segment.id)
        .ok_or_else(|| format!("no segment {n} ({} defined)", status.segments.len()))
}

/// Recent file shown as number `n`
pub fn recent_at(status: &EngineStatus, n: usize) -> Result<PathBuf, String> {
    status
        .recent_files
        .get(n - 1)
        .cloned()
        .ok_or_else(|| format!("no recent file {n}"))
}

/// Engine command for commands that need no lookup
pub fn simple_command(command: &ConsoleCommand) -> Option<EngineCommand> {
    let engine_command = match command {
        ConsoleCommand::Open(path) => EngineCommand::LoadVideo(path.clone()),
        ConsoleCommand::Play => EngineCommand::Play,
        ConsoleCommand::Pause => EngineCommand::Pause,
        ConsoleCommand::Toggle => EngineCommand::TogglePlayPause,
        ConsoleCommand::Stop => EngineCommand::Stop,
        ConsoleCommand::Seek(seconds) => EngineCommand::SeekRelative(*seconds),
        ConsoleCommand::Goto(percent) => EngineCommand::SeekToPercent(*percent),
        ConsoleCommand::MarkStart => EngineCommand::MarkStart,
        ConsoleCommand::MarkEnd => EngineCommand::MarkEnd,
        ConsoleCommand::Hold => EngineCommand::BeginHoldRecord,
        ConsoleCommand::Release => EngineCommand::EndHoldRecord,
        ConsoleCommand::All => EngineCommand::PlayAllSegments,
        ConsoleCommand::Next => EngineCommand::NextSegment,
        ConsoleCommand::Prev => EngineCommand::PreviousSegment,
        ConsoleCommand::Mode(mode) => EngineCommand::SetLoopMode(*mode),
        ConsoleCommand::CycleMode => EngineCommand::CycleLoopMode,
        ConsoleCommand::SetVolume(level) => EngineCommand::SetVolume(*level),
        ConsoleCommand::AdjustVolume(delta) => EngineCommand::AdjustVolume(*delta),
        ConsoleCommand::Mute => EngineCommand::ToggleMute,
        ConsoleCommand::ClearRecent => EngineCommand::ClearRecent,
        ConsoleCommand::Save => EngineCommand::SaveState,
        _ => return None,
    };

    Some(engine_command)
}

// ===== Rendering =====

/// Segment table
pub fn render_segments(status: &EngineStatus) -> String {
    if status.segments.is_empty() {
        return "No segments".to_string();
    }

    status
        .segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let marker = if status.current_segment == Some(segment.id) {
                '*'
            } else {
                ' '
            };
            format!(
                "{marker}{:>3}. {:<24} {} - {} ({})",
                i + 1,
                segment.name,
                format_time_precise(segment.start_time),
                format_time_precise(segment.end_time),
                format_time(segment.duration()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line status summary
pub fn render_status(status: &EngineStatus) -> String {
    let Some(path) = &status.video_path else {
        return "No video loaded".to_string();
    };

    let mut line = format!(
        "{} [{}] {} / {} | mode {} | volume {}{}",
        path.display(),
        PlaybackStateEvent::from(status.state).label(),
        format_time(status.position),
        format_time(status.duration),
        status.loop_mode,
        status.volume.level(),
        if status.volume.is_muted() { " (muted)" } else { "" },
    );

    if let Some(start) = status.pending_start {
        line.push_str(&format!(" | start marked at {}", format_time_precise(start)));
    }

    line
}

/// Recent-file list
pub fn render_recent(files: &[PathBuf]) -> String {
    if files.is_empty() {
        return "No recent files".to_string();
    }

    files
        .iter()
        .enumerate()
        .map(|(i, path)| format!("{:>3}. {}", i + 1, path.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text for an engine event; `None` for high-frequency noise
pub fn describe(event: &PlaybackEvent) -> Option<String> {
    let text = match event {
        PlaybackEvent::PositionChanged { .. } | PlaybackEvent::BoundaryMarkersChanged { .. } => {
            return None
        }
        PlaybackEvent::StateChanged { state } => format!("state: {}", state.label()),
        PlaybackEvent::SegmentsChanged { count } => format!("{count} segment(s)"),
        PlaybackEvent::CurrentSegmentChanged { segment_id } => {
            format!("current segment: {segment_id}")
        }
        PlaybackEvent::LoopModeChanged { mode } => format!("loop mode: {mode}"),
        PlaybackEvent::PendingMarkerChanged { start_ms } => match start_ms {
            Some(ms) => format!(
                "start marked at {}",
                format_time_precise(Duration::from_millis(*ms))
            ),
            None => "start marker cleared".to_string(),
        },
        PlaybackEvent::VolumeChanged { level, is_muted } => {
            if *is_muted {
                format!("volume {level} (muted)")
            } else {
                format!("volume {level}")
            }
        }
        PlaybackEvent::VideoLoaded { path, duration_ms } => format!(
            "loaded {} ({})",
            path.display(),
            format_time(Duration::from_millis(*duration_ms))
        ),
        PlaybackEvent::LoadFailed { path, message } => {
            format!("failed to open {}: {message}", path.display())
        }
        PlaybackEvent::PlaybackEnded => "end of media".to_string(),
        PlaybackEvent::RecentFilesChanged { files } => format!("{} recent file(s)", files.len()),
        PlaybackEvent::Status { message } => message.clone(),
        PlaybackEvent::Error { message } => format!("error: {message}"),
    };

    Some(text)
}

/// Split a status reply into engine failures and a retryable busy message
///
/// The control thread may be priming a video for longer than the status
/// timeout; that is not fatal for the console.
pub fn status_or_busy(
    reply: looper_desktop::Result<EngineStatus>,
) -> anyhow::Result<Result<EngineStatus, String>> {
    match reply {
        Ok(status) => Ok(Ok(status)),
        Err(EngineError::Timeout) => Ok(Err("engine busy, try again".to_string())),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> ConsoleCommand {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn parses_transport_and_marking() {
        assert_eq!(parsed("play"), ConsoleCommand::Play);
        assert_eq!(parsed("  TOGGLE "), ConsoleCommand::Toggle);
        assert_eq!(parsed("start"), ConsoleCommand::MarkStart);
        assert_eq!(parsed("end"), ConsoleCommand::MarkEnd);
        assert_eq!(parsed("seek -5"), ConsoleCommand::Seek(-5.0));
        assert_eq!(parsed("goto 42.5"), ConsoleCommand::Goto(42.5));
    }

    #[test]
    fn parses_paths_with_spaces() {
        assert_eq!(
            parsed("open /videos/my lesson.mp4"),
            ConsoleCommand::Open(PathBuf::from("/videos/my lesson.mp4"))
        );
    }

    #[test]
    fn parses_segment_commands() {
        assert_eq!(parsed("loop 2"), ConsoleCommand::Loop(2));
        assert_eq!(
            parsed("rename 1 Verse one"),
            ConsoleCommand::Rename(1, "Verse one".to_string())
        );
        assert_eq!(parsed("delete 3"), ConsoleCommand::Delete(3));
        assert!(parse("loop 0").is_err());
        assert!(parse("rename 1").is_err());
    }

    #[test]
    fn parses_modes_and_volume() {
        assert_eq!(parsed("mode random"), ConsoleCommand::Mode(LoopMode::Random));
        assert_eq!(
            parsed("mode loop"),
            ConsoleCommand::Mode(LoopMode::SequentialLoop)
        );
        assert_eq!(parsed("mode cycle"), ConsoleCommand::CycleMode);
        assert!(parse("mode shuffle").is_err());

        assert_eq!(parsed("volume 40"), ConsoleCommand::SetVolume(40));
        assert_eq!(parsed("volume +10"), ConsoleCommand::AdjustVolume(10));
        assert_eq!(parsed("volume -10"), ConsoleCommand::AdjustVolume(-10));
    }

    #[test]
    fn parses_recent_variants() {
        assert_eq!(parsed("recent"), ConsoleCommand::Recent);
        assert_eq!(parsed("recent 2"), ConsoleCommand::OpenRecent(2));
        assert_eq!(parsed("recent clear"), ConsoleCommand::ClearRecent);
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse("   ").unwrap(), None);
        assert!(parse("dance").is_err());
        assert!(parse("open").is_err());
    }

    #[test]
    fn position_events_are_silent() {
        let tick = PlaybackEvent::PositionChanged {
            position_ms: 1_000,
            duration_ms: 10_000,
        };
        assert_eq!(describe(&tick), None);

        let loaded = PlaybackEvent::VideoLoaded {
            path: PathBuf::from("/videos/a.mp4"),
            duration_ms: 65_000,
        };
        assert_eq!(
            describe(&loaded),
            Some("loaded /videos/a.mp4 (01:05)".to_string())
        );
    }

    #[test]
    fn renders_recent_files() {
        assert_eq!(render_recent(&[]), "No recent files");
        assert_eq!(
            render_recent(&[PathBuf::from("/a.mp4"), PathBuf::from("/b.mp4")]),
            "  1. /a.mp4\n  2. /b.mp4"
        );
    }

    #[test]
    fn status_timeout_is_not_fatal() {
        let busy = status_or_busy(Err(EngineError::Timeout)).unwrap();
        assert_eq!(busy.unwrap_err(), "engine busy, try again");

        assert!(status_or_busy(Err(EngineError::Disconnected)).is_err());
    }
}
