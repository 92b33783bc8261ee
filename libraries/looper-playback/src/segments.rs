//! Segment store
//!
//! Ordered collection of named segments for the loaded video, plus the
//! "current" pointer and the loop mode used to pick what plays next.
//!
//! ```text
//! order  id        name        range
//! ─────────────────────────────────────────
//!   0    3f2a…     Segment 1   00:10 → 00:15
//!   1    91c0…     Intro       00:42 → 01:03   ← current
//!   2    c7e4…     Segment 3   02:00 → 02:08
//! ```
//!
//! The current pointer is a lookup key, not ownership: a dangling id simply
//! resolves to no segment.

use crate::events::PlaybackEvent;
use crate::loop_mode;
use crate::types::{LoopMode, Segment, SegmentId};
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;

/// Ordered segment collection for one video
#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    /// Segments sorted by `order`
    segments: Vec<Segment>,

    /// Current segment (weak, by id)
    current: Option<SegmentId>,

    /// Policy for `next_segment`
    loop_mode: LoopMode,

    /// Change notifications waiting to be drained
    pending_events: Vec<PlaybackEvent>,
}

impl SegmentStore {
    /// Create new empty store
    pub fn new(loop_mode: LoopMode) -> Self {
        Self {
            loop_mode,
            ..Self::default()
        }
    }

    /// Replace all segments, sorted by their stored `order`
    ///
    /// Keeps the current pointer only if it still names a loaded segment.
    pub fn load(&mut self, mut segments: Vec<Segment>) {
        segments.sort_by_key(|s| s.order);
        self.segments = segments;

        if let Some(id) = self.current {
            if self.get(id).is_none() {
                self.current = None;
            }
        }

        self.emit_segments_changed();
    }

    /// Append a new segment named "Segment N"
    ///
    /// Callers validate `end > start` before calling.
    pub fn add_segment(&mut self, start_time: Duration, end_time: Duration) -> Segment {
        let segment = Segment {
            id: SegmentId::new(),
            name: format!("Segment {}", self.segments.len() + 1),
            start_time,
            end_time,
            order: self.segments.len(),
            created_at: Utc::now(),
        };

        self.segments.push(segment.clone());
        self.emit_segments_changed();

        segment
    }

    /// Remove segment by id and renumber the rest densely
    ///
    /// Returns the removed segment; unknown ids are a no-op.
    pub fn remove_segment(&mut self, id: SegmentId) -> Option<Segment> {
        let index = self.index_of(id)?;
        let removed = self.segments.remove(index);

        self.reorder_segments(None);

        Some(removed)
    }

    /// Rename in place; returns false if the id is unknown
    pub fn rename_segment(&mut self, id: SegmentId, name: impl Into<String>) -> bool {
        let Some(segment) = self.get_mut(id) else {
            return false;
        };

        segment.name = name.into();
        self.emit_segments_changed();
        true
    }

    /// Reassign `order` and re-sort
    ///
    /// With an explicit id sequence, matching segments take their position in
    /// it; segments missing from the sequence keep their old value, and ties
    /// fall back to the current relative order (stable sort). Without one,
    /// orders are renumbered from the current array order.
    pub fn reorder_segments(&mut self, new_order: Option<&[SegmentId]>) {
        match new_order {
            Some(ids) => {
                let positions: HashMap<SegmentId, usize> =
                    ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

                for segment in &mut self.segments {
                    if let Some(&position) = positions.get(&segment.id) {
                        segment.order = position;
                    }
                }
            }
            None => {
                for (i, segment) in self.segments.iter_mut().enumerate() {
                    segment.order = i;
                }
            }
        }

        self.segments.sort_by_key(|s| s.order);
        self.emit_segments_changed();
    }

    /// Overwrite a segment's boundaries; returns false if the id is unknown
    pub fn update_bounds(&mut self, id: SegmentId, start_time: Duration, end_time: Duration) -> bool {
        let Some(segment) = self.get_mut(id) else {
            return false;
        };

        segment.start_time = start_time;
        segment.end_time = end_time;
        self.emit_segments_changed();
        true
    }

    /// Update the current pointer
    ///
    /// Only a non-empty pointer notifies; observers check for a cleared
    /// current themselves.
    pub fn set_current(&mut self, id: Option<SegmentId>) {
        self.current = id;

        if let Some(segment_id) = id {
            self.pending_events
                .push(PlaybackEvent::CurrentSegmentChanged { segment_id });
        }
    }

    /// Segment that should play after the current one
    pub fn next_segment(&self) -> Option<&Segment> {
        loop_mode::next_segment(self.current, &self.segments, self.loop_mode)
    }

    /// Remove everything, including the current pointer
    pub fn clear(&mut self) {
        self.segments.clear();
        self.current = None;
        self.emit_segments_changed();
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.id == id)
    }

    pub fn index_of(&self, id: SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| s.id == id)
    }

    pub fn current_id(&self) -> Option<SegmentId> {
        self.current
    }

    /// Current segment, if the pointer still resolves
    pub fn current(&self) -> Option<&Segment> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Take queued notifications
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn emit_segments_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::SegmentsChanged {
            count: self.segments.len(),
        });
    }
}
