//! Loop mode policy
//!
//! Pure selection of the segment that follows the current one. The actual
//! re-seek for `Single` happens in the controller, not here.

use crate::types::{LoopMode, Segment, SegmentId};
use rand::{thread_rng, Rng};

/// Select the next segment
///
/// A missing or unknown `current` always yields the first segment, whatever
/// the mode: this is the entry point for "start" transitions.
pub fn next_segment(
    current: Option<SegmentId>,
    ordered: &[Segment],
    mode: LoopMode,
) -> Option<&Segment> {
    next_segment_with_rng(current, ordered, mode, &mut thread_rng())
}

/// Same as [`next_segment`] with an explicit randomness source
pub fn next_segment_with_rng<'a, R: Rng + ?Sized>(
    current: Option<SegmentId>,
    ordered: &'a [Segment],
    mode: LoopMode,
    rng: &mut R,
) -> Option<&'a Segment> {
    let first = ordered.first()?;

    let Some(index) = current.and_then(|id| ordered.iter().position(|s| s.id == id)) else {
        return Some(first);
    };

    match mode {
        LoopMode::Single => ordered.get(index),
        LoopMode::Sequential => ordered.get(index + 1),
        LoopMode::SequentialLoop => ordered.get(index + 1).or(Some(first)),
        LoopMode::Random => pick_other(index, ordered, rng),
    }
}

/// Uniform pick among every segment except the one at `index`
///
/// With a single segment, returns it (repeat).
fn pick_other<'a, R: Rng + ?Sized>(
    index: usize,
    ordered: &'a [Segment],
    rng: &mut R,
) -> Option<&'a Segment> {
    if ordered.len() == 1 {
        return ordered.first();
    }

    // Draw from n-1 slots and skip over the current one
    let pick = rng.gen_range(0..ordered.len() - 1);
    let pick = if pick >= index { pick + 1 } else { pick };
    ordered.get(pick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::time::Duration;

    fn create_test_segments(count: usize) -> Vec<Segment> {
        (0..count)
            .map(|i| Segment {
                id: SegmentId::new(),
                name: format!("Segment {}", i + 1),
                start_time: Duration::from_secs(i as u64 * 10),
                end_time: Duration::from_secs(i as u64 * 10 + 5),
                order: i,
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn empty_list_returns_none_for_every_mode() {
        for mode in [
            LoopMode::Single,
            LoopMode::Sequential,
            LoopMode::Random,
            LoopMode::SequentialLoop,
        ] {
            assert!(next_segment(None, &[], mode).is_none());
            assert!(next_segment(Some(SegmentId::new()), &[], mode).is_none());
        }
    }

    #[test]
    fn missing_current_starts_at_first() {
        let segments = create_test_segments(3);

        for mode in [
            LoopMode::Single,
            LoopMode::Sequential,
            LoopMode::Random,
            LoopMode::SequentialLoop,
        ] {
            assert_eq!(next_segment(None, &segments, mode).unwrap().id, segments[0].id);
            assert_eq!(
                next_segment(Some(SegmentId::new()), &segments, mode)
                    .unwrap()
                    .id,
                segments[0].id
            );
        }
    }

    #[test]
    fn single_repeats_current() {
        let segments = create_test_segments(3);
        let next = next_segment(Some(segments[1].id), &segments, LoopMode::Single).unwrap();
        assert_eq!(next.id, segments[1].id);
    }

    #[test]
    fn sequential_advances_and_stops_at_end() {
        let segments = create_test_segments(3);

        let next = next_segment(Some(segments[0].id), &segments, LoopMode::Sequential).unwrap();
        assert_eq!(next.id, segments[1].id);

        assert!(next_segment(Some(segments[2].id), &segments, LoopMode::Sequential).is_none());
    }

    #[test]
    fn sequential_loop_wraps_to_first() {
        let segments = create_test_segments(3);

        let next =
            next_segment(Some(segments[2].id), &segments, LoopMode::SequentialLoop).unwrap();
        assert_eq!(next.id, segments[0].id);
        assert_eq!(next.order, 0);
    }

    #[test]
    fn random_with_single_segment_repeats_it() {
        let segments = create_test_segments(1);
        let next = next_segment(Some(segments[0].id), &segments, LoopMode::Random).unwrap();
        assert_eq!(next.id, segments[0].id);
    }

    #[test]
    fn random_never_returns_current_and_reaches_all_others() {
        let segments = create_test_segments(4);
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();

        for _ in 0..200 {
            let next =
                next_segment_with_rng(Some(segments[2].id), &segments, LoopMode::Random, &mut rng)
                    .unwrap();
            assert_ne!(next.id, segments[2].id);
            seen.insert(next.id);
        }

        assert_eq!(seen.len(), 3);
    }
}
