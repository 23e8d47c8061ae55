//! Segment finding over frame sequences.
//!
//! A frame predicate classifies each frame as inside or outside the event
//! being looked for. The finder turns those noisy per-frame verdicts into
//! contiguous runs, tolerating a fixed number of consecutive misses
//! (the exit budget) before closing a run.

use inkframe_battle_model::{Frame, FrameIndex};

/// Per-frame classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The frame belongs to the event.
    Target,
    /// The frame does not belong to the event; spends exit budget.
    NotTarget,
    /// No signal on this frame; neither extends nor spends budget.
    Pending,
}

/// Classifies one frame. `in_segment` tells whether a run is currently open.
pub trait FramePredicate<T> {
    fn test(&mut self, frame: &Frame<T>, in_segment: bool) -> Verdict;
}

impl<T, F> FramePredicate<T> for F
where
    F: FnMut(&Frame<T>, bool) -> Verdict,
{
    fn test(&mut self, frame: &Frame<T>, in_segment: bool) -> Verdict {
        self(frame, in_segment)
    }
}

/// Find the first run of target frames in `frames`.
///
/// Only positions that are multiples of `interval` are evaluated; skipped
/// positions extend an open run. Returns `(start, end)` positions within
/// `frames`, or `None` when no frame was a target.
pub fn find_segment<T, P>(
    frames: &[Frame<T>],
    predicate: &mut P,
    exit_count: usize,
    interval: usize,
) -> Option<(usize, usize)>
where
    P: FramePredicate<T> + ?Sized,
{
    let interval = interval.max(1);
    let mut start: Option<usize> = None;
    let mut end: Option<usize> = None;
    let mut budget = exit_count;

    for (pos, frame) in frames.iter().enumerate() {
        if pos % interval != 0 {
            if start.is_some() {
                end = Some(pos);
            }
            continue;
        }

        match predicate.test(frame, start.is_some()) {
            Verdict::Target => {
                if start.is_none() {
                    start = Some(pos);
                } else {
                    end = Some(pos);
                    budget = exit_count;
                }
            }
            Verdict::NotTarget => {
                if start.is_some() {
                    budget = budget.saturating_sub(1);
                    if budget == 0 {
                        break;
                    }
                }
            }
            Verdict::Pending => {}
        }
    }

    let start = start?;
    Some((start, end.unwrap_or(start)))
}

/// A closed run of frames.
#[derive(Debug)]
pub struct Segment<'a, T> {
    /// Position of the first frame in the scanned slice.
    pub start: usize,
    /// Position of the last frame in the scanned slice (inclusive).
    pub end: usize,
    pub frames: &'a [Frame<T>],
}

impl<T> Clone for Segment<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Segment<'_, T> {}

impl<'a, T> Segment<'a, T> {
    /// Video frame index of the first frame.
    pub fn first_frame(&self) -> FrameIndex {
        self.frames[0].index
    }

    /// Video frame index of the last frame.
    pub fn last_frame(&self) -> FrameIndex {
        self.frames[self.frames.len() - 1].index
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Lazy stream of disjoint, ordered segments.
///
/// The stream owns its predicate so stateful monitors keep evolving across
/// segments; read their state through [`SegmentStream::predicate`] after
/// each yielded segment.
pub struct SegmentStream<'a, T, P> {
    frames: &'a [Frame<T>],
    predicate: P,
    exit_count: usize,
    interval: usize,
    cursor: usize,
    done: bool,
}

impl<'a, T, P: FramePredicate<T>> SegmentStream<'a, T, P> {
    pub fn new(frames: &'a [Frame<T>], predicate: P, exit_count: usize, interval: usize) -> Self {
        Self {
            frames,
            predicate,
            exit_count,
            interval,
            cursor: 0,
            done: false,
        }
    }

    pub fn predicate(&self) -> &P {
        &self.predicate
    }

    pub fn into_predicate(self) -> P {
        self.predicate
    }
}

impl<'a, T, P: FramePredicate<T>> Iterator for SegmentStream<'a, T, P> {
    type Item = Segment<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor >= self.frames.len() {
            self.done = true;
            return None;
        }

        let rest = &self.frames[self.cursor..];
        let Some((s, e)) = find_segment(rest, &mut self.predicate, self.exit_count, self.interval)
        else {
            self.done = true;
            return None;
        };

        let start = self.cursor + s;
        let end = self.cursor + e;
        self.cursor = end + 1;
        Some(Segment {
            start,
            end,
            frames: &self.frames[start..=end],
        })
    }
}

/// Stream the segments of `frames` with an owned predicate.
pub fn segments<T, P: FramePredicate<T>>(
    frames: &[Frame<T>],
    predicate: P,
    exit_count: usize,
    interval: usize,
) -> SegmentStream<'_, T, P> {
    SegmentStream::new(frames, predicate, exit_count, interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(values: &[bool]) -> Vec<Frame<bool>> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Frame::new(i as u64, *v))
            .collect()
    }

    fn by_flag(frame: &Frame<bool>, _: bool) -> Verdict {
        if frame.payload {
            Verdict::Target
        } else {
            Verdict::NotTarget
        }
    }

    #[test]
    fn test_find_segment_closes_after_budget() {
        let frames = flags(&[true, true, false, false, true]);
        assert_eq!(find_segment(&frames, &mut by_flag, 2, 1), Some((0, 1)));
    }

    #[test]
    fn test_find_segment_tolerates_short_gap() {
        let frames = flags(&[false, true, false, true, false, false, false]);
        assert_eq!(find_segment(&frames, &mut by_flag, 2, 1), Some((1, 3)));
    }

    #[test]
    fn test_single_trailing_target() {
        let frames = flags(&[false, false, true]);
        assert_eq!(find_segment(&frames, &mut by_flag, 3, 1), Some((2, 2)));
    }

    #[test]
    fn test_no_target_yields_none() {
        let frames = flags(&[false, false]);
        assert_eq!(find_segment(&frames, &mut by_flag, 1, 1), None);

        let mut pending = |_: &Frame<bool>, _: bool| Verdict::Pending;
        assert_eq!(find_segment(&frames, &mut pending, 1, 1), None);
    }

    #[test]
    fn test_pending_does_not_spend_budget() {
        let frames: Vec<Frame<Option<bool>>> = [Some(true), None, None, Some(false), Some(true)]
            .iter()
            .enumerate()
            .map(|(i, v)| Frame::new(i as u64, *v))
            .collect();
        let mut pred = |f: &Frame<Option<bool>>, _: bool| match f.payload {
            Some(true) => Verdict::Target,
            Some(false) => Verdict::NotTarget,
            None => Verdict::Pending,
        };
        assert_eq!(find_segment(&frames, &mut pred, 2, 1), Some((0, 4)));
    }

    #[test]
    fn test_interval_skips_evaluation() {
        let frames = flags(&[true, false, true, false, false, false]);
        let mut calls = 0;
        let mut pred = |f: &Frame<bool>, in_segment: bool| {
            calls += 1;
            by_flag(f, in_segment)
        };
        // Positions 0, 2 and 4 are evaluated; 1 and 3 extend the open run.
        assert_eq!(find_segment(&frames, &mut pred, 1, 2), Some((0, 3)));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_stream_yields_disjoint_segments() {
        let frames = flags(&[true, true, false, false, true]);
        let found: Vec<_> = segments(&frames, by_flag, 2, 1)
            .map(|s| (s.start, s.end))
            .collect();
        assert_eq!(found, vec![(0, 1), (4, 4)]);
    }

    struct Counting {
        calls: usize,
    }

    impl FramePredicate<bool> for Counting {
        fn test(&mut self, frame: &Frame<bool>, in_segment: bool) -> Verdict {
            self.calls += 1;
            by_flag(frame, in_segment)
        }
    }

    #[test]
    fn test_stream_exposes_predicate_state() {
        let frames = flags(&[true, false, true]);
        let mut stream = segments(&frames, Counting { calls: 0 }, 1, 1);

        let first = stream.next().unwrap();
        assert_eq!((first.first_frame(), first.last_frame()), (0, 0));
        assert_eq!(stream.predicate().calls, 2);

        let second = stream.next().unwrap();
        assert_eq!((second.start, second.end), (2, 2));
        assert_eq!(stream.predicate().calls, 4);

        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
        assert_eq!(stream.into_predicate().calls, 4);
    }
}
