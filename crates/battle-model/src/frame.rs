//! Frame-indexed payloads.
//!
//! Upstream stages sample the video at a fixed interval, so indices within
//! one sequence are strictly increasing but need not be contiguous.

use serde::{Deserialize, Serialize};

/// Video frame index.
pub type FrameIndex = u64;

/// One sampled frame with its prediction payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame<T> {
    /// Video frame index the payload was computed on.
    #[serde(rename = "frame")]
    pub index: FrameIndex,

    /// The prediction payload.
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Frame<T> {
    pub fn new(index: FrameIndex, payload: T) -> Self {
        Self { index, payload }
    }
}

/// An ordered sequence of frames from one upstream producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSeq<T> {
    /// Sampling interval in video frames.
    #[serde(default = "default_interval")]
    pub interval: u64,

    pub frames: Vec<Frame<T>>,
}

fn default_interval() -> u64 {
    1
}

impl<T> Default for FrameSeq<T> {
    fn default() -> Self {
        Self {
            interval: 1,
            frames: vec![],
        }
    }
}

impl<T> FrameSeq<T> {
    /// Build a sequence, sorting frames by index.
    pub fn new(mut frames: Vec<Frame<T>>, interval: u64) -> Self {
        frames.sort_by_key(|f| f.index);
        Self {
            interval: interval.max(1),
            frames,
        }
    }

    /// All frames in order.
    pub fn frames(&self) -> &[Frame<T>] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first_index(&self) -> Option<FrameIndex> {
        self.frames.first().map(|f| f.index)
    }

    pub fn last_index(&self) -> Option<FrameIndex> {
        self.frames.last().map(|f| f.index)
    }

    /// Frames whose index lies in `[start, end]`.
    pub fn window(&self, start: FrameIndex, end: FrameIndex) -> &[Frame<T>] {
        let lo = self.frames.partition_point(|f| f.index < start);
        let hi = self.frames.partition_point(|f| f.index <= end);
        if lo >= hi {
            &[]
        } else {
            &self.frames[lo..hi]
        }
    }

    /// Frames whose index is at or after `start`.
    pub fn since(&self, start: FrameIndex) -> &[Frame<T>] {
        let lo = self.frames.partition_point(|f| f.index < start);
        &self.frames[lo..]
    }

    /// Look up the frame with exactly this index.
    pub fn get(&self, index: FrameIndex) -> Option<&Frame<T>> {
        self.frames
            .binary_search_by_key(&index, |f| f.index)
            .ok()
            .map(|i| &self.frames[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> FrameSeq<u32> {
        FrameSeq::new(
            vec![
                Frame::new(12, 3),
                Frame::new(0, 0),
                Frame::new(6, 1),
                Frame::new(18, 4),
            ],
            6,
        )
    }

    #[test]
    fn test_new_sorts_frames() {
        let s = seq();
        let indices: Vec<_> = s.frames().iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 6, 12, 18]);
        assert_eq!(s.first_index(), Some(0));
        assert_eq!(s.last_index(), Some(18));
    }

    #[test]
    fn test_window_is_inclusive() {
        let s = seq();
        let w = s.window(6, 12);
        assert_eq!(w.len(), 2);
        assert_eq!(w[0].index, 6);
        assert_eq!(w[1].index, 12);

        assert_eq!(s.window(7, 11).len(), 0);
        assert_eq!(s.window(20, 10).len(), 0);
        assert_eq!(s.since(7).len(), 2);
    }

    #[test]
    fn test_get_exact_index() {
        let s = seq();
        assert_eq!(s.get(12).map(|f| f.payload), Some(3));
        assert!(s.get(13).is_none());
    }

    #[test]
    fn test_frame_json_flattens_payload() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Payload {
            value: u32,
        }
        let raw = r#"{ "interval": 3, "frames": [ { "frame": 9, "value": 4 } ] }"#;
        let parsed: FrameSeq<Payload> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.interval, 3);
        assert_eq!(parsed.frames[0], Frame::new(9, Payload { value: 4 }));
    }
}
