//! Frame clock utilities.
//!
//! Every upstream prediction is keyed by the video frame index it was
//! computed on. This module converts between frame indices and time:
//! - Frame index to seconds / timecode for logs and summaries
//! - Seconds to a frame span for windows such as "one minute after opening"
//! - Wall-clock stamping of analysis runs

/// Converts frame indices of one recording to time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    frame_rate: u32,
}

impl FrameClock {
    /// Create a clock for a recording at `frame_rate` frames per second.
    /// A zero rate is treated as 1 fps.
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame_rate: frame_rate.max(1),
        }
    }

    /// Frames per second.
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Seconds from the start of the recording to `frame`.
    pub fn frame_to_secs(&self, frame: u64) -> f64 {
        frame as f64 / self.frame_rate as f64
    }

    /// Number of frames covering `secs` seconds (rounded down).
    pub fn secs_to_frames(&self, secs: f64) -> u64 {
        if secs <= 0.0 {
            return 0;
        }
        (secs * self.frame_rate as f64) as u64
    }

    /// `mm:ss.fff` timecode of `frame`.
    pub fn timecode(&self, frame: u64) -> String {
        let total_ms = frame * 1000 / self.frame_rate as u64;
        let minutes = total_ms / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let millis = total_ms % 1000;
        format!("{minutes:02}:{seconds:02}.{millis:03}")
    }
}

/// Wall-clock time now (ISO 8601), used to stamp analysis reports.
pub fn wall_clock_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Span between two frames, inclusive of both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpan {
    pub start: u64,
    pub end: u64,
}

impl FrameSpan {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Whether two spans share at least one frame.
    pub fn overlaps(&self, other: &FrameSpan) -> bool {
        self.end >= other.start && self.start <= other.end
    }

    /// Number of video frames covered.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}
