//! Boundaries to the inference stages the creators call back into.
//!
//! Implementations own frame access: decoding, seeking and cropping are
//! their concern. All collaborators are shared across worker tasks and
//! must be callable concurrently.

use std::collections::HashMap;

use inkframe_battle_model::{
    BBox, Frame, FrameIndex, FrameSeq, LampFrame, OcrRecord, RecognizedChar,
};
use inkframe_common::{InkframeError, InkframeResult};

/// Glyph set used for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrFont {
    Text,
    /// Digits, `%` and count units.
    Number,
}

/// Character recognition over one region of one frame.
///
/// Returned character boxes are relative to the region.
pub trait RegionOcr: Send + Sync {
    fn recognize(
        &self,
        frame: FrameIndex,
        region: &BBox,
        font: OcrFont,
    ) -> InkframeResult<Vec<RecognizedChar>>;

    /// Recognize and split into lines, top to bottom.
    fn recognize_lines(
        &self,
        frame: FrameIndex,
        region: &BBox,
        font: OcrFont,
    ) -> InkframeResult<Vec<Vec<RecognizedChar>>> {
        Ok(split_lines(self.recognize(frame, region, font)?))
    }
}

/// Group characters into lines.
///
/// A char joins the first line whose first char spans its vertical centre;
/// otherwise it starts a new line. Lines are ordered by their top edge and
/// chars within a line by their left edge.
pub fn split_lines(chars: Vec<RecognizedChar>) -> Vec<Vec<RecognizedChar>> {
    let mut lines: Vec<(i32, i32, Vec<RecognizedChar>)> = Vec::new();
    for ch in chars {
        let center_y = (ch.bbox.y1 + ch.bbox.y2) as f64 / 2.0;
        match lines
            .iter_mut()
            .find(|(top, bottom, _)| *top as f64 <= center_y && center_y <= *bottom as f64)
        {
            Some((_, _, line)) => line.push(ch),
            None => lines.push((ch.bbox.y1, ch.bbox.y2, vec![ch])),
        }
    }
    lines.sort_by_key(|(top, _, _)| *top);
    lines
        .into_iter()
        .map(|(_, _, mut line)| {
            line.sort_by_key(|c| c.bbox.x1);
            line
        })
        .collect()
}

/// Dense lamp detection over a short frame range, used to re-inspect frames
/// the sampled lamp stream skipped.
pub trait LampInspector: Send + Sync {
    /// Lamp frames for every video frame in `[start, end]`. `Ok(None)` means
    /// no detection could be made.
    fn inspect(
        &self,
        start: FrameIndex,
        end: FrameIndex,
    ) -> InkframeResult<Option<Vec<Frame<LampFrame>>>>;
}

/// Inspector for setups without dense detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReinspection;

impl LampInspector for NoReinspection {
    fn inspect(
        &self,
        _start: FrameIndex,
        _end: FrameIndex,
    ) -> InkframeResult<Option<Vec<Frame<LampFrame>>>> {
        Ok(None)
    }
}

/// Replays OCR readings recorded by an earlier run, keyed by frame and region.
#[derive(Debug, Clone, Default)]
pub struct RecordedOcr {
    readings: HashMap<(FrameIndex, BBox), Vec<RecognizedChar>>,
}

impl RecordedOcr {
    pub fn from_records(records: impl IntoIterator<Item = OcrRecord>) -> Self {
        let readings = records
            .into_iter()
            .map(|r| ((r.frame, r.bbox), r.chars))
            .collect();
        Self { readings }
    }

    /// Record a reading of `text`, one char per 10px cell on a single line,
    /// starting one cell in from the region's left edge.
    pub fn insert_text(&mut self, frame: FrameIndex, region: BBox, text: &str) {
        let chars = text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let x = 10 * (i as i32 + 1);
                RecognizedChar::new(c, BBox::new(x, 0, x + 10, 10))
            })
            .collect();
        self.readings.insert((frame, region), chars);
    }

    pub fn insert_chars(&mut self, frame: FrameIndex, region: BBox, chars: Vec<RecognizedChar>) {
        self.readings.insert((frame, region), chars);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl RegionOcr for RecordedOcr {
    fn recognize(
        &self,
        frame: FrameIndex,
        region: &BBox,
        _font: OcrFont,
    ) -> InkframeResult<Vec<RecognizedChar>> {
        self.readings
            .get(&(frame, *region))
            .cloned()
            .ok_or_else(|| {
                InkframeError::collaborator(format!(
                    "no recorded reading for frame {frame} region {:?}",
                    <[i32; 4]>::from(*region)
                ))
            })
    }
}

/// Replays a dense lamp sequence recorded at interval 1.
#[derive(Debug, Clone, Default)]
pub struct RecordedLampInspector {
    frames: FrameSeq<LampFrame>,
}

impl RecordedLampInspector {
    pub fn new(frames: FrameSeq<LampFrame>) -> Self {
        Self { frames }
    }
}

impl LampInspector for RecordedLampInspector {
    fn inspect(
        &self,
        start: FrameIndex,
        end: FrameIndex,
    ) -> InkframeResult<Option<Vec<Frame<LampFrame>>>> {
        let window = self.frames.window(start, end);
        if window.is_empty() {
            return Ok(None);
        }
        Ok(Some(window.to_vec()))
    }
}
