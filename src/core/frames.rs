//! Spinner frame sequences.

use unicode_segmentation::UnicodeSegmentation;

const DEFAULT_GLYPHS: &str = "|/-\\";

/// A non-empty, cyclic sequence of spinner glyphs.
///
/// The sequence never exhausts: `get(tick)` wraps for any tick value, so the
/// render loop can index with a plain counter.
#[derive(Debug, Clone)]
pub struct FrameSet {
    frames: Vec<String>,
}

impl FrameSet {
    /// Split `glyphs` into grapheme clusters, one frame per cluster.
    ///
    /// Grapheme splitting keeps multi-codepoint glyphs (braille spinners,
    /// emoji with modifiers) intact. An empty string falls back to the
    /// default four-frame ASCII spinner.
    pub fn from_glyphs(glyphs: &str) -> Self {
        let frames: Vec<String> = glyphs.graphemes(true).map(str::to_string).collect();
        if frames.is_empty() {
            return Self::default();
        }
        Self { frames }
    }

    /// Use each element of `frames` as one spinner frame.
    ///
    /// Multi-column frames are fine; the clear width budget covers glyphs up
    /// to two columns wide. Empty input falls back to the default spinner.
    pub fn from_frames<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let frames: Vec<String> = frames.into_iter().map(Into::into).collect();
        if frames.is_empty() {
            return Self::default();
        }
        Self { frames }
    }

    /// The frame for `tick`, wrapping cyclically.
    pub fn get(&self, tick: usize) -> &str {
        &self.frames[tick % self.frames.len()]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        // Construction guarantees at least one frame.
        false
    }
}

impl Default for FrameSet {
    fn default() -> Self {
        Self::from_glyphs(DEFAULT_GLYPHS)
    }
}
