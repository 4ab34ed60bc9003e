//! # Text Layout
//!
//! Turns a block of text into measured lines that fit a given pixel width.
//!
//! ## Pipeline
//!
//! ```text
//! TextBlock ──split '\n'──▶ physical lines ──LineBreaker──▶ Line* ──▶ LayoutResult
//!                           (blank → " ")    (words|chars)
//! ```
//!
//! Physical lines are hard breaks. Within a physical line the breaker
//! chosen by [`WrapMode`] decides where to wrap:
//!
//! - [`WrapMode::Words`]: greedy, one pass; `(...)` runs never split
//! - [`WrapMode::Characters`]: longest fitting prefix by binary search
//!
//! Line heights stack with `line_spacing` between consecutive lines (not
//! after the last one).

pub mod tokenize;
pub mod wrap;

use crate::error::LabelError;
use crate::font::ScaledFace;
use crate::label::WrapMode;

pub use tokenize::tokenize;
pub use wrap::{CharWrap, LineBreaker, WordWrap};

/// One output line with its measured size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub width: u32,
    pub height: u32,
}

impl Line {
    pub(crate) fn measured(text: String, face: ScaledFace<'_>) -> Self {
        let extent = face.measure(&text);
        Self {
            text,
            width: extent.width,
            height: extent.height,
        }
    }
}

/// Raw multi-line input text.
#[derive(Debug, Clone, Copy)]
pub struct TextBlock<'a>(&'a str);

impl<'a> TextBlock<'a> {
    pub fn new(text: &'a str) -> Self {
        Self(text)
    }

    /// Physical lines, with empty lines normalized to a single space.
    pub fn lines(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .map(|line| if line.is_empty() { " " } else { line })
    }
}

/// Laid-out lines and their stacked height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutResult {
    lines: Vec<Line>,
    line_spacing: u32,
    height: u32,
}

impl LayoutResult {
    fn new(lines: Vec<Line>, line_spacing: u32) -> Self {
        let gaps = lines.len().saturating_sub(1) as u32;
        let height = lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.height))
            .saturating_add(gaps.saturating_mul(line_spacing));
        Self {
            lines,
            line_spacing,
            height,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line_spacing(&self) -> u32 {
        self.line_spacing
    }

    /// Sum of line heights plus the spacing between them.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width of the widest line.
    pub fn width(&self) -> u32 {
        self.lines.iter().map(|l| l.width).max().unwrap_or(0)
    }

    /// Y offset of each line's top edge, relative to the block's top.
    pub fn line_tops(&self) -> impl Iterator<Item = (u32, &Line)> {
        self.lines.iter().scan(0u32, move |y, line| {
            let top = *y;
            *y = y.saturating_add(line.height).saturating_add(self.line_spacing);
            Some((top, line))
        })
    }

    /// Fail with [`LabelError::Overflow`] if the block is taller than
    /// `available` pixels.
    pub fn ensure_fits(&self, available: u32) -> Result<(), LabelError> {
        if self.height > available {
            return Err(LabelError::Overflow {
                required: self.height,
                available,
            });
        }
        Ok(())
    }
}

/// Lay out `text` into lines no wider than `width_px` where possible.
pub fn layout(text: &str, width_px: u32, face: ScaledFace<'_>, line_spacing: u32, mode: WrapMode) -> LayoutResult {
    let lines: Vec<Line> = TextBlock::new(text)
        .lines()
        .flat_map(|line| LineBreaker::new(mode, line, width_px, face))
        .collect();
    tracing::debug!(lines = lines.len(), width_px, ?mode, "text laid out");
    LayoutResult::new(lines, line_spacing)
}
