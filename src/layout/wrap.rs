//! Line breakers.
//!
//! Both breakers are iterators over the lines of one physical line of text.
//! They never backtrack and always make progress: a token or character that
//! is wider than the box on its own becomes a single overflowing line.

use super::Line;
use super::tokenize::tokenize;
use crate::font::ScaledFace;
use crate::label::WrapMode;

/// Greedy word wrap over [`tokenize`] tokens.
pub struct WordWrap<'a> {
    face: ScaledFace<'a>,
    width: u32,
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> WordWrap<'a> {
    pub fn new(text: &'a str, width: u32, face: ScaledFace<'a>) -> Self {
        let mut tokens = tokenize(text);
        if tokens.is_empty() {
            // Blank lines still occupy a slot.
            tokens.push(" ");
        }
        Self {
            face,
            width,
            tokens,
            pos: 0,
        }
    }
}

impl Iterator for WordWrap<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        let first = *self.tokens.get(self.pos)?;
        self.pos += 1;
        let mut current = first.to_string();

        while let Some(&token) = self.tokens.get(self.pos) {
            let candidate = format!("{} {}", current, token);
            if self.face.measure(&candidate).width > self.width {
                break;
            }
            current = candidate;
            self.pos += 1;
        }

        Some(Line::measured(current, self.face))
    }
}

/// Character wrap: each line is the longest prefix of the remaining text
/// that fits, found by binary search over char boundaries.
pub struct CharWrap<'a> {
    face: ScaledFace<'a>,
    width: u32,
    rest: &'a str,
}

impl<'a> CharWrap<'a> {
    pub fn new(text: &'a str, width: u32, face: ScaledFace<'a>) -> Self {
        let trimmed = text.trim();
        Self {
            face,
            width,
            rest: if trimmed.is_empty() { " " } else { trimmed },
        }
    }

    /// Byte length of the longest fitting prefix; at least one char.
    fn split_point(&self) -> usize {
        // ends[k - 1] is the byte end of the k-char prefix
        let ends: Vec<usize> = self
            .rest
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .chain(std::iter::once(self.rest.len()))
            .collect();

        let fits = |chars: usize| self.face.measure(&self.rest[..ends[chars - 1]]).width <= self.width;

        let (mut lo, mut hi) = (1usize, ends.len());
        let mut best = 1usize;
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            if fits(mid) {
                best = mid;
                lo = mid + 1;
            } else {
                hi = mid - 1;
            }
        }
        ends[best - 1]
    }
}

impl Iterator for CharWrap<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        if self.rest.is_empty() {
            return None;
        }

        let end = self.split_point();
        let (line, rest) = self.rest.split_at(end);
        self.rest = rest.trim_start();

        let text = match line.trim_end() {
            "" => line,
            trimmed => trimmed,
        };
        Some(Line::measured(text.to_string(), self.face))
    }
}

/// Either breaker, chosen by [`WrapMode`].
pub enum LineBreaker<'a> {
    Words(WordWrap<'a>),
    Characters(CharWrap<'a>),
}

impl<'a> LineBreaker<'a> {
    pub fn new(mode: WrapMode, text: &'a str, width: u32, face: ScaledFace<'a>) -> Self {
        match mode {
            WrapMode::Words => Self::Words(WordWrap::new(text, width, face)),
            WrapMode::Characters => Self::Characters(CharWrap::new(text, width, face)),
        }
    }
}

impl Iterator for LineBreaker<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        match self {
            Self::Words(w) => w.next(),
            Self::Characters(c) => c.next(),
        }
    }
}
