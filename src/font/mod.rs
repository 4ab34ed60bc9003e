//! # Fonts
//!
//! The layout engine and compositor only ever talk to a [`Typeface`]: a
//! measuring and drawing capability for one font file. Glyph metrics and
//! rasterization are delegated to `ab_glyph` ([`ttf::TtfTypeface`]).
//!
//! | Item | Description |
//! |------|-------------|
//! | [`Typeface`] | Measure and draw a single line of text |
//! | [`FontHandle`] | A resolved family/style plus its typeface |
//! | [`ScaledFace`] | A typeface bound to a pixel size |
//! | [`registry::FontRegistry`] | Read-only family/style → file index |

pub mod registry;
pub mod ttf;

use std::fmt;
use std::sync::Arc;

use image::{Rgb, RgbImage};

pub use registry::{FontRegistry, FontSelector};
pub use ttf::TtfTypeface;

/// Measured extent of a line of text.
///
/// `width` is the advance width, `height` the line height (ascent + descent).
/// `bbox` is the ink box `(left, top, right, bottom)` relative to the line's
/// top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
    pub bbox: (i32, i32, i32, i32),
}

/// Glyph metrics and rasterization for one font.
pub trait Typeface: Send + Sync {
    /// Measure `text` rendered at `size_px` (em height in pixels).
    fn measure(&self, text: &str, size_px: f32) -> TextExtent;

    /// Draw `text` with its top-left corner at `origin`, blending `color`
    /// into `canvas` by glyph coverage. Pixels outside the canvas are dropped.
    fn draw(&self, canvas: &mut RgbImage, text: &str, size_px: f32, origin: (i32, i32), color: Rgb<u8>);
}

/// A resolved font: family and style names plus the shared typeface.
#[derive(Clone)]
pub struct FontHandle {
    family: String,
    style: String,
    face: Arc<dyn Typeface>,
}

impl FontHandle {
    pub fn new(family: impl Into<String>, style: impl Into<String>, face: Arc<dyn Typeface>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
            face,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn face(&self) -> &dyn Typeface {
        self.face.as_ref()
    }

    /// Bind this font to a pixel size.
    pub fn at_size(&self, size_px: f32) -> ScaledFace<'_> {
        ScaledFace::new(self.face(), size_px)
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field("family", &self.family)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

/// A typeface at a fixed pixel size.
#[derive(Clone, Copy)]
pub struct ScaledFace<'a> {
    face: &'a dyn Typeface,
    size_px: f32,
}

impl<'a> ScaledFace<'a> {
    pub fn new(face: &'a dyn Typeface, size_px: f32) -> Self {
        Self { face, size_px }
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    #[inline]
    pub fn measure(&self, text: &str) -> TextExtent {
        self.face.measure(text, self.size_px)
    }

    pub fn draw(&self, canvas: &mut RgbImage, text: &str, origin: (i32, i32), color: Rgb<u8>) {
        self.face.draw(canvas, text, self.size_px, origin, color);
    }
}
