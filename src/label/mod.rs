//! # Label Specification
//!
//! [`LabelSpec`] is the validated description of one label: physical size,
//! resolution, margins, typography, orientation and stock kind. It is built
//! per request through [`LabelSpecBuilder`] and never mutated afterwards.
//!
//! ## Example
//!
//! ```no_run
//! use etikett::font::FontRegistry;
//! use etikett::label::{Alignment, LabelSize, LabelSpec};
//!
//! let fonts = FontRegistry::scan(&["/usr/share/fonts"]);
//! let font = fonts.resolve("DejaVu Sans", "Book")?;
//! let size: LabelSize = "57x32".parse()?;
//!
//! let spec = LabelSpec::builder(font)
//!     .label_size(&size)
//!     .dpi(300)
//!     .alignment(Alignment::Center)
//!     .build()?;
//! assert_eq!(spec.width_px(), 673);
//! # Ok::<(), etikett::LabelError>(())
//! ```

pub mod size;

use std::str::FromStr;

use image::Rgb;
use serde::{Deserialize, Serialize};

pub use size::{LabelSize, mm_to_px};

use crate::error::LabelError;
use crate::font::{FontHandle, ScaledFace};

/// Highest accepted resolution.
pub const MAX_DPI: u32 = 1200;

/// Largest accepted font size in points.
pub const MAX_FONT_SIZE_PT: f32 = 500.0;

/// Largest accepted gap between lines in pixels.
pub const MAX_LINE_SPACING_PX: u32 = 1000;

/// Horizontal placement of each laid-out line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    /// X offset of a line of width `line_width` on a canvas `canvas_width`
    /// wide.
    ///
    /// ```text
    /// left   → margin_left
    /// center → (canvas - line) / 2 + (margin_left - margin_right) / 2
    /// right  → canvas - line - margin_right
    /// ```
    ///
    /// The result is clamped to `[0, canvas - line]`, so a line that fits the
    /// canvas always lies fully inside it.
    pub fn x_offset(self, line_width: u32, canvas_width: u32, margin_left: u32, margin_right: u32) -> u32 {
        let (w, cw) = (line_width as i64, canvas_width as i64);
        let (ml, mr) = (margin_left as i64, margin_right as i64);
        let x = match self {
            Self::Left => ml,
            Self::Center => (cw - w) / 2 + (ml - mr) / 2,
            Self::Right => cw - w - mr,
        };
        x.clamp(0, (cw - w).max(0)) as u32
    }
}

impl FromStr for Alignment {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" | "centre" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            other => Err(LabelError::invalid(format!(
                "Invalid align value '{}'. Choose from 'left', 'center', or 'right'",
                other
            ))),
        }
    }
}

/// Which way text runs relative to the feed direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Text runs across the stock
    #[default]
    Standard,
    /// Text is turned by 90°, running along the feed
    Rotated,
}

impl FromStr for Orientation {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "rotated" => Ok(Self::Rotated),
            other => Err(LabelError::invalid(format!(
                "Invalid orientation '{}'. Choose from 'standard' or 'rotated'",
                other
            ))),
        }
    }
}

/// Physical stock type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    /// Pre-cut rectangular labels of fixed size
    FixedDieCut,
    /// Pre-cut round labels
    RoundDieCut,
    /// Endless roll, cut to the content length
    Continuous,
}

impl LabelKind {
    pub fn is_die_cut(self) -> bool {
        matches!(self, Self::FixedDieCut | Self::RoundDieCut)
    }
}

/// Line-breaking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    /// Greedy word wrap; parenthesized runs never split
    Words,
    /// Densest packing: break at any character
    Characters,
}

impl FromStr for WrapMode {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "words" | "word" => Ok(Self::Words),
            "characters" | "chars" | "char" => Ok(Self::Characters),
            other => Err(LabelError::invalid(format!(
                "Invalid wrap mode '{}'. Choose from 'words' or 'characters'",
                other
            ))),
        }
    }
}

/// Margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margins {
    pub fn uniform(mm: f32) -> Self {
        Self {
            top: mm,
            bottom: mm,
            left: mm,
            right: mm,
        }
    }

    pub fn to_px(&self, dpi: u32) -> PxMargins {
        PxMargins {
            top: mm_to_px(self.top, dpi),
            bottom: mm_to_px(self.bottom, dpi),
            left: mm_to_px(self.left, dpi),
            right: mm_to_px(self.right, dpi),
        }
    }
}

/// Margins converted to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PxMargins {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

/// How the barcode strip is cut and placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeGeometry {
    /// Strip height as a fraction of the label height
    pub height_ratio: f32,
    /// Rows trimmed from the top and bottom of the rendered bitmap
    pub crop_px: u32,
    /// Downward shift of the strip; the part past the bottom edge is clipped
    pub bottom_offset_px: u32,
}

impl Default for BarcodeGeometry {
    fn default() -> Self {
        Self {
            height_ratio: 0.5,
            crop_px: 15,
            bottom_offset_px: 0,
        }
    }
}

/// A validated label description.
#[derive(Debug, Clone)]
pub struct LabelSpec {
    width_mm: f32,
    height_mm: f32,
    dpi: u32,
    margins: Margins,
    alignment: Alignment,
    line_spacing: u32,
    fill_color: Rgb<u8>,
    font: FontHandle,
    font_size_pt: f32,
    orientation: Orientation,
    kind: LabelKind,
    wrap: WrapMode,
    barcode: BarcodeGeometry,
}

impl LabelSpec {
    /// Start building a spec with default geometry (57×32 mm die-cut,
    /// 300 DPI, no margins, centered, 17 pt).
    pub fn builder(font: FontHandle) -> LabelSpecBuilder {
        LabelSpecBuilder::new(font)
    }

    pub fn width_mm(&self) -> f32 {
        self.width_mm
    }

    pub fn height_mm(&self) -> f32 {
        self.height_mm
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn margins_px(&self) -> PxMargins {
        self.margins.to_px(self.dpi)
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn line_spacing(&self) -> u32 {
        self.line_spacing
    }

    pub fn fill_color(&self) -> Rgb<u8> {
        self.fill_color
    }

    pub fn font(&self) -> &FontHandle {
        &self.font
    }

    pub fn font_size_pt(&self) -> f32 {
        self.font_size_pt
    }

    /// Font em size in pixels at this spec's resolution.
    pub fn font_size_px(&self) -> f32 {
        self.font_size_pt * self.dpi as f32 / 72.0
    }

    /// The spec's font bound to its pixel size.
    pub fn face(&self) -> ScaledFace<'_> {
        self.font.at_size(self.font_size_px())
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    /// Line-breaking strategy; word wrap unless overridden.
    pub fn wrap(&self) -> WrapMode {
        self.wrap
    }

    pub fn barcode_geometry(&self) -> BarcodeGeometry {
        self.barcode
    }

    /// Nominal canvas width in pixels.
    pub fn width_px(&self) -> u32 {
        mm_to_px(self.width_mm, self.dpi)
    }

    /// Nominal canvas height in pixels.
    pub fn height_px(&self) -> u32 {
        mm_to_px(self.height_mm, self.dpi)
    }

    /// Nominal size of the reading canvas (the label as the text reads),
    /// `(width, height)` in pixels. Rotated labels swap the stock axes.
    pub fn canvas_size_px(&self) -> (u32, u32) {
        match self.orientation {
            Orientation::Standard => (self.width_px(), self.height_px()),
            Orientation::Rotated => (self.height_px(), self.width_px()),
        }
    }

    /// Width available to the line breaker. Rotated continuous labels grow
    /// sideways instead of wrapping, so they get an unbounded width.
    pub fn wrap_width_px(&self) -> u32 {
        if self.kind == LabelKind::Continuous && self.orientation == Orientation::Rotated {
            return u32::MAX;
        }
        let m = self.margins_px();
        self.canvas_size_px().0.saturating_sub(m.left + m.right)
    }
}

/// Builder for [`LabelSpec`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct LabelSpecBuilder {
    spec: LabelSpec,
}

impl LabelSpecBuilder {
    fn new(font: FontHandle) -> Self {
        Self {
            spec: LabelSpec {
                width_mm: 57.0,
                height_mm: 32.0,
                dpi: 300,
                margins: Margins::default(),
                alignment: Alignment::Center,
                line_spacing: 8,
                fill_color: Rgb([0, 0, 0]),
                font,
                font_size_pt: 17.0,
                orientation: Orientation::Standard,
                kind: LabelKind::FixedDieCut,
                wrap: WrapMode::Words,
                barcode: BarcodeGeometry::default(),
            },
        }
    }

    /// Physical size, stock kind and barcode offset from a preset.
    pub fn label_size(mut self, size: &LabelSize) -> Self {
        self.spec.width_mm = size.width_mm;
        self.spec.height_mm = size.height_mm;
        self.spec.kind = size.kind;
        self.spec.barcode.bottom_offset_px = size.barcode_offset_px;
        self
    }

    pub fn size_mm(mut self, width_mm: f32, height_mm: f32) -> Self {
        self.spec.width_mm = width_mm;
        self.spec.height_mm = height_mm;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.spec.dpi = dpi;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.spec.margins = margins;
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.spec.alignment = alignment;
        self
    }

    pub fn line_spacing(mut self, px: u32) -> Self {
        self.spec.line_spacing = px;
        self
    }

    pub fn fill_color(mut self, color: Rgb<u8>) -> Self {
        self.spec.fill_color = color;
        self
    }

    pub fn font_size_pt(mut self, pt: f32) -> Self {
        self.spec.font_size_pt = pt;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.spec.orientation = orientation;
        self
    }

    pub fn kind(mut self, kind: LabelKind) -> Self {
        self.spec.kind = kind;
        self
    }

    pub fn wrap(mut self, wrap: WrapMode) -> Self {
        self.spec.wrap = wrap;
        self
    }

    pub fn barcode_geometry(mut self, geometry: BarcodeGeometry) -> Self {
        self.spec.barcode = geometry;
        self
    }

    /// Validate and finish.
    pub fn build(self) -> Result<LabelSpec, LabelError> {
        let spec = self.spec;

        if !(spec.width_mm > 0.0 && spec.height_mm > 0.0) {
            return Err(LabelError::invalid(format!(
                "Label dimensions must be positive, got {}x{} mm",
                spec.width_mm, spec.height_mm
            )));
        }
        if spec.dpi == 0 || spec.dpi > MAX_DPI {
            return Err(LabelError::invalid(format!(
                "DPI must be between 1 and {}, got {}",
                MAX_DPI, spec.dpi
            )));
        }
        if !(spec.font_size_pt > 0.0 && spec.font_size_pt <= MAX_FONT_SIZE_PT) {
            return Err(LabelError::invalid(format!(
                "Font size must be in (0, {}] pt, got {}",
                MAX_FONT_SIZE_PT, spec.font_size_pt
            )));
        }
        if spec.line_spacing > MAX_LINE_SPACING_PX {
            return Err(LabelError::invalid(format!(
                "Line spacing must be at most {} px, got {}",
                MAX_LINE_SPACING_PX, spec.line_spacing
            )));
        }

        // Margins are relative to the reading canvas
        let (across, down) = match spec.orientation {
            Orientation::Standard => (spec.width_mm, spec.height_mm),
            Orientation::Rotated => (spec.height_mm, spec.width_mm),
        };
        let m = spec.margins;
        if [m.top, m.bottom, m.left, m.right].iter().any(|v| !(*v >= 0.0)) {
            return Err(LabelError::invalid("Margins must not be negative"));
        }
        if m.left + m.right > across {
            return Err(LabelError::invalid(format!(
                "Left and right margins ({} mm) exceed the label width ({} mm)",
                m.left + m.right,
                across
            )));
        }
        if m.top + m.bottom > down {
            return Err(LabelError::invalid(format!(
                "Top and bottom margins ({} mm) exceed the label height ({} mm)",
                m.top + m.bottom,
                down
            )));
        }

        let g = spec.barcode;
        if !(g.height_ratio > 0.0 && g.height_ratio <= 1.0) {
            return Err(LabelError::invalid(format!(
                "Barcode height ratio must be in (0, 1], got {}",
                g.height_ratio
            )));
        }

        Ok(spec)
    }
}
