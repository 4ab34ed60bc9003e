//! TrueType/OpenType rendering through ab_glyph.
//!
//! Measures lines with advance widths plus kerning and rasterizes them with
//! anti-aliased coverage, blended into the label canvas in the fill color.

use std::path::Path;

use ab_glyph::{Font, FontArc, FontVec, GlyphId, PxScale, ScaleFont, point};
use image::{Rgb, RgbImage};

use super::{TextExtent, Typeface};
use crate::error::LabelError;

/// A font file loaded into memory.
#[derive(Clone)]
pub struct TtfTypeface {
    font: FontArc,
}

impl TtfTypeface {
    /// Load a `.ttf`/`.otf` file from disk.
    pub fn from_path(path: &Path) -> Result<Self, LabelError> {
        let data = std::fs::read(path)?;
        Self::from_vec(data).map_err(|e| {
            LabelError::Config(format!("Failed to load font {}: {}", path.display(), e))
        })
    }

    /// Load a font from owned bytes.
    pub fn from_vec(data: Vec<u8>) -> Result<Self, ab_glyph::InvalidFont> {
        let font = FontVec::try_from_vec(data)?;
        Ok(Self {
            font: FontArc::new(font),
        })
    }

    /// Glyph ids and caret positions for a line, kerning applied.
    fn glyph_positions(&self, text: &str, size_px: f32) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(PxScale::from(size_px));
        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret_x = 0.0f32;
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            let glyph_id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret_x += scaled.kern(prev, glyph_id);
            }
            glyphs.push((glyph_id, caret_x));
            caret_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }

        (glyphs, caret_x)
    }
}

impl Typeface for TtfTypeface {
    fn measure(&self, text: &str, size_px: f32) -> TextExtent {
        let scaled = self.font.as_scaled(PxScale::from(size_px));
        let (glyphs, advance) = self.glyph_positions(text, size_px);
        let ascent = scaled.ascent();
        let height = (ascent - scaled.descent()).ceil().max(1.0) as u32;

        // Ink box from the outlines; whitespace-only lines have none.
        let mut bbox: Option<(f32, f32, f32, f32)> = None;
        for &(glyph_id, glyph_x) in &glyphs {
            let glyph = glyph_id.with_scale_and_position(size_px, point(glyph_x, ascent));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let b = outlined.px_bounds();
                bbox = Some(match bbox {
                    None => (b.min.x, b.min.y, b.max.x, b.max.y),
                    Some((l, t, r, bo)) => (l.min(b.min.x), t.min(b.min.y), r.max(b.max.x), bo.max(b.max.y)),
                });
            }
        }
        let bbox = bbox
            .map(|(l, t, r, b)| (l.floor() as i32, t.floor() as i32, r.ceil() as i32, b.ceil() as i32))
            .unwrap_or((0, 0, 0, 0));

        TextExtent {
            width: advance.ceil().max(0.0) as u32,
            height,
            bbox,
        }
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, size_px: f32, origin: (i32, i32), color: Rgb<u8>) {
        let scaled = self.font.as_scaled(PxScale::from(size_px));
        let (glyphs, _) = self.glyph_positions(text, size_px);
        let baseline_y = origin.1 as f32 + scaled.ascent();
        let (width, height) = (canvas.width() as i32, canvas.height() as i32);

        for (glyph_id, glyph_x) in glyphs {
            let glyph = glyph_id.with_scale_and_position(
                size_px,
                point(origin.0 as f32 + glyph_x, baseline_y),
            );

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let x = px as i32 + bounds.min.x as i32;
                    let y = py as i32 + bounds.min.y as i32;

                    if x >= 0 && x < width && y >= 0 && y < height {
                        let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                        let c = coverage.clamp(0.0, 1.0);
                        for i in 0..3 {
                            let bg = pixel.0[i] as f32;
                            let fg = color.0[i] as f32;
                            pixel.0[i] = (bg + (fg - bg) * c).round() as u8;
                        }
                    }
                });
            }
        }
    }
}
