//! # Label Stock Presets
//!
//! Physical label sizes the service knows about. Each preset records the
//! printable size in millimetres, the stock kind, and the barcode bottom
//! offset measured for that stock.
//!
//! | Id | Size | Kind | Barcode offset |
//! |----|------|------|----------------|
//! | `57x32` | 57 × 32 mm | die-cut | 15 px |
//! | `54x25` | 54 × 25 mm | die-cut | 0 px |
//! | `62x29` | 62 × 29 mm | die-cut | 0 px |
//! | `62x100` | 62 × 100 mm | die-cut | 0 px |
//! | `29x90` | 29 × 90 mm | die-cut | 0 px |
//! | `d24` | ⌀ 24 mm | round die-cut | 0 px |
//! | `d58` | ⌀ 58 mm | round die-cut | 0 px |
//! | `29` | 29 mm endless | continuous | 0 px |
//! | `62` | 62 mm endless | continuous | 0 px |
//!
//! Continuous presets carry a nominal length, used only to size the barcode
//! strip; the label itself grows to fit its text.
//!
//! ## Conversion
//!
//! ```text
//! px = round(mm / 25.4 * dpi)
//!
//! 57 mm @ 300 DPI = round(673.2) = 673 px
//! ```

use std::str::FromStr;

use serde::Serialize;

use super::LabelKind;
use crate::error::LabelError;

/// Convert millimetres to pixels at `dpi`.
#[inline]
pub fn mm_to_px(mm: f32, dpi: u32) -> u32 {
    (mm / 25.4 * dpi as f32).round().max(0.0) as u32
}

/// A label stock size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSize {
    /// Identifier used in requests and configuration (e.g. `"57x32"`)
    pub id: String,
    /// Human-readable description
    pub name: String,
    pub width_mm: f32,
    pub height_mm: f32,
    pub kind: LabelKind,
    /// Downward barcode shift for stock whose printable area is inset
    pub barcode_offset_px: u32,
}

/// `(id, name, width_mm, height_mm, kind, barcode_offset_px)`
const PRESETS: &[(&str, &str, f32, f32, LabelKind, u32)] = &[
    ("57x32", "57mm x 32mm", 57.0, 32.0, LabelKind::FixedDieCut, 15),
    ("54x25", "54mm x 25mm", 54.0, 25.0, LabelKind::FixedDieCut, 0),
    ("62x29", "62mm x 29mm", 62.0, 29.0, LabelKind::FixedDieCut, 0),
    ("62x100", "62mm x 100mm", 62.0, 100.0, LabelKind::FixedDieCut, 0),
    ("29x90", "29mm x 90mm", 29.0, 90.0, LabelKind::FixedDieCut, 0),
    ("d24", "24mm round", 24.0, 24.0, LabelKind::RoundDieCut, 0),
    ("d58", "58mm round", 58.0, 58.0, LabelKind::RoundDieCut, 0),
    ("29", "29mm endless", 29.0, 29.0, LabelKind::Continuous, 0),
    ("62", "62mm endless", 62.0, 29.0, LabelKind::Continuous, 0),
];

impl LabelSize {
    /// All built-in presets.
    pub fn built_in() -> Vec<Self> {
        PRESETS
            .iter()
            .map(|&(id, name, width_mm, height_mm, kind, barcode_offset_px)| Self {
                id: id.to_string(),
                name: name.to_string(),
                width_mm,
                height_mm,
                kind,
                barcode_offset_px,
            })
            .collect()
    }

    /// Width in pixels at `dpi`.
    pub fn width_px(&self, dpi: u32) -> u32 {
        mm_to_px(self.width_mm, dpi)
    }

    /// Height in pixels at `dpi`.
    pub fn height_px(&self, dpi: u32) -> u32 {
        mm_to_px(self.height_mm, dpi)
    }
}

impl FromStr for LabelSize {
    type Err = LabelError;

    /// Parse a preset id, or an arbitrary `"WxH"` size in millimetres
    /// (treated as fixed die-cut stock).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_lowercase();
        if let Some(preset) = Self::built_in().into_iter().find(|p| p.id == id) {
            return Ok(preset);
        }

        let (w, h) = id.split_once('x').ok_or_else(|| {
            LabelError::invalid(format!(
                "Unknown label size '{}'. Use a preset id or 'WIDTHxHEIGHT' in mm",
                s
            ))
        })?;
        let width_mm: f32 = w
            .trim()
            .parse()
            .map_err(|_| LabelError::invalid(format!("Invalid label width: {}", w)))?;
        let height_mm: f32 = h
            .trim()
            .parse()
            .map_err(|_| LabelError::invalid(format!("Invalid label height: {}", h)))?;
        if !(width_mm > 0.0 && height_mm > 0.0) {
            return Err(LabelError::invalid(format!(
                "Label size must be positive, got {}x{}",
                width_mm, height_mm
            )));
        }

        Ok(Self {
            name: format!("{}mm x {}mm", width_mm, height_mm),
            id,
            width_mm,
            height_mm,
            kind: LabelKind::FixedDieCut,
            barcode_offset_px: 0,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_px() {
        assert_eq!(mm_to_px(57.0, 300), 673);
        assert_eq!(mm_to_px(32.0, 300), 378);
        assert_eq!(mm_to_px(25.4, 203), 203);
        assert_eq!(mm_to_px(0.0, 300), 0);
    }

    #[test]
    fn test_preset_lookup() {
        let size: LabelSize = "57x32".parse().unwrap();
        assert_eq!(size.kind, LabelKind::FixedDieCut);
        assert_eq!(size.barcode_offset_px, 15);
        assert_eq!(size.width_px(300), 673);

        let endless: LabelSize = "62".parse().unwrap();
        assert_eq!(endless.kind, LabelKind::Continuous);

        let round: LabelSize = "D24".parse().unwrap();
        assert_eq!(round.kind, LabelKind::RoundDieCut);
    }

    #[test]
    fn test_custom_size_is_die_cut() {
        let size: LabelSize = "40x20".parse().unwrap();
        assert_eq!(size.kind, LabelKind::FixedDieCut);
        assert_eq!(size.width_mm, 40.0);
        assert_eq!(size.height_mm, 20.0);
        assert_eq!(size.barcode_offset_px, 0);
    }

    #[test]
    fn test_invalid_sizes() {
        assert!("banana".parse::<LabelSize>().is_err());
        assert!("0x20".parse::<LabelSize>().is_err());
        assert!("40xabc".parse::<LabelSize>().is_err());
    }

    #[test]
    fn test_preset_ids_are_unique() {
        let presets = LabelSize::built_in();
        let mut ids: Vec<_> = presets.iter().map(|p| p.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), presets.len());
    }
}
