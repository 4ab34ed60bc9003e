//! Barcode rendering.
//!
//! Uses the barcoders crate for Code 128 encoding. The rendered bitmap has
//! `padding_px` white rows above and below the bars; the compositor crops
//! them off before scaling the strip to the label width.

use barcoders::sym::code128::Code128;
use image::{GrayImage, Luma};

use crate::error::LabelError;

/// Turns a payload into a barcode bitmap.
pub trait BarcodeRenderer: Send + Sync {
    fn render(&self, data: &str) -> Result<GrayImage, LabelError>;
}

/// Code 128 (character set B) renderer without quiet zone or caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code128Renderer {
    /// Pixels per narrow module
    pub module_width_px: u32,
    /// Height of the bars, excluding padding
    pub bar_height_px: u32,
    /// White rows above and below the bars
    pub padding_px: u32,
}

impl Default for Code128Renderer {
    fn default() -> Self {
        Self {
            module_width_px: 4,
            bar_height_px: 120,
            padding_px: 15,
        }
    }
}

impl Code128Renderer {
    /// Encode `data` as bar modules (1 = bar, 0 = space).
    pub fn encode(&self, data: &str) -> Result<Vec<u8>, LabelError> {
        if data.is_empty() {
            return Err(LabelError::Barcode("barcode data is empty".to_string()));
        }
        // Set B covers upper/lowercase, digits and punctuation
        let prefixed = format!("\u{0181}{}", data);
        let barcode =
            Code128::new(&prefixed).map_err(|e| LabelError::Barcode(format!("cannot encode {:?}: {:?}", data, e)))?;
        Ok(barcode.encode())
    }
}

impl BarcodeRenderer for Code128Renderer {
    fn render(&self, data: &str) -> Result<GrayImage, LabelError> {
        let modules = self.encode(data)?;
        let scale = self.module_width_px.max(1);
        let width = modules.len() as u32 * scale;
        let height = self.bar_height_px.max(1) + 2 * self.padding_px;

        let bars = self.padding_px..self.padding_px + self.bar_height_px.max(1);
        let image = GrayImage::from_fn(width, height, |x, y| {
            let is_bar = modules[(x / scale) as usize] == 1;
            if is_bar && bars.contains(&y) { Luma([0]) } else { Luma([255]) }
        });
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code128_encoding() {
        let modules = Code128Renderer::default().encode("grcy:p:42").unwrap();
        assert!(!modules.is_empty());
        assert!(modules.iter().any(|&m| m == 1));
    }

    #[test]
    fn test_render_dimensions() {
        let renderer = Code128Renderer {
            module_width_px: 2,
            bar_height_px: 50,
            padding_px: 10,
        };
        let modules = renderer.encode("ABC").unwrap();
        let image = renderer.render("ABC").unwrap();
        assert_eq!(image.width(), modules.len() as u32 * 2);
        assert_eq!(image.height(), 70);
    }

    #[test]
    fn test_padding_rows_are_white() {
        let renderer = Code128Renderer::default();
        let image = renderer.render("12345").unwrap();
        for x in 0..image.width() {
            assert_eq!(image.get_pixel(x, 0)[0], 255);
            assert_eq!(image.get_pixel(x, image.height() - 1)[0], 255);
        }
        // Code 128 starts with a bar
        assert_eq!(image.get_pixel(0, image.height() / 2)[0], 0);
    }

    #[test]
    fn test_empty_data_is_rejected() {
        let err = Code128Renderer::default().render("").unwrap_err();
        assert!(matches!(err, LabelError::Barcode(_)));
    }
}
