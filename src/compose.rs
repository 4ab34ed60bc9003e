//! # Canvas Compositor
//!
//! Places a laid-out text block and an optional barcode strip on a white
//! raster sized from the label's physical dimensions.
//!
//! ## Canvas size
//!
//! | Stock | Orientation | Width | Height |
//! |-------|-------------|-------|--------|
//! | die-cut | standard | label width | label height |
//! | die-cut | rotated | label height | label width |
//! | continuous | standard | label width | text + margins + barcode |
//! | continuous | rotated | widest line + margins | label width |
//!
//! The canvas is the *reading* canvas: text runs left to right across it.
//! [`Canvas::print_image`] turns rotated canvases into feed orientation.
//!
//! ## Vertical placement
//!
//! ```text
//! continuous standard:  y = margin_top
//! otherwise:            y = (avail - text) / 2 + (margin_top - margin_bottom) / 2
//!                       avail = height - visible barcode rows
//! ```
//!
//! ## Barcode strip
//!
//! ```text
//! ┌───────────────────────┐
//! │        text           │
//! │                       │
//! ├───────────────────────┤ ◀─ height - strip + offset
//! │ ▌▌ ▌▌▌ ▌ ▌▌  ▌▌ ▌▌▌ ▌ │    strip = round(nominal height × ratio)
//! └───────────────────────┘
//!   (rows shifted past the bottom edge by `offset` are clipped)
//! ```
//!
//! Canvases larger than [`MAX_CANVAS_PIXELS`] are rejected before anything
//! is allocated.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};

use crate::barcode::BarcodeRenderer;
use crate::error::LabelError;
use crate::label::{BarcodeGeometry, LabelKind, LabelSpec, Orientation};
use crate::layout::{self, LayoutResult};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Largest canvas area, in pixels, that [`compose`] will allocate.
pub const MAX_CANVAS_PIXELS: u64 = 40_000_000;

/// A finished label raster in reading orientation.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbImage,
    orientation: Orientation,
    dpi: u32,
}

impl Canvas {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The raster as the text reads.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// The raster in feed orientation: rotated canvases are turned 90°
    /// clockwise, standard ones are returned as is.
    pub fn print_image(&self) -> RgbImage {
        match self.orientation {
            Orientation::Standard => self.image.clone(),
            Orientation::Rotated => imageops::rotate90(&self.image),
        }
    }
}

/// Crop the renderer padding off `raw` and scale it to `width` ×
/// `round(nominal_height × ratio)`.
fn prepare_barcode(
    raw: &GrayImage,
    width: u32,
    nominal_height: u32,
    geometry: BarcodeGeometry,
) -> Result<GrayImage, LabelError> {
    let crop = geometry.crop_px;
    if raw.height() <= crop * 2 || raw.width() == 0 {
        return Err(LabelError::Barcode(format!(
            "barcode image {}x{} is too small to crop {} rows from each edge",
            raw.width(),
            raw.height(),
            crop
        )));
    }

    let cropped = imageops::crop_imm(raw, 0, crop, raw.width(), raw.height() - crop * 2).to_image();
    let height = ((nominal_height as f32 * geometry.height_ratio).round() as u32).max(1);
    Ok(imageops::resize(&cropped, width, height, FilterType::Lanczos3))
}

/// Place `layout` (and `barcode`, if any) on a fresh canvas for `spec`.
///
/// Fails with [`LabelError::Overflow`] when the text block is taller than
/// the space left between the margins after reserving the barcode strip.
pub fn compose(spec: &LabelSpec, layout: &LayoutResult, barcode: Option<&GrayImage>) -> Result<Canvas, LabelError> {
    let m = spec.margins_px();
    let (nominal_w, nominal_h) = spec.canvas_size_px();
    let grows_down = spec.kind() == LabelKind::Continuous && spec.orientation() == Orientation::Standard;
    let grows_sideways = spec.kind() == LabelKind::Continuous && spec.orientation() == Orientation::Rotated;

    let width = if grows_sideways {
        layout.width().saturating_add(m.left + m.right).max(1)
    } else {
        nominal_w
    };
    if width == 0 || nominal_h == 0 {
        return Err(LabelError::invalid(format!(
            "Label is smaller than one pixel at {} DPI",
            spec.dpi()
        )));
    }

    check_area(width, nominal_h)?;

    let geometry = spec.barcode_geometry();
    let strip = barcode
        .map(|raw| prepare_barcode(raw, width, nominal_h, geometry))
        .transpose()?;
    let strip_h = strip.as_ref().map_or(0, |s| s.height());
    let visible = strip_h.saturating_sub(geometry.bottom_offset_px);

    let text_h = layout.height();
    let (height, y0) = if grows_down {
        let height = text_h
            .saturating_add(m.top + m.bottom)
            .saturating_add(visible);
        (height, m.top)
    } else {
        let avail = nominal_h.saturating_sub(visible);
        layout.ensure_fits(avail.saturating_sub(m.top + m.bottom))?;
        let y = (avail as i64 - text_h as i64) / 2 + (m.top as i64 - m.bottom as i64) / 2;
        (nominal_h, y.clamp(0, (avail - text_h) as i64) as u32)
    };

    check_area(width, height)?;

    tracing::debug!(
        width,
        height,
        lines = layout.lines().len(),
        barcode_rows = visible,
        "composing label"
    );

    let mut image = RgbImage::from_pixel(width, height, WHITE);

    let face = spec.face();
    for (top, line) in layout.line_tops() {
        let x = spec.alignment().x_offset(line.width, width, m.left, m.right);
        face.draw(&mut image, &line.text, (x as i32, (y0 + top) as i32), spec.fill_color());
    }

    if let Some(strip) = strip {
        let y = height as i64 - strip_h as i64 + geometry.bottom_offset_px as i64;
        let strip = DynamicImage::ImageLuma8(strip).to_rgb8();
        imageops::overlay(&mut image, &strip, 0, y);
    }

    Ok(Canvas {
        image,
        orientation: spec.orientation(),
        dpi: spec.dpi(),
    })
}

fn check_area(width: u32, height: u32) -> Result<(), LabelError> {
    let area = width as u64 * height as u64;
    if area > MAX_CANVAS_PIXELS {
        return Err(LabelError::invalid(format!(
            "Label of {}x{} px exceeds the limit of {} pixels",
            width, height, MAX_CANVAS_PIXELS
        )));
    }
    Ok(())
}

/// Lay out `text`, render the barcode for `barcode_data` (if any) and
/// compose the label.
pub fn render(
    spec: &LabelSpec,
    text: &str,
    barcode_data: Option<&str>,
    renderer: &dyn BarcodeRenderer,
) -> Result<Canvas, LabelError> {
    let layout = layout::layout(
        text,
        spec.wrap_width_px(),
        spec.face(),
        spec.line_spacing(),
        spec.wrap(),
    );
    let barcode = barcode_data.map(|data| renderer.render(data)).transpose()?;
    compose(spec, &layout, barcode.as_ref())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::testing::BoxFace;
    use crate::label::{LabelSize, LabelSpecBuilder, Margins, WrapMode};
    use image::Luma;
    use pretty_assertions::assert_eq;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn builder(advance: u32, line_height: u32) -> LabelSpecBuilder {
        LabelSpec::builder(BoxFace::new(advance, line_height).handle())
    }

    fn laid_out(spec: &LabelSpec, text: &str) -> LayoutResult {
        layout::layout(text, spec.wrap_width_px(), spec.face(), spec.line_spacing(), spec.wrap())
    }

    /// 15 white rows, `bars` black rows, 15 white rows.
    fn padded_strip(width: u32, bars: u32) -> GrayImage {
        GrayImage::from_fn(width, bars + 30, |_, y| {
            if (15..15 + bars).contains(&y) { Luma([0]) } else { Luma([255]) }
        })
    }

    struct SolidRenderer;

    impl BarcodeRenderer for SolidRenderer {
        fn render(&self, _data: &str) -> Result<GrayImage, LabelError> {
            Ok(padded_strip(40, 20))
        }
    }

    // ========================================================================
    // Canvas size
    // ========================================================================

    #[test]
    fn test_die_cut_canvas_is_nominal_size() {
        let size: LabelSize = "57x32".parse().unwrap();
        let spec = builder(10, 40).label_size(&size).build().unwrap();
        let canvas = compose(&spec, &laid_out(&spec, "Hello"), None).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (673, 378));
    }

    #[test]
    fn test_continuous_standard_grows_with_text() {
        let size: LabelSize = "62".parse().unwrap();
        let spec = builder(10, 40)
            .label_size(&size)
            .dpi(254)
            .margins(Margins {
                top: 1.0,
                bottom: 1.0,
                ..Default::default()
            })
            .build()
            .unwrap();
        let canvas = compose(&spec, &laid_out(&spec, "a\nb"), None).unwrap();
        // 40 + 8 + 40 text, 10 + 10 margins
        assert_eq!((canvas.width(), canvas.height()), (620, 108));
        assert_eq!(*canvas.image().get_pixel(310, 9), WHITE);
        assert_eq!(*canvas.image().get_pixel(310, 10), BLACK);
    }

    #[test]
    fn test_continuous_standard_adds_barcode_rows() {
        let spec = builder(10, 20)
            .kind(LabelKind::Continuous)
            .size_mm(25.4, 25.4)
            .dpi(100)
            .build()
            .unwrap();
        let canvas = compose(&spec, &laid_out(&spec, "x"), Some(&padded_strip(30, 10))).unwrap();
        // 20 text rows + 50 barcode rows
        assert_eq!(canvas.height(), 70);
        assert_eq!(*canvas.image().get_pixel(0, 20), BLACK);
        assert_eq!(*canvas.image().get_pixel(0, 19), WHITE);
    }

    #[test]
    fn test_rotated_die_cut_swaps_axes() {
        let spec = builder(10, 20)
            .size_mm(20.0, 10.0)
            .dpi(254)
            .orientation(Orientation::Rotated)
            .build()
            .unwrap();
        let canvas = compose(&spec, &laid_out(&spec, "up"), None).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (100, 200));
        let print = canvas.print_image();
        assert_eq!((print.width(), print.height()), (200, 100));
    }

    #[test]
    fn test_rotated_continuous_grows_sideways() {
        let spec = builder(10, 20)
            .kind(LabelKind::Continuous)
            .size_mm(20.0, 10.0)
            .dpi(254)
            .orientation(Orientation::Rotated)
            .margins(Margins {
                left: 1.0,
                right: 1.0,
                ..Default::default()
            })
            .build()
            .unwrap();
        let text = "abcdefghij abcdefghij abcdefghij";
        let layout = laid_out(&spec, text);
        assert_eq!(layout.lines().len(), 1);

        let canvas = compose(&spec, &layout, None).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (320 + 20, 200));
        let print = canvas.print_image();
        assert_eq!((print.width(), print.height()), (200, 340));
    }

    #[test]
    fn test_round_die_cut_is_fixed_and_centered() {
        let size: LabelSize = "d24".parse().unwrap();
        assert_eq!(size.kind, LabelKind::RoundDieCut);
        let spec = builder(10, 40).label_size(&size).build().unwrap();

        let canvas = compose(&spec, &laid_out(&spec, "Hello"), None).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (283, 283));

        let image = canvas.image();
        // x = (283 - 50) / 2, y = (283 - 40) / 2
        assert_eq!(*image.get_pixel(116, 121), BLACK);
        assert_eq!(*image.get_pixel(115, 121), WHITE);
        assert_eq!(*image.get_pixel(116, 120), WHITE);
        assert_eq!(*image.get_pixel(165, 160), BLACK);
        assert_eq!(*image.get_pixel(166, 160), WHITE);
        assert_eq!(*image.get_pixel(165, 161), WHITE);
    }

    #[test]
    fn test_round_die_cut_does_not_grow() {
        let size: LabelSize = "d24".parse().unwrap();
        let spec = builder(10, 40).label_size(&size).build().unwrap();
        let text = vec!["Zeile"; 8].join("\n");
        let err = compose(&spec, &laid_out(&spec, &text), None).unwrap_err();
        assert!(matches!(err, LabelError::Overflow { .. }));
    }

    // ========================================================================
    // Size limits
    // ========================================================================

    #[test]
    fn test_oversized_die_cut_rejected_before_allocation() {
        let size: LabelSize = "1000x1000".parse().unwrap();
        let spec = builder(10, 40).label_size(&size).build().unwrap();
        let err = compose(&spec, &laid_out(&spec, "x"), None).unwrap_err();
        assert!(matches!(err, LabelError::InvalidArgument(_)));
    }

    #[test]
    fn test_continuous_growth_is_capped() {
        let spec = builder(10, 1000)
            .kind(LabelKind::Continuous)
            .size_mm(254.0, 10.0)
            .dpi(100)
            .build()
            .unwrap();
        // 1000 px wide, 50 lines of 1000 px each
        let text = vec!["x"; 50].join("\n");
        let err = compose(&spec, &laid_out(&spec, &text), None).unwrap_err();
        assert!(matches!(err, LabelError::InvalidArgument(_)));

        let ok = compose(&spec, &laid_out(&spec, "x\nx"), None).unwrap();
        assert_eq!(ok.height(), 2008);
    }

    #[test]
    fn test_sideways_growth_is_capped() {
        let spec = builder(1000, 20)
            .kind(LabelKind::Continuous)
            .size_mm(254.0, 10.0)
            .dpi(100)
            .orientation(Orientation::Rotated)
            .build()
            .unwrap();
        // one 50_000 px line on a 1000 px tall canvas
        let text = "x".repeat(50);
        let err = compose(&spec, &laid_out(&spec, &text), None).unwrap_err();
        assert!(matches!(err, LabelError::InvalidArgument(_)));
    }

    // ========================================================================
    // Placement
    // ========================================================================

    #[test]
    fn test_single_line_is_centered() {
        let size: LabelSize = "57x32".parse().unwrap();
        let spec = builder(10, 40).label_size(&size).build().unwrap();
        let canvas = compose(&spec, &laid_out(&spec, "Hello"), None).unwrap();
        let image = canvas.image();
        // x = (673 - 50) / 2, y = (378 - 40) / 2
        assert_eq!(*image.get_pixel(311, 169), BLACK);
        assert_eq!(*image.get_pixel(310, 169), WHITE);
        assert_eq!(*image.get_pixel(311, 168), WHITE);
        assert_eq!(*image.get_pixel(360, 208), BLACK);
        assert_eq!(*image.get_pixel(361, 208), WHITE);
    }

    #[test]
    fn test_vertical_margin_delta() {
        let spec = builder(10, 20)
            .size_mm(25.4, 25.4)
            .dpi(100)
            .margins(Margins {
                top: 2.54,
                ..Default::default()
            })
            .build()
            .unwrap();
        let canvas = compose(&spec, &laid_out(&spec, "x"), None).unwrap();
        // (100 - 20) / 2 + (10 - 0) / 2
        assert_eq!(*canvas.image().get_pixel(45, 45), BLACK);
        assert_eq!(*canvas.image().get_pixel(45, 44), WHITE);
    }

    #[test]
    fn test_left_alignment_respects_margin() {
        let spec = builder(10, 20)
            .size_mm(25.4, 25.4)
            .dpi(100)
            .alignment(crate::label::Alignment::Left)
            .margins(Margins {
                left: 0.508,
                ..Default::default()
            })
            .build()
            .unwrap();
        let canvas = compose(&spec, &laid_out(&spec, "x"), None).unwrap();
        assert_eq!(*canvas.image().get_pixel(1, 40), WHITE);
        assert_eq!(*canvas.image().get_pixel(2, 40), BLACK);
    }

    // ========================================================================
    // Barcode
    // ========================================================================

    fn white_text_spec(offset: u32) -> LabelSpec {
        builder(10, 20)
            .size_mm(25.4, 25.4)
            .dpi(100)
            .fill_color(WHITE)
            .barcode_geometry(BarcodeGeometry {
                bottom_offset_px: offset,
                ..Default::default()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_barcode_flush_with_bottom() {
        let spec = white_text_spec(0);
        let canvas = compose(&spec, &laid_out(&spec, "x"), Some(&padded_strip(37, 12))).unwrap();
        let image = canvas.image();
        // strip is 100 × 50, padding cropped
        assert_eq!(*image.get_pixel(0, 49), WHITE);
        assert_eq!(*image.get_pixel(0, 50), BLACK);
        assert_eq!(*image.get_pixel(99, 99), BLACK);
    }

    #[test]
    fn test_barcode_bottom_offset_clips() {
        let spec = white_text_spec(15);
        let canvas = compose(&spec, &laid_out(&spec, "x"), Some(&padded_strip(37, 12))).unwrap();
        assert_eq!(*canvas.image().get_pixel(50, 64), WHITE);
        assert_eq!(*canvas.image().get_pixel(50, 65), BLACK);
    }

    #[test]
    fn test_barcode_too_short_to_crop() {
        let spec = white_text_spec(0);
        let raw = GrayImage::from_pixel(40, 30, Luma([0]));
        let err = compose(&spec, &laid_out(&spec, "x"), Some(&raw)).unwrap_err();
        assert!(matches!(err, LabelError::Barcode(_)));
    }

    // ========================================================================
    // Overflow
    // ========================================================================

    #[test]
    fn test_overflow_reports_sizes() {
        let spec = builder(10, 20).size_mm(20.0, 5.0).dpi(254).build().unwrap();
        let err = compose(&spec, &laid_out(&spec, "a\nb\nc"), None).unwrap_err();
        match err {
            LabelError::Overflow { required, available } => {
                assert_eq!(required, 76);
                assert_eq!(available, 50);
            }
            other => panic!("expected overflow, got {:?}", other),
        }
    }

    #[test]
    fn test_barcode_reserves_space() {
        let spec = builder(10, 20).size_mm(25.4, 25.4).dpi(100).line_spacing(0).build().unwrap();
        let layout = laid_out(&spec, "a\nb\nc");
        assert!(compose(&spec, &layout, None).is_ok());
        // 60 text rows vs 100 - 50 barcode rows
        let err = compose(&spec, &layout, Some(&padded_strip(10, 10))).unwrap_err();
        assert!(matches!(err, LabelError::Overflow { required: 60, available: 50 }));
    }

    #[test]
    fn test_render_runs_whole_pipeline() {
        let spec = builder(10, 20)
            .size_mm(25.4, 25.4)
            .dpi(100)
            .wrap(WrapMode::Characters)
            .build()
            .unwrap();
        let canvas = render(&spec, "abc", Some("grcy:p:1"), &SolidRenderer).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (100, 100));
        assert_eq!(*canvas.image().get_pixel(50, 99), BLACK);
    }
}
