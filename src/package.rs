//! # Page Packager
//!
//! Serializes a finished [`Canvas`] as print-ready PDF pages.
//!
//! The canvas is encoded exactly once into an [`EncodedPage`]: a
//! Flate-compressed RGB image XObject, the content stream that paints it,
//! and the media box. Every copy is a page object pointing at that same
//! image and content stream:
//!
//! ```text
//! Catalog ─▶ Pages (/Count N)
//!              ├─ Page 1 ─┐
//!              ├─ Page 2 ─┼─▶ /Im0 (image XObject)   written once
//!              └─ Page N ─┘    content stream        written once
//! ```
//!
//! Page size in points is `px / dpi * 72`, taken from the feed-oriented
//! raster ([`Canvas::print_image`]).

use std::io::Cursor;
use std::path::Path;

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use miniz_oxide::deflate::{CompressionLevel, compress_to_vec_zlib};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};

use crate::compose::Canvas;
use crate::error::LabelError;

const IMAGE_NAME: Name<'static> = Name(b"Im0");

/// A canvas encoded once, ready to be referenced by any number of pages.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    image: Vec<u8>,
    width_px: u32,
    height_px: u32,
    content: Vec<u8>,
    media_box: Rect,
}

impl EncodedPage {
    /// Compress the feed-oriented raster and build the painting content
    /// stream.
    pub fn encode(canvas: &Canvas) -> Self {
        let raster = canvas.print_image();
        let (width_px, height_px) = raster.dimensions();

        let level = CompressionLevel::DefaultLevel as u8;
        let image = compress_to_vec_zlib(raster.as_raw(), level);

        let dpi = canvas.dpi() as f32;
        let width_pt = width_px as f32 / dpi * 72.0;
        let height_pt = height_px as f32 / dpi * 72.0;

        let mut content = Content::new();
        content.save_state();
        content.transform([width_pt, 0.0, 0.0, height_pt, 0.0, 0.0]);
        content.x_object(IMAGE_NAME);
        content.restore_state();

        Self {
            image,
            width_px,
            height_px,
            content: content.finish(),
            media_box: Rect::new(0.0, 0.0, width_pt, height_pt),
        }
    }

    /// Page size in points.
    pub fn size_pt(&self) -> (f32, f32) {
        (self.media_box.x2, self.media_box.y2)
    }

    /// Write a document with `copies` pages that all show this page.
    fn write_document(&self, copies: usize) -> Vec<u8> {
        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let image_id = Ref::new(3);
        let content_id = Ref::new(4);
        let page_ids: Vec<Ref> = (0..copies).map(|i| Ref::new(5 + i as i32)).collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id)
            .kids(page_ids.iter().copied())
            .count(copies as i32);

        for &id in &page_ids {
            let mut page = pdf.page(id);
            page.media_box(self.media_box);
            page.parent(page_tree_id);
            page.contents(content_id);
            page.resources().x_objects().pair(IMAGE_NAME, image_id);
            page.finish();
        }

        let mut image = pdf.image_xobject(image_id, &self.image);
        image.filter(Filter::FlateDecode);
        image.width(self.width_px as i32);
        image.height(self.height_px as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        pdf.stream(content_id, &self.content);
        pdf.finish()
    }
}

/// Serialized PDF bytes plus the number of pages in them.
#[derive(Debug, Clone)]
pub struct PrintDocument {
    bytes: Vec<u8>,
    pages: usize,
}

impl PrintDocument {
    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write_to(&self, path: &Path) -> Result<(), LabelError> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Most pages one document may carry.
pub const MAX_COPIES: i64 = 1000;

/// Package `canvas` as a document with `copies` identical pages.
///
/// Copies outside `1..=MAX_COPIES` fail with [`LabelError::InvalidArgument`].
pub fn package(canvas: &Canvas, copies: i64) -> Result<PrintDocument, LabelError> {
    if !(1..=MAX_COPIES).contains(&copies) {
        return Err(LabelError::invalid(format!(
            "Copies must be between 1 and {}, got {}",
            MAX_COPIES, copies
        )));
    }
    let copies = copies as usize;

    let page = EncodedPage::encode(canvas);
    let bytes = page.write_document(copies);
    tracing::debug!(copies, bytes = bytes.len(), "packaged label");

    Ok(PrintDocument { bytes, pages: copies })
}

/// Encode the feed-oriented raster as PNG.
pub fn preview_png(canvas: &Canvas) -> Result<Vec<u8>, LabelError> {
    let raster = canvas.print_image();
    let mut png_bytes = Cursor::new(Vec::new());
    PngEncoder::new(&mut png_bytes).write_image(
        raster.as_raw(),
        raster.width(),
        raster.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(png_bytes.into_inner())
}
