//! End-to-end tests: render, package, dispatch and the HTTP service.
//!
//! A fixed-advance typeface stands in for real font files so the tests run
//! on machines without any fonts installed.

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use image::{Rgb, RgbImage};
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use etikett::{
    Config, LabelError, LabelSize, LabelSpec,
    barcode::Code128Renderer,
    compose,
    dispatch::{Spooler, file::FileBackend},
    font::{FontHandle, FontRegistry, TextExtent, Typeface},
    label::Orientation,
    package,
    server::{self, AppState},
};

/// Every character is `advance` px wide and draws as a solid block.
struct BlockFace {
    advance: u32,
    line_height: u32,
}

impl Typeface for BlockFace {
    fn measure(&self, text: &str, _size_px: f32) -> TextExtent {
        let width = text.chars().count() as u32 * self.advance;
        TextExtent {
            width,
            height: self.line_height,
            bbox: (0, 0, width as i32, self.line_height as i32),
        }
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, _size_px: f32, origin: (i32, i32), color: Rgb<u8>) {
        let width = text.trim_end().chars().count() as i32 * self.advance as i32;
        for y in origin.1..origin.1 + self.line_height as i32 {
            for x in origin.0..origin.0 + width {
                if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
                    canvas.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}

fn block_face() -> Arc<dyn Typeface> {
    Arc::new(BlockFace {
        advance: 20,
        line_height: 40,
    })
}

fn registry() -> FontRegistry {
    let mut fonts = FontRegistry::default();
    fonts.insert_face("Block", "Regular", block_face());
    fonts.choose_default(&[]);
    fonts
}

fn state(spooler: Option<Spooler>) -> Arc<AppState> {
    Arc::new(AppState::new(Config::default(), registry(), spooler))
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = server::router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_render_and_package_copies() {
    let font = FontHandle::new("Block", "Regular", block_face());
    let size: LabelSize = "57x32".parse().unwrap();
    let spec = LabelSpec::builder(font).label_size(&size).build().unwrap();

    let canvas = compose::render(&spec, "Milch\n(2024-12-29)", None, &Code128Renderer::default()).unwrap();
    assert_eq!((canvas.width(), canvas.height()), (spec.width_px(), spec.height_px()));

    let document = package::package(&canvas, 3).unwrap();
    assert_eq!(document.page_count(), 3);
    assert!(document.as_bytes().starts_with(b"%PDF-"));
}

#[test]
fn test_render_with_barcode_darkens_bottom_strip() {
    let font = FontHandle::new("Block", "Regular", block_face());
    let size: LabelSize = "62".parse().unwrap();
    let spec = LabelSpec::builder(font).label_size(&size).build().unwrap();

    let canvas = compose::render(&spec, "Milch", Some("grcy:p:42"), &Code128Renderer::default()).unwrap();
    let image = canvas.image();
    let bottom = image.height() - 5;
    let dark = (0..image.width())
        .filter(|&x| image.get_pixel(x, bottom).0[0] < 128)
        .count();
    assert!(dark > 0);
}

#[test]
fn test_overflowing_text_is_rejected() {
    let font = FontHandle::new("Block", "Regular", block_face());
    let size: LabelSize = "57x32".parse().unwrap();
    let spec = LabelSpec::builder(font).label_size(&size).build().unwrap();

    let text = vec!["Zeile"; 20].join("\n");
    let err = compose::render(&spec, &text, None, &Code128Renderer::default()).unwrap_err();
    assert!(matches!(err, LabelError::Overflow { .. }));
}

#[test]
fn test_rotated_page_is_printer_oriented() {
    let font = FontHandle::new("Block", "Regular", block_face());
    let size: LabelSize = "57x32".parse().unwrap();
    let spec = LabelSpec::builder(font)
        .label_size(&size)
        .orientation(Orientation::Rotated)
        .build()
        .unwrap();

    let canvas = compose::render(&spec, "Milch", None, &Code128Renderer::default()).unwrap();
    let printed = canvas.print_image();
    assert_eq!((printed.width(), printed.height()), (canvas.height(), canvas.width()));
}

#[test]
fn test_spooler_writes_through_file_backend() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("lp0");
    let spooler = Spooler::new(dir.path().join("spool"), Box::new(FileBackend::new(&device)));
    std::fs::create_dir_all(spooler.dir()).unwrap();

    let font = FontHandle::new("Block", "Regular", block_face());
    let size: LabelSize = "57x32".parse().unwrap();
    let spec = LabelSpec::builder(font).label_size(&size).build().unwrap();
    let canvas = compose::render(&spec, "Milch", None, &Code128Renderer::default()).unwrap();
    let document = package::package(&canvas, 2).unwrap();

    spooler.submit("Milch", &document).unwrap();

    assert_eq!(std::fs::read(&device).unwrap(), document.as_bytes());
    assert_eq!(std::fs::read_dir(spooler.dir()).unwrap().count(), 0);
}

// ============================================================================
// HTTP
// ============================================================================

#[tokio::test]
async fn test_index_redirects_to_designer() {
    let (status, _, _) = get(state(None), "/").await;
    assert!(status.is_redirection());
}

#[tokio::test]
async fn test_label_sizes_listing() {
    let (status, _, body) = get(state(None), "/api/label-sizes").await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["default"], "57x32");
    assert!(
        body["label_sizes"]
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s["id"] == "62")
    );
}

#[tokio::test]
async fn test_fonts_listing() {
    let (status, _, body) = get(state(None), "/api/fonts").await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["default"], "Block (Regular)");
    assert_eq!(body["fonts"][0]["family"], "Block");
}

#[tokio::test]
async fn test_preview_returns_png() {
    let (status, content_type, body) = get(state(None), "/api/preview/text?text=Milch").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert!(body.starts_with(b"\x89PNG"));
}

#[tokio::test]
async fn test_preview_base64() {
    let (status, content_type, body) =
        get(state(None), "/api/preview/text?text=Milch&return_format=base64").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/plain"));
    // base64 of the PNG signature
    assert!(body.starts_with(b"iVBORw0KGgo"));
}

#[tokio::test]
async fn test_preview_rejects_bad_label_size() {
    let (status, _, body) = get(state(None), "/api/preview/text?text=Milch&label_size=nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["success"], false);
}

#[tokio::test]
async fn test_preview_rejects_absurd_resolution() {
    let (status, _, body) = get(state(None), "/api/preview/text?text=Milch&dpi=1000000000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["success"], false);
}

#[tokio::test]
async fn test_print_rejects_excessive_copies() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("lp0");
    let spooler = Spooler::new(dir.path(), Box::new(FileBackend::new(&device)));

    let (status, _, body) = get(state(Some(spooler)), "/api/print/text?text=Milch&copies=2000000000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["success"], false);
    assert!(!device.exists());
}

#[tokio::test]
async fn test_print_without_printer_fails() {
    let (status, _, body) = get(state(None), "/api/print/text?text=Milch").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["success"], false);
}

#[tokio::test]
async fn test_print_text_reaches_printer() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("lp0");
    let spooler = Spooler::new(dir.path(), Box::new(FileBackend::new(&device)));

    let (status, _, body) = get(state(Some(spooler)), "/api/print/text?text=Milch&copies=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["success"], true);

    let pdf = std::fs::read(&device).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_grocy_requires_product() {
    let (status, _, body) = get(state(None), "/api/print/grocy?grocycode=grcy:p:42").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["success"], false);
}

#[tokio::test]
async fn test_grocy_print() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("lp0");
    let spooler = Spooler::new(dir.path(), Box::new(FileBackend::new(&device)));

    let (status, _, body) = get(
        state(Some(spooler)),
        "/api/print/grocy?product=Milch&due_date=2025-01-05&grocycode=grcy:p:42",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["success"], true);
    assert!(device.exists());
}
