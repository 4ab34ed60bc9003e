//! HTTP handlers for the server.
//!
//! Every label endpoint takes the same flat parameter set, either as a
//! query string (GET) or as an urlencoded form (POST). Values arrive as
//! strings and are validated here, so a malformed value comes back as a
//! `{"success": false, "error": ...}` body rather than a bare rejection.
//!
//! `font_size` is in points and scales with `dpi`. Clients that size text
//! in pixels (the Grocy webhook sends `font_size=70` style values) pass
//! `font_size_px` instead, which wins when both are present.

pub mod designer;
pub mod grocy;
pub mod text;

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::compose;
use crate::error::LabelError;
use crate::font::FontSelector;
use crate::label::{Alignment, LabelSize, LabelSpec, Margins, Orientation, WrapMode};
use crate::package::{self, PrintDocument};

use super::state::AppState;

/// Request parameters shared by the label endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LabelParams {
    pub text: Option<String>,
    /// `"Family (Style)"`
    pub font_family: Option<String>,
    /// Points
    pub font_size: Option<String>,
    /// Pixels at the requested DPI
    pub font_size_px: Option<String>,
    pub label_size: Option<String>,
    pub orientation: Option<String>,
    pub dpi: Option<String>,
    /// Millimetres
    pub margin_top: Option<String>,
    pub margin_bottom: Option<String>,
    pub margin_left: Option<String>,
    pub margin_right: Option<String>,
    /// Pixels
    pub line_spacing: Option<String>,
    pub align: Option<String>,
    pub copies: Option<String>,
    pub wrap: Option<String>,
    /// `png` (default) or `base64`
    pub return_format: Option<String>,

    // Grocy webhook
    pub product: Option<String>,
    pub due_date: Option<String>,
    pub grocycode: Option<String>,
    pub print_due_date: Option<String>,
    pub print_today: Option<String>,
    pub print_date: Option<String>,
    pub print_alias: Option<String>,
    pub alias_userfield: Option<String>,
}

/// A parameter's value, ignoring blanks.
pub(crate) fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_field<T: FromStr>(name: &str, value: &Option<String>) -> Result<Option<T>, LabelError> {
    field(value)
        .map(|v| {
            v.parse()
                .map_err(|_| LabelError::invalid(format!("Invalid value for {}: '{}'", name, v)))
        })
        .transpose()
}

/// Parse a `0`/`1` style flag.
pub(crate) fn parse_flag(name: &str, value: &Option<String>, default: bool) -> Result<bool, LabelError> {
    match field(value).map(str::to_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(LabelError::invalid(format!("Invalid value for {}: '{}'", name, other))),
    }
}

impl LabelParams {
    /// Requested copy count; 1 when absent.
    pub fn copies(&self) -> Result<i64, LabelError> {
        Ok(parse_field("copies", &self.copies)?.unwrap_or(1))
    }

    pub fn wants_base64(&self) -> bool {
        field(&self.return_format).is_some_and(|f| f.eq_ignore_ascii_case("base64"))
    }
}

/// Build a validated label spec from request parameters and the configured
/// defaults.
pub fn build_spec(state: &AppState, params: &LabelParams) -> Result<LabelSpec, LabelError> {
    let defaults = &state.config.label;

    let size: LabelSize = field(&params.label_size)
        .unwrap_or(defaults.default_size.as_str())
        .parse()?;
    let selector = field(&params.font_family).map(FontSelector::parse).transpose()?;
    let font = state.fonts.resolve_or_default(selector.as_ref())?;

    let orientation: Orientation = match field(&params.orientation) {
        Some(v) => v.parse()?,
        None => defaults.default_orientation,
    };
    let alignment: Alignment = match field(&params.align) {
        Some(v) => v.parse()?,
        None => defaults.align,
    };
    let margins = Margins {
        top: parse_field("margin_top", &params.margin_top)?.unwrap_or(defaults.margins.top),
        bottom: parse_field("margin_bottom", &params.margin_bottom)?.unwrap_or(defaults.margins.bottom),
        left: parse_field("margin_left", &params.margin_left)?.unwrap_or(defaults.margins.left),
        right: parse_field("margin_right", &params.margin_right)?.unwrap_or(defaults.margins.right),
    };

    let dpi = parse_field("dpi", &params.dpi)?.unwrap_or(defaults.dpi);
    let font_size_pt = match (
        parse_field::<f32>("font_size", &params.font_size)?,
        parse_field::<f32>("font_size_px", &params.font_size_px)?,
    ) {
        (_, Some(px)) => px * 72.0 / dpi.max(1) as f32,
        (Some(pt), None) => pt,
        (None, None) => defaults.font_size_pt,
    };

    let mut builder = LabelSpec::builder(font)
        .label_size(&size)
        .dpi(dpi)
        .font_size_pt(font_size_pt)
        .line_spacing(parse_field("line_spacing", &params.line_spacing)?.unwrap_or(defaults.line_spacing))
        .alignment(alignment)
        .orientation(orientation)
        .margins(margins)
        .barcode_geometry(state.config.barcode.geometry(size.barcode_offset_px));
    if let Some(wrap) = field(&params.wrap) {
        builder = builder.wrap(wrap.parse::<WrapMode>()?);
    }
    builder.build()
}

/// Render, package and dispatch one label. Returns the number of pages
/// printed.
pub(crate) fn print_label(
    state: &AppState,
    params: &LabelParams,
    text: &str,
    barcode: Option<&str>,
    job_name: &str,
) -> Result<usize, LabelError> {
    let spec = build_spec(state, params)?;
    let copies = params.copies()?;
    let canvas = compose::render(&spec, text, barcode, &state.barcode)?;
    let document: PrintDocument = package::package(&canvas, copies)?;

    let spooler = state
        .spooler
        .as_ref()
        .ok_or_else(|| LabelError::Config("No printer configured".to_string()))?;
    spooler.submit(job_name, &document)?;
    Ok(document.page_count())
}

/// Run synchronous rendering or dispatch work off the async runtime.
pub(crate) async fn run_blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, LabelError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, LabelError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| LabelError::Io(std::io::Error::other(format!("Task error: {}", e))))?
}

/// Generate success response JSON.
pub(crate) fn success_response(message: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message.into() })),
    )
        .into_response()
}

/// Generate error response JSON.
pub(crate) fn error_response(err: &LabelError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let mut body = json!({ "success": false, "error": err.to_string() });
    if let LabelError::Dispatch {
        artifact: Some(path), ..
    } = err
    {
        body["artifact"] = json!(path.display().to_string());
    }
    (status, Json(body)).into_response()
}
