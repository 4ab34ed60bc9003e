//! Label designer page and listing endpoints.

use axum::{
    Json,
    extract::State,
    response::{Html, IntoResponse, Redirect},
};
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::font::FontSelector;

use super::super::state::AppState;

/// Handle GET / - send browsers to the designer.
pub async fn index() -> Redirect {
    Redirect::to("/labeldesigner")
}

#[derive(Debug, Serialize)]
struct FontFamily<'a> {
    family: &'a str,
    styles: Vec<&'a str>,
}

/// Handle GET /api/fonts - installed families and styles.
pub async fn fonts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let families: Vec<FontFamily<'_>> = state
        .fonts
        .families()
        .map(|(family, styles)| FontFamily { family, styles })
        .collect();
    let default = state.fonts.default_font().map(FontSelector::to_string);
    Json(json!({ "fonts": families, "default": default }))
}

/// Handle GET /api/label-sizes - known label stock.
pub async fn label_sizes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "label_sizes": state.label_sizes,
        "default": state.config.label.default_size,
    }))
}

/// Handle GET /labeldesigner - a plain HTML form for the text endpoints.
pub async fn page(State(state): State<Arc<AppState>>) -> Html<String> {
    let label = &state.config.label;
    let default_font = state.fonts.default_font().map(FontSelector::to_string);

    let mut fonts = String::new();
    for (family, styles) in state.fonts.families() {
        for style in styles {
            let selector = FontSelector::new(family, style).to_string();
            let selected = if Some(&selector) == default_font.as_ref() { " selected" } else { "" };
            let _ = writeln!(
                fonts,
                r#"<option value="{0}"{1}>{0}</option>"#,
                escape_html(&selector),
                selected
            );
        }
    }

    let mut sizes = String::new();
    for size in &state.label_sizes {
        let selected = if size.id == label.default_size { " selected" } else { "" };
        let _ = writeln!(
            sizes,
            r#"<option value="{}"{}>{}</option>"#,
            escape_html(&size.id),
            selected,
            escape_html(&size.name)
        );
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Label Designer</title></head>
<body>
<h1>Label Designer</h1>
<form method="post" action="/api/print/text">
<p><textarea name="text" rows="4" cols="40"></textarea></p>
<p>Font <select name="font_family">
{fonts}</select> size <input name="font_size" value="{font_size}" size="4"> pt
or <input name="font_size_px" size="4"> px (overrides pt)</p>
<p>Label <select name="label_size">
{sizes}</select>
<select name="orientation"><option value="standard">standard</option><option value="rotated">rotated</option></select>
<select name="align"><option value="left">left</option><option value="center" selected>center</option><option value="right">right</option></select></p>
<p>Margins (mm) top <input name="margin_top" size="3"> bottom <input name="margin_bottom" size="3">
left <input name="margin_left" size="3"> right <input name="margin_right" size="3"></p>
<p>Line spacing <input name="line_spacing" value="{line_spacing}" size="3"> px,
copies <input name="copies" value="1" size="3"></p>
<p><button formaction="/api/preview/text">Preview</button> <button>Print</button></p>
</form>
</body>
</html>
"#,
        font_size = label.font_size_pt,
        line_spacing = label.line_spacing,
    ))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
