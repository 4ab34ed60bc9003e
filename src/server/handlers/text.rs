//! Text label handlers.

use axum::{
    extract::{Form, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{compose, error::LabelError, package};

use super::super::state::AppState;
use super::{LabelParams, error_response, field, print_label, run_blocking, success_response};

/// Query-string options honoured for POST previews too.
#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    pub return_format: Option<String>,
}

/// Handle GET /api/preview/text - render a PNG preview.
pub async fn preview_get(State(state): State<Arc<AppState>>, Query(params): Query<LabelParams>) -> Response {
    preview(state, params).await
}

/// Handle POST /api/preview/text - render a PNG preview.
pub async fn preview_post(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
    Form(mut params): Form<LabelParams>,
) -> Response {
    if params.return_format.is_none() {
        params.return_format = query.return_format;
    }
    preview(state, params).await
}

async fn preview(state: Arc<AppState>, params: LabelParams) -> Response {
    let base64 = params.wants_base64();
    let result = run_blocking(&state, move |state| {
        let text = required_text(&params)?;
        let spec = super::build_spec(state, &params)?;
        let canvas = compose::render(&spec, &text, None, &state.barcode)?;
        package::preview_png(&canvas)
    })
    .await;

    match result {
        Ok(png) if base64 => ([(header::CONTENT_TYPE, "text/plain")], STANDARD.encode(png)).into_response(),
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => {
            warn!(error = %e, "Preview failed");
            error_response(&e)
        }
    }
}

/// Handle GET /api/print/text - print a text label.
pub async fn print_get(State(state): State<Arc<AppState>>, Query(params): Query<LabelParams>) -> Response {
    print(state, params).await
}

/// Handle POST /api/print/text - print a text label.
pub async fn print_post(State(state): State<Arc<AppState>>, Form(params): Form<LabelParams>) -> Response {
    print(state, params).await
}

async fn print(state: Arc<AppState>, params: LabelParams) -> Response {
    let result = run_blocking(&state, move |state| {
        let text = required_text(&params)?;
        let job_name = text.lines().next().unwrap_or("label").to_string();
        print_label(state, &params, &text, None, &job_name)
    })
    .await;

    match result {
        Ok(pages) => {
            info!(pages, "Text label printed");
            success_response(format!("Printed {} label(s)", pages))
        }
        Err(e) => {
            warn!(error = %e, "Print failed");
            error_response(&e)
        }
    }
}

fn required_text(params: &LabelParams) -> Result<String, LabelError> {
    field(&params.text)
        .map(|_| params.text.clone().unwrap_or_default())
        .ok_or_else(|| LabelError::invalid("Please provide the text for the label"))
}
