//! # HTTP Label Service
//!
//! Renders and prints labels over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! etikett serve --port 8013 cups://Brother_QL-700
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Redirect to `/labeldesigner` |
//! | GET | `/labeldesigner` | HTML form |
//! | GET | `/api/fonts` | Installed fonts |
//! | GET | `/api/label-sizes` | Known label stock |
//! | GET, POST | `/api/preview/text` | PNG preview (`return_format=base64` for text) |
//! | GET, POST | `/api/print/text` | Print a text label |
//! | GET, POST | `/api/print/grocy` | Grocy webhook: product, due date, barcode |
//!
//! Rendering and dispatch block, so handlers run them on
//! `spawn_blocking`.

mod handlers;
mod state;

pub use handlers::{LabelParams, build_spec};
pub use state::AppState;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::LabelError;

/// Build the router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Designer
        .route("/", get(handlers::designer::index))
        .route("/labeldesigner", get(handlers::designer::page))
        // Listings
        .route("/api/fonts", get(handlers::designer::fonts))
        .route("/api/label-sizes", get(handlers::designer::label_sizes))
        // Text labels
        .route(
            "/api/preview/text",
            get(handlers::text::preview_get).post(handlers::text::preview_post),
        )
        .route(
            "/api/print/text",
            get(handlers::text::print_get).post(handlers::text::print_post),
        )
        // Grocy webhook
        .route(
            "/api/print/grocy",
            get(handlers::grocy::print_get).post(handlers::grocy::print_post),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(state: Arc<AppState>) -> Result<(), LabelError> {
    let listen_addr = state.config.server.listen_addr();
    let printer = state.spooler.as_ref().map(|s| s.backend().name()).unwrap_or("none");

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| LabelError::Config(format!("Failed to bind to {}: {}", listen_addr, e)))?;

    info!(addr = %listen_addr, printer, "Label service listening");

    axum::serve(listener, router(state))
        .await
        .map_err(LabelError::Io)?;

    Ok(())
}
