//! Grocy label webhook.
//!
//! Grocy posts the product name, an optional due date and the product's
//! `grocycode`. The label shows the product with a date annotation on the
//! second line and the grocycode as a Code 128 barcode along the bottom.
//!
//! | Due date given | `print_due_date` | `print_today` | `print_date` | Annotation |
//! |----------------|------------------|---------------|--------------|------------|
//! | yes | 1 | - | - | `(due date)` |
//! | yes | 0 | 1 | - | `(today)` |
//! | yes | 0 | 0 | - | none |
//! | no | - | - | 1 | `(today)` |
//! | no | - | - | 0 | none |
//!
//! With `print_alias=1` (or `grocy.print_alias`) the product name is swapped
//! for the product's `alias_userfield` value from Grocy when that is
//! shorter. A failed lookup keeps the full name.

use axum::{
    extract::{Form, Query, State},
    response::Response,
};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::LabelError;
use crate::grocy::shorter_alias;

use super::super::state::AppState;
use super::{LabelParams, error_response, field, parse_flag, print_label, run_blocking, success_response};

/// Which dates end up on a Grocy label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFlags {
    pub print_due_date: bool,
    pub print_today: bool,
    pub print_date: bool,
}

/// The `(YYYY-MM-DD)` annotation for a label, if any.
pub fn date_annotation(due_date: Option<&str>, flags: DateFlags, today: NaiveDate) -> Option<String> {
    let today = || format!("({})", today.format("%Y-%m-%d"));
    match due_date {
        Some(due) if flags.print_due_date => Some(format!("({})", due)),
        Some(_) if flags.print_today => Some(today()),
        Some(_) => None,
        None if flags.print_date => Some(today()),
        None => None,
    }
}

/// Label text: the product, then the annotation on its own line.
pub fn label_text(product: &str, annotation: Option<&str>) -> String {
    match annotation {
        Some(a) => format!("{}\n{}", product, a),
        None => product.to_string(),
    }
}

/// The name to print: the product's alias when requested, available and
/// shorter, otherwise `product` itself.
fn product_name(state: &AppState, params: &LabelParams, product: &str) -> Result<String, LabelError> {
    let defaults = &state.config.grocy;
    if !parse_flag("print_alias", &params.print_alias, defaults.print_alias)? {
        return Ok(product.to_string());
    }
    let Some(grocycode) = field(&params.grocycode) else {
        return Ok(product.to_string());
    };
    let Some(aliases) = &state.aliases else {
        warn!("Alias requested but no Grocy server is configured");
        return Ok(product.to_string());
    };

    let userfield = field(&params.alias_userfield).unwrap_or(defaults.alias_userfield.as_str());
    match aliases.alias(grocycode, userfield) {
        Ok(alias) => Ok(shorter_alias(product, alias).unwrap_or_else(|| product.to_string())),
        Err(e) => {
            warn!(error = %e, grocycode, "Alias lookup failed, printing full name");
            Ok(product.to_string())
        }
    }
}

/// Handle GET /api/print/grocy.
pub async fn print_get(State(state): State<Arc<AppState>>, Query(params): Query<LabelParams>) -> Response {
    print(state, params).await
}

/// Handle POST /api/print/grocy.
pub async fn print_post(State(state): State<Arc<AppState>>, Form(params): Form<LabelParams>) -> Response {
    print(state, params).await
}

async fn print(state: Arc<AppState>, params: LabelParams) -> Response {
    let result = run_blocking(&state, move |state| {
        let product = field(&params.product)
            .ok_or_else(|| LabelError::invalid("Please provide the product for the label"))?;

        let defaults = &state.config.grocy;
        let flags = DateFlags {
            print_due_date: parse_flag("print_due_date", &params.print_due_date, defaults.print_due_date)?,
            print_today: parse_flag("print_today", &params.print_today, defaults.print_today)?,
            print_date: parse_flag("print_date", &params.print_date, defaults.print_date)?,
        };
        let annotation = date_annotation(field(&params.due_date), flags, Local::now().date_naive());
        let name = product_name(state, &params, product)?;
        let text = label_text(&name, annotation.as_deref());

        let grocycode = field(&params.grocycode);
        print_label(state, &params, &text, grocycode, grocycode.unwrap_or(product))
    })
    .await;

    match result {
        Ok(pages) => {
            info!(pages, "Grocy label printed");
            success_response(format!("Printed {} label(s)", pages))
        }
        Err(e) => {
            warn!(error = %e, "Grocy print failed");
            error_response(&e)
        }
    }
}
