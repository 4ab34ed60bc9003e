//! # Grocy Product Aliases
//!
//! Grocy products can carry a short alias in a userfield (`kurzname` by
//! default). When the webhook asks for it, the label prints the alias
//! instead of the full product name.
//!
//! ```text
//! grocycode ──▶ GET /api/stock/products/by-barcode/{code} ──▶ product id
//!           ──▶ GET /api/userfields/products/{id}         ──▶ { "kurzname": "Milch" }
//! ```
//!
//! The alias only replaces the name when it is non-empty and shorter.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::LabelError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Looks up a product's alias userfield.
pub trait ProductAliases: Send + Sync + fmt::Debug {
    /// The value of `userfield` for the product identified by `barcode`,
    /// or `None` when the field is unset.
    fn alias(&self, barcode: &str, userfield: &str) -> Result<Option<String>, LabelError>;
}

/// The alias if it should replace `product`: non-empty and shorter.
pub fn shorter_alias(product: &str, alias: Option<String>) -> Option<String> {
    alias.filter(|a| {
        let len = a.chars().count();
        len > 0 && len < product.chars().count()
    })
}

#[derive(Debug, Deserialize)]
struct ProductDetails {
    product: Product,
}

#[derive(Debug, Deserialize)]
struct Product {
    id: i64,
}

/// Blocking client for the Grocy REST API.
pub struct GrocyClient {
    base_url: Url,
    api_key: String,
    http: reqwest::blocking::Client,
}

impl GrocyClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, LabelError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LabelError::Config(format!("grocy.base_url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(LabelError::Config(format!("grocy.base_url '{}' is not a base URL", base_url)));
        }
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("etikett/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LabelError::Grocy(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            http,
        })
    }

    /// `{base}/api/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, LabelError> {
        self.http
            .get(url.clone())
            .header("GROCY-API-KEY", &self.api_key)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<T>())
            .map_err(|e| LabelError::Grocy(format!("{}: {}", url.path(), e)))
    }
}

impl fmt::Debug for GrocyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrocyClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ProductAliases for GrocyClient {
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    fn alias(&self, barcode: &str, userfield: &str) -> Result<Option<String>, LabelError> {
        let details: ProductDetails =
            self.get_json(self.endpoint(&["stock", "products", "by-barcode", barcode]))?;

        let id = details.product.id.to_string();
        let fields: HashMap<String, serde_json::Value> =
            self.get_json(self.endpoint(&["userfields", "products", &id]))?;

        Ok(fields.get(userfield).and_then(|v| v.as_str()).map(str::to_string))
    }
}
