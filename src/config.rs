//! # Configuration
//!
//! Service settings, loaded once at startup from a TOML file and shared
//! read-only afterwards. Every key is optional; missing keys take the
//! defaults below.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8013
//! log_level = "info"
//! font_folder = "/srv/fonts"
//!
//! [label]
//! default_size = "57x32"
//! default_orientation = "standard"
//! dpi = 300
//! font_size_pt = 17.0
//! line_spacing = 8
//! align = "center"
//! margins = { top = 0.0, bottom = 0.0, left = 0.0, right = 0.0 }
//! default_fonts = [
//!     { family = "DejaVu Sans", style = "Book" },
//!     { family = "Liberation Sans", style = "Regular" },
//! ]
//!
//! [barcode]
//! height_ratio = 0.5
//! crop_px = 15
//! module_width_px = 4
//! bar_height_px = 120
//!
//! [grocy]
//! print_due_date = true
//! print_today = false
//! print_date = false
//! # Product aliases, looked up by grocycode
//! base_url = "https://grocy.example.org"
//! api_key = "..."
//! print_alias = false
//! alias_userfield = "kurzname"
//!
//! [printer]
//! printer = "cups://Brother_QL-700"
//! spool_dir = "/var/spool/etikett"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::barcode::Code128Renderer;
use crate::error::LabelError;
use crate::font::FontSelector;
use crate::label::{Alignment, BarcodeGeometry, LabelSize, MAX_DPI, Margins, Orientation};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub label: LabelConfig,
    pub barcode: BarcodeConfig,
    pub grocy: GrocyConfig,
    pub printer: PrinterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `tracing` filter directive, e.g. `"info"` or `"etikett=debug"`
    pub log_level: String,
    /// Extra font directory scanned before the system ones
    pub font_folder: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8013,
            log_level: "info".to_string(),
            font_folder: None,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub default_size: String,
    pub default_orientation: Orientation,
    pub dpi: u32,
    pub font_size_pt: f32,
    pub line_spacing: u32,
    pub align: Alignment,
    pub margins: Margins,
    /// Candidates for the default font, in order of preference
    pub default_fonts: Vec<FontSelector>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            default_size: "57x32".to_string(),
            default_orientation: Orientation::Standard,
            dpi: 300,
            font_size_pt: 17.0,
            line_spacing: 8,
            align: Alignment::Center,
            margins: Margins::default(),
            default_fonts: vec![
                FontSelector::new("DejaVu Sans", "Book"),
                FontSelector::new("DejaVu Sans", "Regular"),
                FontSelector::new("Liberation Sans", "Regular"),
                FontSelector::new("Noto Sans", "Regular"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeConfig {
    /// Strip height as a fraction of the label height
    pub height_ratio: f32,
    /// Padding rows rendered above and below the bars, cropped before placement
    pub crop_px: u32,
    pub module_width_px: u32,
    pub bar_height_px: u32,
}

impl Default for BarcodeConfig {
    fn default() -> Self {
        Self {
            height_ratio: 0.5,
            crop_px: 15,
            module_width_px: 4,
            bar_height_px: 120,
        }
    }
}

impl BarcodeConfig {
    pub fn renderer(&self) -> Code128Renderer {
        Code128Renderer {
            module_width_px: self.module_width_px,
            bar_height_px: self.bar_height_px,
            padding_px: self.crop_px,
        }
    }

    /// Placement geometry for a given stock's bottom offset.
    pub fn geometry(&self, bottom_offset_px: u32) -> BarcodeGeometry {
        BarcodeGeometry {
            height_ratio: self.height_ratio,
            crop_px: self.crop_px,
            bottom_offset_px,
        }
    }
}

/// Grocy webhook defaults and the Grocy server used for alias lookups.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrocyConfig {
    /// Append the supplied due date
    pub print_due_date: bool,
    /// Append today's date when a due date is supplied but not printed
    pub print_today: bool,
    /// Append today's date when no due date is supplied
    pub print_date: bool,
    /// Grocy instance, e.g. `https://grocy.example.org`
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Replace the product name with its alias userfield when shorter
    pub print_alias: bool,
    /// Product userfield holding the alias
    pub alias_userfield: String,
}

impl Default for GrocyConfig {
    fn default() -> Self {
        Self {
            print_due_date: true,
            print_today: false,
            print_date: false,
            base_url: None,
            api_key: None,
            print_alias: false,
            alias_userfield: "kurzname".to_string(),
        }
    }
}

impl std::fmt::Debug for GrocyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrocyConfig")
            .field("print_due_date", &self.print_due_date)
            .field("print_today", &self.print_today)
            .field("print_date", &self.print_date)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("print_alias", &self.print_alias)
            .field("alias_userfield", &self.alias_userfield)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// `file://PATH`, `tcp://HOST[:PORT]` or `cups://QUEUE`
    pub printer: Option<String>,
    /// Where documents are spooled before dispatch; system temp dir if unset
    pub spool_dir: Option<PathBuf>,
}

impl PrinterConfig {
    pub fn spool_dir(&self) -> PathBuf {
        self.spool_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Config {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, LabelError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| LabelError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&content).map_err(|e| match e {
            LabelError::Config(msg) => LabelError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, LabelError> {
        toml::from_str(content).map_err(|e| LabelError::Config(e.to_string()))
    }

    /// Check the settings that every request depends on.
    pub fn validate(&self) -> Result<(), LabelError> {
        self.default_label_size()?;
        if self.label.dpi == 0 || self.label.dpi > MAX_DPI {
            return Err(LabelError::Config(format!("label.dpi must be between 1 and {}", MAX_DPI)));
        }
        if !(self.label.font_size_pt > 0.0) {
            return Err(LabelError::Config("label.font_size_pt must be positive".to_string()));
        }
        if !(self.barcode.height_ratio > 0.0 && self.barcode.height_ratio <= 1.0) {
            return Err(LabelError::Config("barcode.height_ratio must be in (0, 1]".to_string()));
        }
        Ok(())
    }

    pub fn default_label_size(&self) -> Result<LabelSize, LabelError> {
        self.label
            .default_size
            .parse()
            .map_err(|e: LabelError| LabelError::Config(format!("label.default_size: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9000

            [label]
            default_size = "62"
            align = "left"
            default_fonts = [{ family = "Roboto", style = "Bold" }]
            margins = { left = 1.5 }

            [printer]
            printer = "tcp://10.0.0.5"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.label.align, Alignment::Left);
        assert_eq!(config.label.dpi, 300);
        assert_eq!(config.label.margins.left, 1.5);
        assert_eq!(config.label.margins.top, 0.0);
        assert_eq!(config.label.default_fonts, vec![FontSelector::new("Roboto", "Bold")]);
        assert_eq!(config.printer.printer.as_deref(), Some("tcp://10.0.0.5"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_toml("[label]\nalign = \"justify\"").is_err());
        assert!(Config::from_toml("[server]\nport = \"eighty\"").is_err());

        let config = Config::from_toml("[label]\ndefault_size = \"huge\"").unwrap();
        assert!(matches!(config.validate(), Err(LabelError::Config(_))));
    }

    #[test]
    fn test_dpi_limit() {
        let config = Config::from_toml("[label]\ndpi = 100000").unwrap();
        assert!(matches!(config.validate(), Err(LabelError::Config(_))));
    }

    #[test]
    fn test_grocy_section() {
        let config = Config::from_toml(
            r#"
            [grocy]
            base_url = "http://grocy.local"
            api_key = "secret"
            print_alias = true
            "#,
        )
        .unwrap();
        assert_eq!(config.grocy.base_url.as_deref(), Some("http://grocy.local"));
        assert!(config.grocy.print_alias);
        assert!(config.grocy.print_due_date);
        assert_eq!(config.grocy.alias_userfield, "kurzname");
        assert!(!format!("{:?}", config.grocy).contains("secret"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etikett.toml");
        std::fs::write(&path, "[label]\ndpi = 600\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.label.dpi, 600);

        let missing = Config::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(missing, Err(LabelError::Config(_))));
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn test_barcode_renderer_uses_crop_as_padding() {
        let barcode = BarcodeConfig::default();
        assert_eq!(barcode.renderer().padding_px, barcode.crop_px);
        assert_eq!(barcode.geometry(15).bottom_offset_px, 15);
    }
}
