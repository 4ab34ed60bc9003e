//! # Font Registry
//!
//! A read-only index of installed fonts, built once at startup and shared
//! by every request.
//!
//! ## Naming
//!
//! Family and style come from the font's `name` table (IDs 1 and 2). Fonts
//! whose names cannot be read fall back to the file stem, split on the last
//! dash:
//!
//! ```text
//! DejaVuSans-Bold.ttf  → DejaVuSans (Bold)
//! Inconsolata.otf      → Inconsolata (Regular)
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use owned_ttf_parser::{Face, name_id};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{FontHandle, TtfTypeface, Typeface};
use crate::error::LabelError;

/// Directories searched when no explicit font folder is given.
pub const SYSTEM_FONT_DIRS: &[&str] = &["/usr/share/fonts", "/usr/local/share/fonts"];

/// A family/style pair as used in requests and configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSelector {
    pub family: String,
    pub style: String,
}

impl FontSelector {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }

    /// Parse the `"Family (Style)"` form used by the label designer.
    ///
    /// A selector without parentheses names the `Regular` style.
    pub fn parse(s: &str) -> Result<Self, LabelError> {
        let s = s.trim();
        let (family, style) = match s.rsplit_once('(') {
            Some((family, style)) => (family.trim(), style.trim_end_matches(')').trim()),
            None => (s, "Regular"),
        };
        if family.is_empty() || style.is_empty() {
            return Err(LabelError::invalid(format!("Malformed font selector '{}'", s)));
        }
        Ok(Self::new(family, style))
    }
}

impl std::fmt::Display for FontSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.family, self.style)
    }
}

/// Where a registered font comes from.
#[derive(Clone)]
enum FontSource {
    /// Loaded from disk on every resolve
    File(PathBuf),
    /// Already in memory
    Loaded(Arc<dyn Typeface>),
}

impl std::fmt::Debug for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Loaded(_) => f.write_str("Loaded"),
        }
    }
}

/// Installed fonts by family, then style.
#[derive(Debug, Default, Clone)]
pub struct FontRegistry {
    families: BTreeMap<String, BTreeMap<String, FontSource>>,
    default: Option<FontSelector>,
}

impl FontRegistry {
    /// Scan `dirs` recursively for `.ttf` and `.otf` files.
    ///
    /// Missing directories are skipped. The first file seen for a
    /// family/style wins.
    pub fn scan<P: AsRef<Path>>(dirs: &[P]) -> Self {
        let mut registry = Self::default();
        for dir in dirs {
            registry.scan_dir(dir.as_ref());
        }
        debug!(families = registry.families.len(), "font scan complete");
        registry
    }

    fn scan_dir(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping font directory");
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                self.scan_dir(&path);
            } else if is_font_file(&path) {
                let (family, style) = font_names(&path);
                self.insert(family, style, path);
            }
        }
    }

    /// Register a font file under an explicit family/style.
    pub fn insert(&mut self, family: String, style: String, path: PathBuf) {
        self.add(family, style, FontSource::File(path));
    }

    /// Register an in-memory typeface.
    pub fn insert_face(&mut self, family: impl Into<String>, style: impl Into<String>, face: Arc<dyn Typeface>) {
        self.add(family.into(), style.into(), FontSource::Loaded(face));
    }

    fn add(&mut self, family: String, style: String, source: FontSource) {
        self.families
            .entry(family)
            .or_default()
            .entry(style)
            .or_insert(source);
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Family names with their styles, sorted.
    pub fn families(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.families
            .iter()
            .map(|(family, styles)| (family.as_str(), styles.keys().map(String::as_str).collect()))
    }

    pub fn contains(&self, selector: &FontSelector) -> bool {
        self.source_of(selector).is_some()
    }

    fn source_of(&self, selector: &FontSelector) -> Option<&FontSource> {
        self.families.get(&selector.family)?.get(&selector.style)
    }

    /// Pick the default font: the first candidate that is installed, or the
    /// alphabetically first family/style when none are.
    pub fn choose_default(&mut self, candidates: &[FontSelector]) -> Option<&FontSelector> {
        let chosen = candidates.iter().find(|c| self.contains(c)).cloned().or_else(|| {
            let (family, styles) = self.families.iter().next()?;
            let style = styles.keys().next()?;
            let fallback = FontSelector::new(family.clone(), style.clone());
            warn!(font = %fallback, "none of the default fonts are installed, falling back");
            Some(fallback)
        });
        self.default = chosen;
        self.default.as_ref()
    }

    pub fn default_font(&self) -> Option<&FontSelector> {
        self.default.as_ref()
    }

    /// Resolve a family/style to a loaded font.
    pub fn resolve(&self, family: &str, style: &str) -> Result<FontHandle, LabelError> {
        let selector = FontSelector::new(family, style);
        let source = self.source_of(&selector).ok_or_else(|| LabelError::NotFound {
            family: family.to_string(),
            style: style.to_string(),
        })?;
        let face: Arc<dyn Typeface> = match source {
            FontSource::File(path) => Arc::new(TtfTypeface::from_path(path)?),
            FontSource::Loaded(face) => Arc::clone(face),
        };
        Ok(FontHandle::new(family, style, face))
    }

    /// Resolve a selector, or the default font when `None`.
    pub fn resolve_or_default(&self, selector: Option<&FontSelector>) -> Result<FontHandle, LabelError> {
        match selector.or(self.default.as_ref()) {
            Some(s) => self.resolve(&s.family, &s.style),
            None => Err(LabelError::NotFound {
                family: "(default)".to_string(),
                style: "(default)".to_string(),
            }),
        }
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
        .unwrap_or(false)
}

/// Family and style for a font file.
fn font_names(path: &Path) -> (String, String) {
    std::fs::read(path)
        .ok()
        .and_then(|data| names_from_table(&data))
        .unwrap_or_else(|| names_from_stem(path))
}

fn names_from_table(data: &[u8]) -> Option<(String, String)> {
    let face = Face::parse(data, 0).ok()?;
    let mut family = None;
    let mut style = None;

    for name in face.names() {
        if !name.is_unicode() {
            continue;
        }
        match name.name_id {
            name_id::FAMILY if family.is_none() => family = name.to_string(),
            name_id::SUBFAMILY if style.is_none() => style = name.to_string(),
            _ => {}
        }
    }

    Some((family?, style.unwrap_or_else(|| "Regular".to_string())))
}

fn names_from_stem(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown");
    match stem.rsplit_once('-') {
        Some((family, style)) if !family.is_empty() && !style.is_empty() => {
            (family.to_string(), style.to_string())
        }
        _ => (stem.to_string(), "Regular".to_string()),
    }
}
