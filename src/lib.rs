//! # Etikett - Label Rendering Library
//!
//! Etikett renders adhesive labels (text plus an optional Code 128 barcode)
//! as pixel-accurate rasters sized to a printer's resolution and the label
//! stock, and packages them as print-ready PDF pages. It provides:
//!
//! - **Text layout**: word and character wrapping that keeps `(...)` groups whole
//! - **Compositing**: margin, alignment, orientation and barcode placement
//! - **Packaging**: multi-copy PDF documents that share one encoded image
//! - **Dispatch**: file, raw TCP and CUPS print backends behind a spooler
//!
//! ## Quick Start
//!
//! ```no_run
//! use etikett::{
//!     barcode::Code128Renderer,
//!     compose,
//!     font::FontRegistry,
//!     label::{LabelSize, LabelSpec},
//!     package,
//! };
//!
//! let fonts = FontRegistry::scan(&["/usr/share/fonts"]);
//! let font = fonts.resolve("DejaVu Sans", "Book")?;
//! let size: LabelSize = "57x32".parse()?;
//! let spec = LabelSpec::builder(font).label_size(&size).build()?;
//!
//! let canvas = compose::render(&spec, "Ofengemüse (29.12.2024)", Some("grcy:p:42"), &Code128Renderer::default())?;
//! let document = package::package(&canvas, 2)?;
//! document.write_to("label.pdf".as_ref())?;
//!
//! # Ok::<(), etikett::LabelError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`label`] | Label spec, stock presets, alignment |
//! | [`font`] | Typeface capability and font registry |
//! | [`layout`] | Line breaking |
//! | [`barcode`] | Code 128 rendering |
//! | [`compose`] | Canvas compositing |
//! | [`package`] | PDF pages and PNG previews |
//! | [`dispatch`] | Spooler and print backends |
//! | [`config`] | TOML configuration |
//! | [`grocy`] | Grocy product alias lookups |
//! | [`server`] | HTTP service |
//! | [`error`] | Error types |

pub mod barcode;
pub mod compose;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod font;
pub mod grocy;
pub mod label;
pub mod layout;
pub mod package;
pub mod server;

// Re-exports for convenience
pub use compose::{Canvas, render};
pub use config::Config;
pub use error::{LabelError, LabelResult};
pub use label::{LabelSize, LabelSpec};
pub use package::{PrintDocument, package};
