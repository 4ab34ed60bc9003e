//! Server state.

use std::sync::Arc;

use crate::barcode::Code128Renderer;
use crate::config::Config;
use crate::dispatch::Spooler;
use crate::font::FontRegistry;
use crate::grocy::ProductAliases;
use crate::label::LabelSize;

/// Application state shared across handlers. Read-only after startup.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub fonts: FontRegistry,
    /// `None` when no printer is configured; print endpoints then fail
    pub spooler: Option<Spooler>,
    pub barcode: Code128Renderer,
    pub label_sizes: Vec<LabelSize>,
    /// Grocy alias lookups; `None` without a configured Grocy server
    pub aliases: Option<Arc<dyn ProductAliases>>,
}

impl AppState {
    pub fn new(config: Config, fonts: FontRegistry, spooler: Option<Spooler>) -> Self {
        let barcode = config.barcode.renderer();
        Self {
            config,
            fonts,
            spooler,
            barcode,
            label_sizes: LabelSize::built_in(),
            aliases: None,
        }
    }

    pub fn with_aliases(mut self, aliases: Arc<dyn ProductAliases>) -> Self {
        self.aliases = Some(aliases);
        self
    }
}
