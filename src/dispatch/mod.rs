//! # Print Dispatch
//!
//! Hands packaged documents to a printer. The backend is chosen from a
//! printer descriptor:
//!
//! | Descriptor | Backend | Delivery |
//! |------------|---------|----------|
//! | `file:///dev/usb/lp0` | [`FileBackend`] | write the bytes to a device or file |
//! | `tcp://192.168.1.20:9100` | [`TcpBackend`] | raw socket, port 9100 by default |
//! | `cups://Brother_QL` | [`CupsBackend`] | `lp -d <queue> -n 1 -o fit-to-page` |
//!
//! ## Spooling
//!
//! The [`Spooler`] writes every document to `spool_dir` before dispatch.
//! The spooled file is removed once the backend accepts the job and kept
//! when it fails, so the caller can retry or inspect it; its path comes
//! back in [`LabelError::Dispatch`].
//!
//! Backends never retry. All calls block; async callers run them on
//! `spawn_blocking`.

pub mod cups;
pub mod file;
pub mod tcp;

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};
use uuid::Uuid;

pub use cups::CupsBackend;
pub use file::FileBackend;
pub use tcp::TcpBackend;

use crate::error::LabelError;
use crate::package::PrintDocument;

/// A spooled document ready for a backend.
#[derive(Debug, Clone, Copy)]
pub struct PrintJob<'a> {
    /// Spooled PDF on disk
    pub path: &'a Path,
    /// The same PDF in memory
    pub bytes: &'a [u8],
    /// Pages in the document (one per copy)
    pub pages: usize,
}

/// A way of getting a job to a printer.
pub trait PrintBackend: Send + Sync + fmt::Debug {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    fn dispatch(&self, job: &PrintJob<'_>) -> Result<(), LabelError>;
}

/// Build a backend from a printer descriptor.
pub fn backend_from_descriptor(descriptor: &str) -> Result<Box<dyn PrintBackend>, LabelError> {
    let descriptor = descriptor.trim();
    let (scheme, target) = descriptor.split_once("://").ok_or_else(|| {
        LabelError::Config(format!(
            "Invalid printer '{}'. Use file://PATH, tcp://HOST[:PORT] or cups://QUEUE",
            descriptor
        ))
    })?;
    if target.is_empty() {
        return Err(LabelError::Config(format!("Printer '{}' has no target", descriptor)));
    }

    match scheme.to_lowercase().as_str() {
        "file" => Ok(Box::new(FileBackend::new(target))),
        "tcp" => Ok(Box::new(TcpBackend::new(target)?)),
        "cups" => Ok(Box::new(CupsBackend::new(target))),
        other => Err(LabelError::Config(format!(
            "Unsupported printer scheme '{}'. Choose from 'file', 'tcp', or 'cups'",
            other
        ))),
    }
}

/// Spools documents to disk and dispatches them through one backend.
#[derive(Debug)]
pub struct Spooler {
    dir: PathBuf,
    backend: Box<dyn PrintBackend>,
}

impl Spooler {
    pub fn new(dir: impl Into<PathBuf>, backend: Box<dyn PrintBackend>) -> Self {
        Self {
            dir: dir.into(),
            backend,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backend(&self) -> &dyn PrintBackend {
        self.backend.as_ref()
    }

    /// Spool `document` as `<name>-<uuid>.pdf` and dispatch it.
    #[instrument(skip(self, document), fields(backend = self.backend.name(), pages = document.page_count()))]
    pub fn submit(&self, name: &str, document: &PrintDocument) -> Result<(), LabelError> {
        let path = self.dir.join(format!("{}-{}.pdf", spool_stem(name), Uuid::new_v4()));

        document.write_to(&path).map_err(|e| LabelError::Dispatch {
            backend: "spool",
            message: format!("cannot write {}: {}", path.display(), e),
            artifact: None,
        })?;

        let job = PrintJob {
            path: &path,
            bytes: document.as_bytes(),
            pages: document.page_count(),
        };

        match self.backend.dispatch(&job) {
            Ok(()) => {
                info!(path = %path.display(), "Print job dispatched");
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!(error = %e, path = %path.display(), "Could not remove spooled document");
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Dispatch failed, keeping spooled document");
                let message = match e {
                    LabelError::Dispatch { message, .. } => message,
                    other => other.to_string(),
                };
                Err(LabelError::Dispatch {
                    backend: self.backend.name(),
                    message,
                    artifact: Some(path),
                })
            }
        }
    }
}

/// File-name-safe stem for a spooled document.
fn spool_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(40)
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() { "label".to_string() } else { stem.to_string() }
}

// ============================================================================
// TESTS
// ============================================================================
