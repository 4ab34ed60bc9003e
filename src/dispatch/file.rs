//! File and device backend.
//!
//! Writes the whole document to a path in one go. Works for character
//! devices such as `/dev/usb/lp0` as well as plain files.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use super::{PrintBackend, PrintJob};
use crate::error::LabelError;

#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn failed(&self, action: &str, e: std::io::Error) -> LabelError {
        LabelError::Dispatch {
            backend: "file",
            message: format!("{} {}: {}", action, self.path.display(), e),
            artifact: None,
        }
    }
}

impl PrintBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    #[instrument(skip(self, job), fields(path = %self.path.display(), data_len = job.bytes.len()))]
    fn dispatch(&self, job: &PrintJob<'_>) -> Result<(), LabelError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| self.failed("Failed to open", e))?;

        file.write_all(job.bytes).map_err(|e| self.failed("Write failed on", e))?;
        file.flush().map_err(|e| self.failed("Flush failed on", e))?;

        info!("Document written");
        Ok(())
    }
}
