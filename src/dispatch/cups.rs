//! CUPS backend.
//!
//! Submits the spooled PDF with `lp`. Copies are already pages of the
//! document, so `lp` always prints one copy of it.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, instrument};

use super::{PrintBackend, PrintJob};
use crate::error::LabelError;

#[derive(Debug, Clone)]
pub struct CupsBackend {
    queue: String,
    program: PathBuf,
}

impl CupsBackend {
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into().trim_end_matches('/').to_string(),
            program: PathBuf::from("lp"),
        }
    }

    /// Use a different `lp`-compatible program.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    fn command(&self, document: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-d", self.queue.as_str(), "-n", "1", "-o", "fit-to-page"]).arg(document);
        cmd
    }

    fn failed(&self, message: String) -> LabelError {
        LabelError::Dispatch {
            backend: "cups",
            message,
            artifact: None,
        }
    }
}

impl PrintBackend for CupsBackend {
    fn name(&self) -> &'static str {
        "cups"
    }

    #[instrument(skip(self, job), fields(queue = %self.queue, path = %job.path.display(), pages = job.pages))]
    fn dispatch(&self, job: &PrintJob<'_>) -> Result<(), LabelError> {
        let output = self
            .command(job.path)
            .output()
            .map_err(|e| self.failed(format!("cannot run {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failed(format!("{} exited with {}: {}", self.program.display(), output.status, stderr.trim())));
        }

        info!(response = %String::from_utf8_lossy(&output.stdout).trim(), "Job queued");
        Ok(())
    }
}
