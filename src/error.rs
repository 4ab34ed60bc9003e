//! # Error Types
//!
//! This module defines error types used throughout the etikett library.
//!
//! The rendering engine never logs and continues: every failure comes back
//! to the caller as a [`LabelError`], and the HTTP layer turns it into a
//! structured `{"success": false, ...}` response.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for etikett operations
#[derive(Debug, Error)]
pub enum LabelError {
    /// No installed font matches the requested family and style
    #[error("Font not found: {family} ({style})")]
    NotFound { family: String, style: String },

    /// Malformed request parameter, rejected before any rendering work
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Laid-out text does not fit the label at the requested size and margins
    #[error("Text does not fit: needs {required}px but only {available}px are available")]
    Overflow { required: u32, available: u32 },

    /// The print backend rejected or failed the job
    #[error("Dispatch via {backend} failed: {message}")]
    Dispatch {
        backend: &'static str,
        message: String,
        /// Spooled document left on disk for retry or inspection
        artifact: Option<PathBuf>,
    },

    /// Barcode encoding error
    #[error("Barcode error: {0}")]
    Barcode(String),

    /// Configuration file or startup validation error
    #[error("Config error: {0}")]
    Config(String),

    /// Grocy server unreachable or answered with an error
    #[error("Grocy request failed: {0}")]
    Grocy(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabelError {
    /// Shorthand for [`LabelError::InvalidArgument`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Whether the error was caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::InvalidArgument(_) | Self::Overflow { .. } | Self::Barcode(_)
        )
    }
}

/// Result alias used across the crate.
pub type LabelResult<T> = Result<T, LabelError>;
