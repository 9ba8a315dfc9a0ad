//! Error taxonomy and the user-visible banners errors turn into.
//!
//! Nothing here aborts the application: every failure is caught where it
//! happens and converted into a [`Banner`] shown next to the affected section.

use std::path::PathBuf;

use thiserror::Error;

/// The four failure kinds the dashboard distinguishes.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A dataset or structure file is absent.
    #[error("`{}` not found", path.display())]
    MissingFile { path: PathBuf },

    /// A tabular or structure file is malformed.
    #[error("failed to parse `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The column heuristics found no matching column.
    #[error("{role} column not detected automatically")]
    ColumnNotDetected { role: &'static str },

    /// Every renderer in the chain failed.
    #[error("structure rendering failed: {message}")]
    Render { message: String },
}

impl DashboardError {
    /// Severity the error is shown with.
    pub fn level(&self) -> BannerLevel {
        match self {
            DashboardError::MissingFile { .. } | DashboardError::ColumnNotDetected { .. } => {
                BannerLevel::Warning
            }
            DashboardError::Parse { .. } | DashboardError::Render { .. } => BannerLevel::Error,
        }
    }
}

// ---------------------------------------------------------------------------
// Banners
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// An inline message shown in the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub level: BannerLevel,
    pub text: String,
}

impl Banner {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Error,
            text: text.into(),
        }
    }
}

impl From<&DashboardError> for Banner {
    fn from(err: &DashboardError) -> Self {
        Banner {
            level: err.level(),
            text: err.to_string(),
        }
    }
}
