use crate::core::models::point_set::PointSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How a [`StructureSource`] should produce its points.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Extraction {
    /// The structured reader: first model only, one CA per residue, optionally
    /// restricted to a single chain.
    Structured { chain: Option<String> },
    /// The built-in line scanner: every CA record in the file, across all models.
    #[default]
    Scanned,
}

impl Extraction {
    pub fn structured(chain: Option<&str>) -> Self {
        Self::Structured {
            chain: chain.map(str::to_string),
        }
    }

    pub fn chain(&self) -> Option<&str> {
        match self {
            Self::Structured { chain } => chain.as_deref(),
            Self::Scanned => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("No CA atoms found in structure '{source_name}' (chain={chain})", chain = .chain.as_deref().unwrap_or("any"))]
    NoPointsFound {
        source_name: String,
        chain: Option<String>,
    },

    #[error("I/O error reading '{source_name}': {message}")]
    Io {
        source_name: String,
        message: String,
    },

    #[error("Failed to parse '{source_name}': {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("Unsupported structure format: {path}", path = .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Structured reader unavailable: {0}")]
    ReaderUnavailable(String),
}

/// A structure that can yield an ordered [`PointSet`].
///
/// This is the only way the alignment engine sees structures; file formats stay
/// behind implementations of this trait.
pub trait StructureSource: Send + Sync {
    /// Identifier used in reports and log messages.
    fn name(&self) -> &str;

    /// Produces the points selected by `extraction`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::NoPointsFound`] when the selection is empty, or
    /// another variant when the underlying data cannot be read.
    fn extract(&self, extraction: &Extraction) -> Result<PointSet, ExtractionError>;

    /// On-disk location, if any. Required by external aligners that work on files.
    fn location(&self) -> Option<&Path> {
        None
    }
}
