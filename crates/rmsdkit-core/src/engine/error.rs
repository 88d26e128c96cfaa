use crate::core::io::traits::ExtractionError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignError {
    #[error("No points found in structure '{source_name}' (chain={chain})", chain = .chain.as_deref().unwrap_or("any"))]
    NoPointsFound {
        source_name: String,
        chain: Option<String>,
    },

    #[error("Not enough points for superposition: need at least 3, got {found}")]
    InsufficientPoints { found: usize },

    #[error("Robust alignment diverged: no inliers remained after cycle {cycle}")]
    AlignmentDivergence { cycle: usize },

    #[error("External method unavailable: {0}")]
    ExternalMethodUnavailable(String),

    #[error("External method failed: {0}")]
    ExternalFailure(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Numerical failure: {0}")]
    Numerical(String),

    #[error("Failed to extract points from '{source_name}': {message}")]
    Extraction {
        source_name: String,
        message: String,
    },

    #[error("Unsupported structure format: {path}", path = .path.display())]
    UnsupportedFormat { path: PathBuf },
}

impl From<ExtractionError> for AlignError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::NoPointsFound { source_name, chain } => {
                Self::NoPointsFound { source_name, chain }
            }
            ExtractionError::ReaderUnavailable(reason) => Self::ExternalMethodUnavailable(reason),
            ExtractionError::UnsupportedFormat { path } => Self::UnsupportedFormat { path },
            ExtractionError::Io {
                source_name,
                message,
            }
            | ExtractionError::Parse {
                source_name,
                message,
            } => Self::Extraction {
                source_name,
                message,
            },
        }
    }
}
