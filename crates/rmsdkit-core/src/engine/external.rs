use super::error::AlignError;
use std::path::Path;

/// An opaque alternative aligner that works directly on structure files.
///
/// Implementations may wrap an external program. The caller constructs the
/// aligner, owns whatever process or session state it keeps, and lends it to the
/// engine by reference; the engine never starts or stops it.
pub trait ExternalAligner: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Returns the deviation between `reference` and `candidate` after the tool's
    /// own superposition.
    ///
    /// # Errors
    ///
    /// [`AlignError::ExternalMethodUnavailable`] when the tool cannot run at all,
    /// [`AlignError::ExternalFailure`] when it runs but yields no usable result.
    fn align(&self, reference: &Path, candidate: &Path) -> Result<f64, AlignError>;
}
