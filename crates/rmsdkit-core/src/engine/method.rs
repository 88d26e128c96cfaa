//! Dispatch of a named [`Method`] to its alignment routine.
//!
//! Only [`Method::Default`] recovers from failure: whatever goes wrong, it retries
//! once with [`Method::Kabsch`] and records why in [`MethodOutcome::fallback`].
//! Every other method returns its error unchanged.

use super::config::{ComparisonConfig, Method};
use super::error::AlignError;
use super::external::ExternalAligner;
use super::kabsch::{Superposition, superpose};
use super::robust::robust_superpose;
use crate::core::io::traits::{Extraction, StructureSource};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodOutcome {
    pub method: Method,
    pub deviation: f64,
    pub point_count: Option<usize>,
    pub inlier_count: Option<usize>,
    pub cycles_used: Option<usize>,
    /// Error that caused the default method to fall back, if it did.
    pub fallback: Option<String>,
}

impl MethodOutcome {
    fn from_superposition(method: Method, s: &Superposition) -> Self {
        Self {
            method,
            deviation: s.deviation,
            point_count: Some(s.point_count),
            inlier_count: None,
            cycles_used: None,
            fallback: None,
        }
    }

    pub fn fallback_used(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Computes the deviation of `candidate` against `reference` with `config.method`.
///
/// `external` is consulted only by [`Method::External`].
pub fn run_method(
    reference: &dyn StructureSource,
    candidate: &dyn StructureSource,
    config: &ComparisonConfig,
    external: Option<&dyn ExternalAligner>,
) -> Result<MethodOutcome, AlignError> {
    match config.method {
        Method::Default => match run_default(reference, candidate) {
            Ok(outcome) => Ok(outcome),
            Err(primary) => {
                warn!(
                    candidate = candidate.name(),
                    error = %primary,
                    "Default method failed; falling back to Kabsch."
                );
                let mut outcome = run_kabsch(reference, candidate)?;
                outcome.fallback = Some(primary.to_string());
                Ok(outcome)
            }
        },
        Method::Kabsch => run_kabsch(reference, candidate),
        Method::Robust => run_robust(reference, candidate, config),
        Method::External => run_external(reference, candidate, external),
    }
}

fn run_default(
    reference: &dyn StructureSource,
    candidate: &dyn StructureSource,
) -> Result<MethodOutcome, AlignError> {
    let extraction = Extraction::structured(None);
    let ref_points = reference.extract(&extraction)?;
    let cand_points = candidate.extract(&extraction)?;
    let superposition = superpose(&ref_points, &cand_points)?;
    Ok(MethodOutcome::from_superposition(
        Method::Default,
        &superposition,
    ))
}

fn run_kabsch(
    reference: &dyn StructureSource,
    candidate: &dyn StructureSource,
) -> Result<MethodOutcome, AlignError> {
    let ref_points = reference.extract(&Extraction::Scanned)?;
    let cand_points = candidate.extract(&Extraction::Scanned)?;
    let superposition = superpose(&ref_points, &cand_points)?;
    if ref_points.len() != cand_points.len() {
        debug!(
            candidate = candidate.name(),
            reference_points = ref_points.len(),
            candidate_points = cand_points.len(),
            used = superposition.point_count,
            "Point sets differ in length; paired by index over the common prefix."
        );
    }
    Ok(MethodOutcome::from_superposition(
        Method::Kabsch,
        &superposition,
    ))
}

fn run_robust(
    reference: &dyn StructureSource,
    candidate: &dyn StructureSource,
    config: &ComparisonConfig,
) -> Result<MethodOutcome, AlignError> {
    let ref_points =
        reference.extract(&Extraction::structured(config.chain_reference.as_deref()))?;
    let cand_points =
        candidate.extract(&Extraction::structured(config.chain_candidate.as_deref()))?;
    let result = robust_superpose(
        &ref_points,
        &cand_points,
        config.robust.cutoff,
        config.robust.max_cycles,
    )?;
    Ok(MethodOutcome {
        method: Method::Robust,
        deviation: result.deviation,
        point_count: Some(result.inliers.len()),
        inlier_count: Some(result.inlier_count),
        cycles_used: Some(result.cycles_used),
        fallback: None,
    })
}

fn run_external(
    reference: &dyn StructureSource,
    candidate: &dyn StructureSource,
    external: Option<&dyn ExternalAligner>,
) -> Result<MethodOutcome, AlignError> {
    let aligner = external.ok_or_else(|| {
        AlignError::ExternalMethodUnavailable("no external aligner was provided".to_string())
    })?;
    let ref_path = require_location(reference)?;
    let cand_path = require_location(candidate)?;

    let deviation = aligner.align(ref_path, cand_path)?;
    if !(deviation.is_finite() && deviation >= 0.0) {
        return Err(AlignError::ExternalFailure(format!(
            "{} reported an invalid deviation: {deviation}",
            aligner.name()
        )));
    }

    Ok(MethodOutcome {
        method: Method::External,
        deviation,
        point_count: None,
        inlier_count: None,
        cycles_used: None,
        fallback: None,
    })
}

fn require_location(source: &dyn StructureSource) -> Result<&Path, AlignError> {
    source.location().ok_or_else(|| {
        AlignError::ExternalMethodUnavailable(format!(
            "structure '{}' has no on-disk location",
            source.name()
        ))
    })
}
