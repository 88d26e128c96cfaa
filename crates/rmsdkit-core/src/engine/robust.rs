//! Outlier-pruning refinement on top of the Kabsch superposition.
//!
//! Each cycle fits only the current inliers, then re-scores every paired point
//! against the fit. Points whose residual is strictly below the cutoff form the
//! next inlier mask. Iteration stops when the mask reaches a fixed point, when no
//! inliers remain (an error), or when the cycle budget runs out, in which case the
//! last computed mask is kept.

use super::error::AlignError;
use super::kabsch::{MIN_POINTS, Superposition, superpose_paired};
use crate::core::models::point_set::{PointSet, paired};
use crate::core::utils::geometry::{pairwise_distances, rms};
use nalgebra::Point3;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub struct RobustSuperposition {
    /// RMSD over the final inliers only.
    pub deviation: f64,
    pub inlier_count: usize,
    pub cycles_used: usize,
    pub converged: bool,
    pub superposition: Superposition,
    pub inliers: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub superposition: Superposition,
    pub distances: Vec<f64>,
    pub mask: Vec<bool>,
}

impl CycleOutcome {
    pub fn inlier_count(&self) -> usize {
        self.mask.iter().filter(|&&keep| keep).count()
    }
}

/// Runs one refinement cycle: fit the points selected by `mask`, then score every
/// paired point against that fit.
///
/// # Errors
///
/// Returns [`AlignError::InsufficientPoints`] when `mask` selects fewer than three
/// points.
pub fn refine_cycle(
    reference: &[Point3<f64>],
    candidate: &[Point3<f64>],
    mask: &[bool],
    cutoff: f64,
) -> Result<CycleOutcome, AlignError> {
    let (selected_ref, selected_cand): (Vec<Point3<f64>>, Vec<Point3<f64>>) = reference
        .iter()
        .zip(candidate)
        .zip(mask)
        .filter_map(|((r, c), &keep)| keep.then_some((*r, *c)))
        .unzip();

    if selected_ref.len() < MIN_POINTS {
        return Err(AlignError::InsufficientPoints {
            found: selected_ref.len(),
        });
    }

    let superposition = superpose_paired(&selected_ref, &selected_cand)?;
    let moved: Vec<Point3<f64>> = candidate
        .iter()
        .map(|p| superposition.apply_point(p))
        .collect();
    let distances = pairwise_distances(reference, &moved);
    let mask = distances.iter().map(|&d| d < cutoff).collect();

    Ok(CycleOutcome {
        superposition,
        distances,
        mask,
    })
}

/// Superimposes `candidate` onto `reference`, iteratively discarding point pairs
/// whose residual is not below `cutoff`.
/// A cycle that leaves no inliers is an [`AlignError::AlignmentDivergence`].
pub fn robust_superpose(
    reference: &PointSet,
    candidate: &PointSet,
    cutoff: f64,
    max_cycles: usize,
) -> Result<RobustSuperposition, AlignError> {
    if !(cutoff.is_finite() && cutoff > 0.0) {
        return Err(AlignError::InvalidParameter(format!(
            "cutoff must be a positive finite distance, got {cutoff}"
        )));
    }
    if max_cycles == 0 {
        return Err(AlignError::InvalidParameter(
            "max_cycles must be at least 1".to_string(),
        ));
    }

    let (reference, candidate) = paired(reference, candidate);
    let mut mask = vec![true; reference.len()];
    let mut converged = false;
    let mut cycles_used = 0;
    let mut last: Option<CycleOutcome> = None;

    for cycle in 1..=max_cycles {
        let outcome = refine_cycle(reference, candidate, &mask, cutoff)?;
        cycles_used = cycle;
        trace!(
            cycle,
            inliers = outcome.inlier_count(),
            fit_rmsd = outcome.superposition.deviation,
            "Refinement cycle finished."
        );

        if outcome.mask == mask {
            converged = true;
            last = Some(outcome);
            break;
        }
        if outcome.inlier_count() == 0 {
            return Err(AlignError::AlignmentDivergence { cycle });
        }
        mask.clone_from(&outcome.mask);
        last = Some(outcome);
    }

    let last = last.ok_or_else(|| {
        AlignError::InvalidParameter("robust alignment ran no cycles".to_string())
    })?;

    let deviation = rms(
        last.distances
            .iter()
            .zip(&mask)
            .filter_map(|(&d, &keep)| keep.then_some(d)),
    )
    .ok_or(AlignError::AlignmentDivergence { cycle: cycles_used })?;
    let inlier_count = mask.iter().filter(|&&keep| keep).count();

    debug!(
        deviation,
        inlier_count, cycles_used, converged, "Robust superposition finished."
    );

    Ok(RobustSuperposition {
        deviation,
        inlier_count,
        cycles_used,
        converged,
        superposition: last.superposition,
        inliers: mask,
    })
}
