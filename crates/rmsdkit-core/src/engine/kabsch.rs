//! Rigid-body superposition by the Kabsch algorithm.

use super::error::AlignError;
use crate::core::models::point_set::{PointSet, paired};
use crate::core::utils::geometry::{calculate_rmsd, centroid};
use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

pub const MIN_POINTS: usize = 3;

/// The optimal rigid transform mapping a candidate onto a reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Superposition {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
    pub deviation: f64,
    /// Smaller than either input length when the longer set was truncated.
    pub point_count: usize,
}

impl Superposition {
    #[inline]
    pub fn apply_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    pub fn apply(&self, points: &PointSet) -> PointSet {
        points.transformed(&self.rotation, &self.translation)
    }
}

/// Superimposes `candidate` onto `reference`.
///
/// Only the first `min(reference.len(), candidate.len())` points of each set are
/// used, paired by index.
///
/// # Errors
///
/// Returns [`AlignError::InsufficientPoints`] when fewer than three points are
/// paired. Collinearity is not checked.
pub fn superpose(reference: &PointSet, candidate: &PointSet) -> Result<Superposition, AlignError> {
    let (reference, candidate) = paired(reference, candidate);
    superpose_paired(reference, candidate)
}

pub(crate) fn superpose_paired(
    reference: &[Point3<f64>],
    candidate: &[Point3<f64>],
) -> Result<Superposition, AlignError> {
    let n = reference.len().min(candidate.len());
    if n < MIN_POINTS {
        return Err(AlignError::InsufficientPoints { found: n });
    }
    let reference = &reference[..n];
    let candidate = &candidate[..n];

    let (rotation, translation) = calculate_transformation(candidate, reference)?;

    let moved: Vec<Point3<f64>> = candidate
        .iter()
        .map(|p| rotation * p + translation)
        .collect();
    let deviation = calculate_rmsd(reference, &moved)
        .ok_or_else(|| AlignError::Numerical("RMSD of an empty selection".to_string()))?;

    Ok(Superposition {
        rotation,
        translation,
        deviation,
        point_count: n,
    })
}

fn calculate_transformation(
    from_points: &[Point3<f64>],
    to_points: &[Point3<f64>],
) -> Result<(Rotation3<f64>, Vector3<f64>), AlignError> {
    let empty = || AlignError::InsufficientPoints { found: 0 };
    let from_centroid = centroid(from_points).ok_or_else(empty)?;
    let to_centroid = centroid(to_points).ok_or_else(empty)?;

    let h = from_points
        .iter()
        .zip(to_points)
        .fold(Matrix3::zeros(), |acc, (f, t)| {
            acc + (t - to_centroid) * (f - from_centroid).transpose()
        });

    let svd = h.try_svd(true, true, f64::EPSILON, 0).ok_or_else(|| {
        AlignError::Numerical("SVD of the covariance matrix did not converge".to_string())
    })?;
    let smallest = svd.singular_values.imin();
    let u = svd
        .u
        .ok_or_else(|| AlignError::Numerical("SVD produced no U matrix".to_string()))?;
    let mut v_t = svd
        .v_t
        .ok_or_else(|| AlignError::Numerical("SVD produced no V^T matrix".to_string()))?;

    // H = Σ t·fᵀ = U·S·Vᵀ, so R = U·Vᵀ maps `from` onto `to`.
    let mut rotation_matrix = u * v_t;
    if rotation_matrix.determinant() < 0.0 {
        // Reflection: negate the singular vector of the smallest singular value.
        v_t.row_mut(smallest).neg_mut();
        rotation_matrix = u * v_t;
    }

    let rotation = Rotation3::from_matrix_unchecked(rotation_matrix);
    let translation = to_centroid.coords - rotation * from_centroid.coords;

    Ok((rotation, translation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::geometry::rotation_from_axis_angle;

    fn reference_set() -> PointSet {
        PointSet::from_coords(&[
            [1.2, 0.3, -0.4],
            [2.5, 1.1, 0.7],
            [0.4, 2.8, 1.9],
            [-1.3, 1.7, 3.2],
            [-2.2, -0.6, 1.1],
            [0.9, -1.8, -2.4],
        ])
    }

    fn assert_proper_rotation(rotation: &Rotation3<f64>) {
        let m = rotation.matrix();
        assert!((m.determinant() - 1.0).abs() < 1e-9, "det = {}", m.determinant());
        let should_be_identity = m.transpose() * m;
        assert!((should_be_identity - Matrix3::identity()).norm() < 1e-9);
    }

    #[test]
    fn self_alignment_is_identity() {
        let p = reference_set();
        let result = superpose(&p, &p).unwrap();
        assert!(result.deviation < 1e-9);
        assert!((result.rotation.matrix() - Matrix3::identity()).norm() < 1e-6);
        assert!(result.translation.norm() < 1e-9);
        assert_eq!(result.point_count, 6);
        assert_proper_rotation(&result.rotation);
    }

    #[test]
    fn pure_translation_is_recovered() {
        let from = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let to = PointSet::from_coords(&[
            [10.0, 20.0, 30.0],
            [11.0, 20.0, 30.0],
            [10.0, 21.0, 30.0],
        ]);

        let result = superpose(&to, &from).unwrap();

        assert!((result.rotation.matrix() - Matrix3::identity()).norm() < 1e-9);
        assert!((result.translation - Vector3::new(10.0, 20.0, 30.0)).norm() < 1e-9);
        assert!(result.deviation < 1e-9);
    }

    #[test]
    fn rotated_copy_is_recovered_exactly() {
        let p = reference_set();
        let r0 = rotation_from_axis_angle(&Vector3::new(1.0, 2.0, -0.5), 90.0);
        let t0 = Vector3::new(4.0, -7.5, 2.25);
        let q = p.transformed(&r0, &t0);

        let result = superpose(&p, &q).unwrap();

        assert!(result.deviation < 1e-6);
        assert_proper_rotation(&result.rotation);
        let restored = result.apply(&q);
        for (a, b) in p.iter().zip(restored.iter()) {
            assert!((a - b).norm() < 1e-6);
        }
    }

    #[test]
    fn deviation_is_invariant_under_rigid_motion_of_candidate() {
        let p = reference_set();
        let q = PointSet::from_coords(&[
            [1.0, 0.5, -0.2],
            [2.9, 1.0, 0.4],
            [0.1, 2.5, 2.2],
            [-1.0, 1.9, 3.0],
            [-2.6, -0.2, 1.4],
            [1.3, -1.5, -2.0],
        ]);
        let base = superpose(&p, &q).unwrap().deviation;
        assert!(base > 1e-3);

        let r0 = rotation_from_axis_angle(&Vector3::new(-0.3, 0.8, 0.1), 137.0);
        let moved = q.transformed(&r0, &Vector3::new(-12.0, 3.0, 8.0));
        let after = superpose(&p, &moved).unwrap().deviation;

        assert!((base - after).abs() < 1e-9);
    }

    #[test]
    fn mirror_image_still_yields_a_proper_rotation() {
        let p = reference_set();
        let mirrored: PointSet = p.iter().map(|pt| Point3::new(-pt.x, pt.y, pt.z)).collect();

        let result = superpose(&p, &mirrored).unwrap();

        assert_proper_rotation(&result.rotation);
        assert!(result.deviation > 1e-3);
    }

    #[test]
    fn only_the_common_prefix_is_used() {
        let reference = PointSet::from_coords(&[
            [0.0, 0.0, 0.0],
            [1.5, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [5.0, 5.0, 5.0],
            [9.0, -3.0, 1.0],
        ]);
        let candidate = PointSet::from_coords(&[[0.1, 0.0, 0.0], [1.4, 0.2, 0.0], [0.0, 2.1, -0.1]]);

        let base = superpose(&reference, &candidate).unwrap();
        assert_eq!(base.point_count, 3);

        let mut altered = reference.truncated(3);
        altered.push(Point3::new(-40.0, 12.0, 7.0));
        altered.push(Point3::new(3.0, 3.0, 3.0));
        let again = superpose(&altered, &candidate).unwrap();

        assert!((base.deviation - again.deviation).abs() < 1e-12);
        assert!((base.rotation.matrix() - again.rotation.matrix()).norm() < 1e-12);
    }

    #[test]
    fn fewer_than_three_points_is_rejected() {
        let a = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let b = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(
            superpose(&a, &b),
            Err(AlignError::InsufficientPoints { found: 2 })
        );
        assert_eq!(
            superpose(&PointSet::default(), &a),
            Err(AlignError::InsufficientPoints { found: 0 })
        );
    }
}
