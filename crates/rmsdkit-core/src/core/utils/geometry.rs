use nalgebra::{Point3, Rotation3, Unit, Vector3};

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

/// Euclidean distance between each index-paired point of `a` and `b`.
pub fn pairwise_distances(a: &[Point3<f64>], b: &[Point3<f64>]) -> Vec<f64> {
    a.iter().zip(b).map(|(p, q)| (p - q).norm()).collect()
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Root-mean-square of a list of distances; `None` when the list is empty.
pub fn rms(distances: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = distances
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), d| (sum + d * d, count + 1));
    (count > 0).then(|| (sum / count as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rmsd_of_identical_sets_is_zero() {
        let pts = vec![Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, 0.5, 2.0)];
        assert_eq!(calculate_rmsd(&pts, &pts), Some(0.0));
    }

    #[test]
    fn rmsd_rejects_mismatched_or_empty_input() {
        let a = vec![Point3::origin()];
        assert_eq!(calculate_rmsd(&a, &[]), None);
        assert_eq!(calculate_rmsd(&[], &[]), None);
    }

    #[test]
    fn rms_matches_rmsd_of_distances() {
        let a = vec![Point3::origin(), Point3::origin()];
        let b = vec![Point3::new(3.0, 0.0, 0.0), Point3::new(0.0, 4.0, 0.0)];
        let from_distances = rms(pairwise_distances(&a, &b)).unwrap();
        let direct = calculate_rmsd(&a, &b).unwrap();
        assert!((from_distances - direct).abs() < 1e-12);
        assert!((direct - 12.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn rms_of_nothing_is_none() {
        assert_eq!(rms(std::iter::empty()), None);
    }

    #[test]
    fn rotation_from_axis_angle_uses_degrees() {
        let rot = rotation_from_axis_angle(&Vector3::new(0.0, 0.0, 2.0), 90.0);
        let v = rot * Vector3::x();
        assert!((v - Vector3::y()).norm() < 1e-12);
    }
}
