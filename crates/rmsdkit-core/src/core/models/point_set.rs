use nalgebra::{Point3, Rotation3, Vector3};

/// An ordered sequence of 3-D coordinates taken from one structure.
///
/// By convention each point is the alpha-carbon of a residue, but nothing in the
/// alignment code depends on atom identity. Duplicates are kept as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: Vec<Point3<f64>>,
}

impl PointSet {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    pub fn from_coords(coords: &[[f64; 3]]) -> Self {
        coords.iter().map(|&c| Point3::from(c)).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point3<f64>> {
        self.points.iter()
    }

    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    /// Returns a copy holding at most the first `n` points.
    pub fn truncated(&self, n: usize) -> Self {
        Self::new(self.points.iter().take(n).copied().collect())
    }

    /// Keeps the points whose mask entry is `true`. Points past the end of the
    /// mask are dropped.
    pub fn select(&self, mask: &[bool]) -> Self {
        self.points
            .iter()
            .zip(mask)
            .filter_map(|(p, &keep)| keep.then_some(*p))
            .collect()
    }

    pub fn centroid(&self) -> Option<Point3<f64>> {
        crate::core::utils::geometry::centroid(&self.points)
    }

    pub fn transformed(&self, rotation: &Rotation3<f64>, translation: &Vector3<f64>) -> Self {
        self.points
            .iter()
            .map(|p| rotation * p + translation)
            .collect()
    }
}

impl From<Vec<Point3<f64>>> for PointSet {
    fn from(points: Vec<Point3<f64>>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point3<f64>> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point3<f64>;
    type IntoIter = std::slice::Iter<'a, Point3<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Pairs two point sets by index, keeping only the common prefix of
/// `min(reference.len(), candidate.len())` points from each.
///
/// This is positional correspondence, not identity matching: sets whose residues
/// are offset or reordered will be paired incorrectly. Callers can detect
/// truncation through the point count reported with every alignment.
pub fn paired<'a>(
    reference: &'a PointSet,
    candidate: &'a PointSet,
) -> (&'a [Point3<f64>], &'a [Point3<f64>]) {
    let n = reference.len().min(candidate.len());
    (&reference.points[..n], &candidate.points[..n])
}
