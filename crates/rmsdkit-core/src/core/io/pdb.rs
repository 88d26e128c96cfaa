use super::traits::ExtractionError;
use crate::core::models::point_set::PointSet;
use nalgebra::Point3;
use std::io::BufRead;

const CA_NAME: &str = "CA";

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_coordinate(line: &str, start: usize, end: usize) -> Option<f64> {
    slice_and_trim(line, start, end).parse().ok()
}

/// Scans fixed-column PDB records for alpha-carbons.
///
/// Every `ATOM`/`HETATM` line whose atom name (columns 13-16) is `CA` contributes a
/// point, in file order and across all models. Lines with unreadable coordinates
/// are skipped.
pub fn scan_ca_points(
    reader: &mut impl BufRead,
    source_name: &str,
) -> Result<PointSet, ExtractionError> {
    let mut points = PointSet::default();

    for line_res in reader.lines() {
        let line = line_res.map_err(|e| ExtractionError::Io {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;

        if !(line.starts_with("ATOM") || line.starts_with("HETATM")) {
            continue;
        }
        if slice_and_trim(&line, 12, 16) != CA_NAME {
            continue;
        }

        let coords = (
            parse_coordinate(&line, 30, 38),
            parse_coordinate(&line, 38, 46),
            parse_coordinate(&line, 46, 54),
        );
        if let (Some(x), Some(y), Some(z)) = coords {
            points.push(Point3::new(x, y, z));
        }
    }

    if points.is_empty() {
        return Err(ExtractionError::NoPointsFound {
            source_name: source_name.to_string(),
            chain: None,
        });
    }
    Ok(points)
}
