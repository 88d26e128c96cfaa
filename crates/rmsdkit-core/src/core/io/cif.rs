use super::traits::ExtractionError;
use crate::core::models::point_set::PointSet;
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::BufRead;

const ATOM_SITE_PREFIX: &str = "_atom_site.";
const MIN_ROW_FIELDS: usize = 13;

const DEFAULT_ATOM_ID_COLUMN: usize = 3;
const DEFAULT_X_COLUMN: usize = 10;
const DEFAULT_Y_COLUMN: usize = 11;
const DEFAULT_Z_COLUMN: usize = 12;

struct AtomSiteColumns {
    atom_id: usize,
    x: usize,
    y: usize,
    z: usize,
}

impl AtomSiteColumns {
    fn from_header(header: &HashMap<String, usize>) -> Self {
        let col = |name: &str, default: usize| header.get(name).copied().unwrap_or(default);
        Self {
            atom_id: col("label_atom_id", DEFAULT_ATOM_ID_COLUMN),
            x: col("Cartn_x", DEFAULT_X_COLUMN),
            y: col("Cartn_y", DEFAULT_Y_COLUMN),
            z: col("Cartn_z", DEFAULT_Z_COLUMN),
        }
    }

    fn max_index(&self) -> usize {
        self.x.max(self.y).max(self.z)
    }
}

/// Scans the `_atom_site` loop of an mmCIF file for alpha-carbons.
///
/// Column positions come from the loop header, falling back to the usual PDBx
/// layout when a column is not declared. Rows with fewer than 13 fields are
/// ignored, as are rows whose coordinates do not parse.
pub fn scan_ca_points(
    reader: &mut impl BufRead,
    source_name: &str,
) -> Result<PointSet, ExtractionError> {
    let mut points = PointSet::default();
    let mut in_atom_site = false;
    let mut header: HashMap<String, usize> = HashMap::new();

    for line_res in reader.lines() {
        let raw = line_res.map_err(|e| ExtractionError::Io {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        let line = raw.trim();

        if line.starts_with("loop_") {
            in_atom_site = false;
            header.clear();
            continue;
        }
        if let Some(column) = line.strip_prefix(ATOM_SITE_PREFIX) {
            in_atom_site = true;
            let index = header.len();
            header.insert(column.trim().to_string(), index);
            continue;
        }
        if !in_atom_site || line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('_') {
            in_atom_site = false;
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_ROW_FIELDS {
            continue;
        }
        let columns = AtomSiteColumns::from_header(&header);
        if fields.len() <= columns.max_index() {
            continue;
        }
        if fields.get(columns.atom_id).copied() != Some("CA") {
            continue;
        }

        let parse = |i: usize| fields[i].parse::<f64>().ok();
        if let (Some(x), Some(y), Some(z)) = (parse(columns.x), parse(columns.y), parse(columns.z))
        {
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
