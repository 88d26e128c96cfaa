use super::traits::ExtractionError;
use crate::core::models::point_set::PointSet;
use std::path::Path;

#[cfg(feature = "structured-io")]
use nalgebra::Point3;

/// Reads the first model of a PDB or mmCIF file with `pdbtbx` and returns the CA
/// atom of every residue, optionally restricted to one chain.
#[cfg(feature = "structured-io")]
pub fn read_first_model(
    path: &Path,
    source_name: &str,
    chain: Option<&str>,
) -> Result<PointSet, ExtractionError> {
    let path_str = path.to_str().ok_or_else(|| ExtractionError::Io {
        source_name: source_name.to_string(),
        message: "path is not valid UTF-8".to_string(),
    })?;

    let (pdb, _warnings) = pdbtbx::ReadOptions::default()
        .set_level(pdbtbx::StrictnessLevel::Loose)
        .set_only_first_model(true)
        .read(path_str)
        .map_err(|errors| ExtractionError::Parse {
            source_name: source_name.to_string(),
            message: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })?;

    let no_points = || ExtractionError::NoPointsFound {
        source_name: source_name.to_string(),
        chain: chain.map(str::to_string),
    };

    let model = pdb.models().next().ok_or_else(no_points)?;
    let points: PointSet = model
        .chains()
        .filter(|c| chain.is_none_or(|id| c.id() == id))
        .flat_map(|c| c.residues())
        .filter_map(|residue| residue.atoms().find(|atom| atom.name() == "CA"))
        .map(|atom| {
            let (x, y, z) = atom.pos();
            Point3::new(x, y, z)
        })
        .collect();

    if points.is_empty() {
        return Err(no_points());
    }
    Ok(points)
}

#[cfg(not(feature = "structured-io"))]
pub fn read_first_model(
    _path: &Path,
    _source_name: &str,
    _chain: Option<&str>,
) -> Result<PointSet, ExtractionError> {
    Err(ExtractionError::ReaderUnavailable(
        "built without the `structured-io` feature".to_string(),
    ))
}
