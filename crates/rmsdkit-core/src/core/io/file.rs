use super::traits::{Extraction, ExtractionError, StructureSource};
use super::{cif, pdb, structured};
use crate::core::models::point_set::PointSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    Pdb,
    Mmcif,
}

impl StructureFormat {
    /// Picks the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdb" => Some(Self::Pdb),
            "cif" => Some(Self::Mmcif),
            _ => None,
        }
    }

    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_some()
    }
}

/// A PDB or mmCIF file on disk.
#[derive(Debug, Clone)]
pub struct StructureFile {
    path: PathBuf,
    name: String,
}

impl StructureFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Result<StructureFormat, ExtractionError> {
        StructureFormat::from_path(&self.path).ok_or_else(|| ExtractionError::UnsupportedFormat {
            path: self.path.clone(),
        })
    }

    /// Runs the built-in line scanner over the whole file.
    pub fn scan(&self) -> Result<PointSet, ExtractionError> {
        let format = self.format()?;
        let file = File::open(&self.path).map_err(|e| ExtractionError::Io {
            source_name: self.name.clone(),
            message: e.to_string(),
        })?;
        let mut reader = BufReader::new(file);
        match format {
            StructureFormat::Pdb => pdb::scan_ca_points(&mut reader, &self.name),
            StructureFormat::Mmcif => cif::scan_ca_points(&mut reader, &self.name),
        }
    }
}

impl StructureSource for StructureFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, extraction: &Extraction) -> Result<PointSet, ExtractionError> {
        match extraction {
            Extraction::Scanned => self.scan(),
            Extraction::Structured { chain } => {
                self.format()?;
                structured::read_first_model(&self.path, &self.name, chain.as_deref())
            }
        }
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
