use super::traits::{Extraction, ExtractionError, StructureSource};
use crate::core::models::point_set::PointSet;
use std::path::{Path, PathBuf};

/// A named, already-extracted point set.
///
/// Every [`Extraction`] mode yields the same points; chain filters are ignored
/// because no chain information is kept.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    name: String,
    points: PointSet,
    location: Option<PathBuf>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, points: PointSet) -> Self {
        Self {
            name: name.into(),
            points,
            location: None,
        }
    }

    /// Attaches a file location for use by external aligners.
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }
}

impl StructureSource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, extraction: &Extraction) -> Result<PointSet, ExtractionError> {
        if self.points.is_empty() {
            return Err(ExtractionError::NoPointsFound {
                source_name: self.name.clone(),
                chain: extraction.chain().map(str::to_string),
            });
        }
        Ok(self.points.clone())
    }

    fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }
}
