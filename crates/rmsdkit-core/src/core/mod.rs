//! # Core Module
//!
//! Stateless building blocks shared by the alignment engine and its collaborators.
//!
//! - **Data Model** ([`models`]) - The [`PointSet`](models::point_set::PointSet) type and
//!   index-based pairing of two structures.
//! - **Geometry** ([`utils`]) - Centroids, distances and RMSD helpers.
//! - **Structure I/O** ([`io`]) - Coordinate extraction from PDB and mmCIF files, exposed
//!   to the engine only through the [`StructureSource`](io::traits::StructureSource) trait.

pub mod io;
pub mod models;
pub mod utils;
