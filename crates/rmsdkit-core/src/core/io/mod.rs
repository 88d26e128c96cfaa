//! Coordinate extraction from molecular structure files.
//!
//! The alignment engine never parses files; it asks a
//! [`StructureSource`](traits::StructureSource) for points. This module provides
//! the file-backed source (with a built-in PDB/mmCIF line scanner and a
//! `pdbtbx`-backed structured reader) and an in-memory source.

pub mod cif;
pub mod file;
pub mod memory;
pub mod pdb;
pub mod structured;
pub mod traits;
