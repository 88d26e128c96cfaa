//! Stateless data models consumed by the alignment engine.

pub mod point_set;
