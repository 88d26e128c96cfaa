//! High-level entry points that tie the engine and the structure sources together.

pub mod compare;
