//! # rmsdkit Core Library
//!
//! Rigid-body superposition and RMSD comparison of protein structures.
//!
//! ## Layout
//!
//! - **[`core`]: The Foundation.** Point sets, geometry helpers, and the structure
//!   sources that pull Cα coordinates out of PDB and mmCIF files.
//!
//! - **[`engine`]: The Alignment Core.** The Kabsch superposition, the iterative
//!   outlier-pruning refinement, and the dispatch of a named method (with its
//!   fallback to Kabsch) to one of them or to an external aligner.
//!
//! - **[`workflows`]: The Public API.** Batch comparison of many candidates against
//!   one reference, producing a ranked report with per-candidate status.

pub mod core;
pub mod engine;
pub mod workflows;
