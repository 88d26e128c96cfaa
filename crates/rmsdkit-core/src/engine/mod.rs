//! # Engine Module
//!
//! The alignment algorithms and the plumbing around them.
//!
//! - **Rigid Superposition** ([`kabsch`]) - Optimal rotation and translation between two
//!   index-paired point sets, and the resulting RMSD.
//! - **Robust Refinement** ([`robust`]) - Iterative inlier selection on top of [`kabsch`].
//! - **Method Selection** ([`method`]) - Runs a named [`Method`](config::Method) against two
//!   structure sources, including the single automatic fallback.
//! - **External Aligners** ([`external`]) - The capability interface for delegated methods.
//! - **Configuration** ([`config`]), **Errors** ([`error`]) and **Progress** ([`progress`]).
//!
//! Every alignment function is a pure function of its inputs and is safe to call from
//! many threads at once.

pub mod config;
pub mod error;
pub mod external;
pub mod kabsch;
pub mod method;
pub mod progress;
pub mod robust;
