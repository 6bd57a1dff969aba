//! Analysis and result aggregation modules
//!
//! - Result types (keys, per-track analysis)
//! - Evaluation of predictions against reference keys
//! - Dataset batch driver

pub mod batch;
pub mod evaluation;
pub mod result;
