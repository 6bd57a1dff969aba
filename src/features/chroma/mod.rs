//! Chroma extraction modules
//!
//! Fold a per-note spectral vector spanning several octaves into a
//! 12-element pitch-class (chroma) vector.

pub mod folding;

pub use folding::{fold_octaves, ChromaVector};
