//! Feature extraction modules
//!
//! This module contains the per-frame feature pipeline:
//! - Framing and analysis windows
//! - Spectral estimation (constant-Q or Lomb-Scargle)
//! - Chroma folding
//! - Key matching and decision

pub mod chroma;
pub mod framing;
pub mod key;
pub mod spectral;
