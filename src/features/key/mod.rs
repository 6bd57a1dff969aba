//! Key decision modules
//!
//! Turn per-frame chroma vectors into a track key:
//! - Reference profiles (Shaath, Krumhansl-Kessler) rotated to all 12 tonics
//! - Pearson profile matching per frame
//! - Histogram voting over frames (default) or bigram sequence scoring

pub mod histogram;
pub mod markov;
pub mod matcher;
pub mod templates;

pub use histogram::{vote_weight, KeyHistogram};
pub use markov::BigramModel;
pub use matcher::{pearson, ProfileMatch, ProfileMatcher};
pub use templates::KeyProfiles;
