//! Audio I/O modules
//!
//! Audio decoding with Symphonia and the in-memory signal type handed to the
//! preprocessing stage.

pub mod decoder;
pub mod signal;

pub use decoder::{decode_audio, load_signal};
pub use signal::AudioSignal;
