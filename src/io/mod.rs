//! Audio I/O modules
//!
//! Decoding with Symphonia, in-memory sources, and the JSON artifact.

pub mod artifact;
pub mod decoder;
pub mod source;
