//! Detection Module - Per-frame ML output entering the engine
//!
//! The inference collaborator produces one sample per cycle (nominally 500 ms - 2 s).
//! Samples are ephemeral: the engine keeps only a counter of processed samples.
//!
//! ## Structure
//! - `sample.rs` - `RawSample` (host shape) and `DetectionSample` (normalized)

pub mod sample;

pub use sample::{estimate_gaze, DetectionSample, RawSample};
