//! # lib-types
//!
//! Core type definitions shared across the workspace:
//! - Frequency and impedance units
//! - S-parameter datasets (parsed and record form)
//! - Waveform statistics and eye-diagram results

pub mod units;
pub mod waveform;
pub mod sparams;

pub use units::*;
pub use waveform::*;
pub use sparams::*;

/// Re-export num_complex for convenience
pub use num_complex::Complex64;
