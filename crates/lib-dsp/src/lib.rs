//! # lib-dsp
//!
//! Numerical core for S-parameter channel analysis.
//!
//! - **Network parameters**: return/insertion loss, impedance, VSWR, group
//!   delay and the Rollett stability factor
//! - **Channel synthesis**: PRBS baseband shaped by a measured response in
//!   the FFT domain
//! - **Eye diagram**: height, width, jitter and crossing percentage of a
//!   folded time-domain signal

pub mod channel;
pub mod error;
pub mod eye;
pub mod fft;
pub mod interpolation;
pub mod network;
pub mod prbs;

pub use channel::{ChannelSynthesizer, DEFAULT_NUM_BITS};
pub use error::{ComputationError, DspResult};
pub use eye::EyeDiagramAnalyzer;
pub use fft::FftEngine;
pub use network::{NetworkAnalyzer, NetworkSummary};
pub use prbs::{PrbsOrder, PrbsState};
