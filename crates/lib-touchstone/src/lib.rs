//! # lib-touchstone
//!
//! Touchstone (`.sNp`) S-parameter parsing and validation.
//!
//! The parser turns raw file text into a [`TouchstoneDataset`]; the validator
//! reports structural and physical problems without touching the data.
//! Option lines are tokenized with the `nom` parser combinator library.

pub mod error;
pub mod touchstone;
pub mod validator;

pub use error::{FormatError, ValidationError};
pub use lib_types::sparams::TouchstoneDataset;
pub use touchstone::{parse_touchstone, parse_touchstone_file};
pub use validator::{SParameterValidator, DEFAULT_MAGNITUDE_LIMIT};
