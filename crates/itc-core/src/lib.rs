#![deny(missing_docs)]

//! Shared foundation for the ITC toolkit: dimensioned quantities, structured
//! errors, and deterministic randomness.

pub mod errors;
pub mod rng;
pub mod units;

pub use errors::{ErrorInfo, ItcError};
pub use rng::{derive_labelled_seed, derive_substream_seed, RngHandle};
pub use units::{Dimension, Quantity, Unit};
