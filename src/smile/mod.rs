//! Single-maturity smile parametrization.
//!
//! Surfaces are stored as SVI Jump-Wing slices ([`SmileSlice`]); evaluating a
//! slice into implied vols happens in the external vol oracle.

pub mod jw;

pub use jw::{SmileSlice, SpxExtension, min_vol_ratio};
