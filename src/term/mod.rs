//! SVI-S term structure: parameters and the short/long-term blender.

pub mod blend;
pub mod params;

pub use blend::{HORIZON_DAYS, blend, floor_degenerate};
pub use params::{AxisParams, TermStructureParams};
