//! Carry analytics on dividend and repo schedules.
//!
//! - [`strip`] decomposes a fitted repo curve into implied dividend points
//! - [`aggregate`] buckets a dividend schedule into annual swap points
//! - [`forward_curve`] evaluates forwards for display
//!
//! None of these touch the vol surface.

pub mod forward;
pub mod strip;
pub mod swap;

pub use forward::{ForwardPoint, forward_curve};
pub use strip::{CarryDecomposition, CarryPoint, strip};
pub use swap::{DividendSwapPoint, aggregate};
