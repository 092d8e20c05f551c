//! Display grids derived from a surface.
//!
//! [`build_grid`] evaluates a surface on maturity × moneyness through the
//! vol oracle; [`highlight`] marks the cells an arbitrage check failed on.

pub mod arbitrage;
pub mod vol;

pub use arbitrage::{ArbitrageCheck, CheckGrid, HighlightSet, highlight};
pub use vol::{VolGrid, build_grid};
