//! # volmark
//!
//! SVI-S / SVI-JW volatility surface marking and implied-carry stripping.
//!
//! Turns a compact three-point term structure into a per-maturity SVI-JW
//! surface, evaluates it on a moneyness grid through an external vol
//! service, flags arbitrage on that grid, and decomposes fitted repo curves
//! into implied dividends.
//!
//! ## Architecture
//!
//! - **`term`**: Short/long-term blending and SVI-S parameters
//! - **`smile`**: Single-maturity SVI-JW slices
//! - **`surface`**: Maturity-indexed surfaces: expansion, editing, re-anchoring
//! - **`carry`**: Implied-dividend stripping, dividend swaps, forward curve
//! - **`grid`**: Vol grid assembly and arbitrage highlighting
//! - **`market`**: Schedules and the external collaborator traits
//! - **`session`**: Per-underlying working state
//!
//! ## Design
//!
//! - **Values, not state.** Surfaces, schedules and sessions are immutable;
//!   every edit returns a new value and a rejected edit changes nothing.
//! - **Collaborators behind traits.** Pricing, calendars, repo rates,
//!   arbitrage checks and storage are remote. All traits require
//!   `Send + Sync`; calls are blocking and may fail.
//! - **Degrade, don't fail.** Oracle failures produce the defined fallback
//!   (zero grid, `None` forward, skipped carry point) with the failure
//!   attached as [`Degraded::failure`].
//! - **No panics.** Library code never calls `unwrap()` or `expect()`.
//! - **Serializable.** Value types implement Serde with validation on
//!   deserialization where invariants exist.

pub mod carry;
pub mod config;
pub mod conventions;
pub mod error;
pub mod grid;
pub mod market;
pub mod reference;
pub mod session;
pub mod smile;
pub mod surface;
pub mod term;
pub mod types;
mod validate;

#[doc(inline)]
pub use config::EngineConfig;
#[doc(inline)]
pub use error::{Degraded, Result, VolMarkError};
#[doc(inline)]
pub use session::Session;
#[doc(inline)]
pub use smile::SmileSlice;
#[doc(inline)]
pub use surface::{Surface, SurfaceExpander};
#[doc(inline)]
pub use term::TermStructureParams;
#[doc(inline)]
pub use types::{Maturity, MoneynessKey, PassFail, Tau, Vol};
