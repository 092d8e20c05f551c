//! Moneyness-indexed implied vol grid.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::conventions::strike_from_moneyness;
use crate::error::{self, Degraded, VolMarkError};
use crate::market::VolOracle;
use crate::surface::Surface;
use crate::types::MoneynessKey;
use crate::validate::validate_positive;

/// Implied vols by maturity (rows) and moneyness (columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolGrid {
    maturities: Vec<NaiveDate>,
    moneyness: Vec<MoneynessKey>,
    /// `vols[i][j]` is the vol at `maturities[i]`, `moneyness[j]`.
    vols: Vec<Vec<f64>>,
}

impl VolGrid {
    /// A grid of the given shape with every vol set to zero.
    pub fn zeros(maturities: &[NaiveDate], moneyness: &[f64]) -> Self {
        Self {
            maturities: maturities.to_vec(),
            moneyness: moneyness.iter().map(|k| MoneynessKey::new(*k)).collect(),
            vols: vec![vec![0.0; moneyness.len()]; maturities.len()],
        }
    }

    pub fn maturities(&self) -> &[NaiveDate] {
        &self.maturities
    }

    pub fn moneyness(&self) -> &[MoneynessKey] {
        &self.moneyness
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, &[f64])> + '_ {
        self.maturities
            .iter()
            .zip(self.vols.iter())
            .map(|(m, row)| (*m, row.as_slice()))
    }

    pub fn vol(&self, maturity: NaiveDate, moneyness: f64) -> Option<f64> {
        let i = self.maturities.iter().position(|m| *m == maturity)?;
        let key = MoneynessKey::new(moneyness);
        let j = self.moneyness.iter().position(|k| *k == key)?;
        Some(self.vols[i][j])
    }

    pub fn is_all_zero(&self) -> bool {
        self.vols.iter().flatten().all(|v| *v == 0.0)
    }
}

/// Evaluate `surface` on a `maturities × moneyness` grid.
///
/// Strikes are `k · spot`; the oracle is called once for the whole grid and
/// its answer re-keyed on moneyness rounded to two decimals. An empty
/// surface or a failed oracle call yields a zero-filled grid of the same
/// shape with the reason attached. Cells the oracle did not return stay zero
/// and are reported as missing data.
///
/// # Errors
/// Returns [`VolMarkError::InvalidInput`] if `spot` is not positive.
pub fn build_grid(
    surface: &Surface,
    spot: f64,
    maturities: &[NaiveDate],
    moneyness: &[f64],
    oracle: &dyn VolOracle,
) -> error::Result<Degraded<VolGrid>> {
    validate_positive(spot, "spot")?;
    let mut grid = VolGrid::zeros(maturities, moneyness);

    if surface.is_empty() {
        return Ok(Degraded::fallback(
            grid,
            VolMarkError::MissingData {
                message: format!("no {} surface for {}", surface.model(), surface.underlying()),
            },
        ));
    }

    let strikes: Vec<f64> = moneyness
        .iter()
        .map(|k| strike_from_moneyness(*k, spot))
        .collect();

    #[cfg(feature = "logging")]
    tracing::debug!(
        underlying = surface.underlying(),
        n_maturities = maturities.len(),
        n_strikes = strikes.len(),
        "vol grid requested"
    );

    let quotes = match oracle.evaluate(surface, maturities, &strikes) {
        Ok(q) => q,
        Err(e) => {
            #[cfg(feature = "logging")]
            tracing::warn!(error = %e, "vol grid zero-filled");
            return Ok(Degraded::fallback(grid, e));
        }
    };

    let columns: BTreeMap<MoneynessKey, usize> = grid
        .moneyness
        .iter()
        .enumerate()
        .map(|(j, k)| (*k, j))
        .collect();
    let mut missing = 0usize;
    for (i, maturity) in maturities.iter().enumerate() {
        let mut filled = vec![false; moneyness.len()];
        for (strike, vol) in quotes.get(maturity).into_iter().flatten() {
            let key = MoneynessKey::from_strike(*strike, spot);
            if let Some(&j) = columns.get(&key)
                && vol.is_finite()
            {
                grid.vols[i][j] = *vol;
                filled[j] = true;
            }
        }
        missing += filled.iter().filter(|f| !**f).count();
    }

    if missing > 0 {
        return Ok(Degraded::fallback(
            grid,
            VolMarkError::MissingData {
                message: format!("{missing} grid cells had no vol"),
            },
        ));
    }
    Ok(Degraded::clean(grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::VolQuotes;
    use crate::smile::SmileSlice;
    use crate::surface::ModelTag;

    /// Returns `atm_vol + 0.1 · |k/spot − 1|` at every requested strike.
    struct SmileOracle {
        spot: f64,
    }

    impl VolOracle for SmileOracle {
        fn evaluate(&self, surface: &Surface, maturities: &[NaiveDate], strikes: &[f64]) -> error::Result<VolQuotes> {
            Ok(maturities
                .iter()
                .map(|m| {
                    let atm = surface.slice(*m).map_or(0.2, |s| s.vol());
                    let row = strikes
                        .iter()
                        .map(|k| (*k, atm + 0.1 * (k / self.spot - 1.0).abs()))
                        .collect();
                    (*m, row)
                })
                .collect())
        }
    }

    struct DownOracle;

    impl VolOracle for DownOracle {
        fn evaluate(&self, _: &Surface, _: &[NaiveDate], _: &[f64]) -> error::Result<VolQuotes> {
            Err(VolMarkError::oracle("vol", "503"))
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn surface() -> Surface {
        let slice = SmileSlice::from_term_point(0.25, -0.1, 1.0, 0.5, 1.0).unwrap();
        Surface::new("SPX", ModelTag::SviJw, 4800.0, d(2024, 1, 2), [(d(2024, 6, 21), slice)]).unwrap()
    }

    #[test]
    fn grid_is_keyed_on_moneyness() {
        let spot = 4800.0;
        let out = build_grid(&surface(), spot, &[d(2024, 6, 21)], &[0.9, 1.0, 1.1], &SmileOracle { spot }).unwrap();
        assert!(!out.is_degraded());
        let g = out.value;
        assert_eq!(g.vol(d(2024, 6, 21), 1.0), Some(0.25));
        let v = g.vol(d(2024, 6, 21), 0.9).unwrap();
        assert!((v - 0.26).abs() < 1e-9);
    }

    #[test]
    fn oracle_failure_zero_fills() {
        let out = build_grid(&surface(), 4800.0, &[d(2024, 6, 21), d(2024, 12, 20)], &[0.9, 1.0], &DownOracle).unwrap();
        assert!(out.is_degraded());
        assert!(out.value.is_all_zero());
        assert_eq!(out.value.rows().count(), 2);
        assert_eq!(out.value.moneyness().len(), 2);
    }

    #[test]
    fn empty_surface_zero_fills() {
        let empty = Surface::empty("SPX", ModelTag::SviSpx, 4800.0, d(2024, 1, 2)).unwrap();
        let out = build_grid(&empty, 4800.0, &[d(2024, 6, 21)], &[1.0], &SmileOracle { spot: 4800.0 }).unwrap();
        assert!(matches!(out.failure, Some(VolMarkError::MissingData { .. })));
        assert!(out.value.is_all_zero());
    }

    #[test]
    fn missing_maturity_in_answer_is_reported() {
        struct OneRow;
        impl VolOracle for OneRow {
            fn evaluate(&self, _: &Surface, maturities: &[NaiveDate], strikes: &[f64]) -> error::Result<VolQuotes> {
                Ok([(maturities[0], strikes.iter().map(|k| (*k, 0.2)).collect())].into_iter().collect())
            }
        }
        let out = build_grid(&surface(), 100.0, &[d(2024, 6, 21), d(2024, 12, 20)], &[1.0], &OneRow).unwrap();
        assert!(out.is_degraded());
        assert_eq!(out.value.vol(d(2024, 6, 21), 1.0), Some(0.2));
        assert_eq!(out.value.vol(d(2024, 12, 20), 1.0), Some(0.0));
    }
}
