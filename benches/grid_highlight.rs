use std::hint::black_box;

use chrono::{Months, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use volmark::EngineConfig;
use volmark::grid::{CheckGrid, highlight};
use volmark::smile::SmileSlice;
use volmark::surface::{ModelTag, Surface};
use volmark::types::{MoneynessKey, PassFail};

fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date")
}

fn highlight_benchmarks(c: &mut Criterion) {
    let maturities: Vec<NaiveDate> = (1..=96)
        .filter_map(|i| anchor().checked_add_months(Months::new(i)))
        .collect();
    let slices = maturities.iter().enumerate().map(|(i, m)| {
        let slice = SmileSlice::from_term_point(0.2, -0.1, 1.0, (i + 1) as f64 / 12.0, 1.0)
            .expect("benchmark slice should be valid");
        (*m, slice)
    });
    let surface = Surface::new("SX5E", ModelTag::SviJw, 5000.0, anchor(), slices)
        .expect("benchmark surface should be valid");
    let moneyness = EngineConfig::default().curve_grid_moneyness;

    // Every other maturity evaluated; every fifth strike failing.
    let check: CheckGrid = maturities
        .iter()
        .step_by(2)
        .map(|m| {
            let row = moneyness
                .iter()
                .enumerate()
                .map(|(j, k)| {
                    let flag = if j % 5 == 0 { PassFail::Fail } else { PassFail::Pass };
                    (MoneynessKey::new(*k), flag)
                })
                .collect();
            (*m, row)
        })
        .collect();

    c.bench_function("highlight_96x200", |b| {
        b.iter(|| {
            highlight(
                black_box(&surface),
                5000.0,
                black_box(5050.0),
                &maturities,
                &moneyness,
                &check,
            )
        });
    });
}

criterion_group!(benches, highlight_benchmarks);
criterion_main!(benches);
