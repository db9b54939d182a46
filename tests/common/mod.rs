//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use microgrid_sim::data::EnvironmentSeries;
use microgrid_sim::sim::cost::Settlement;
use microgrid_sim::sim::env::MicrogridEnv;
use microgrid_sim::sim::microgrid::Microgrid;
use microgrid_sim::sim::params::ParameterSet;

/// Directory holding the CSV fixtures.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Reference parameter set shared by the microgrid and its policies.
pub fn default_params() -> Arc<ParameterSet> {
    Arc::new(ParameterSet::default())
}

/// One day with a dark night, a sunny noon, and an expensive evening peak.
pub fn day_series() -> EnvironmentSeries {
    let demand = (0..24)
        .map(|h| if (17..21).contains(&h) { 70.0 } else { 35.0 })
        .collect();
    let irradiance = (0..24)
        .map(|h: usize| {
            if (6..19).contains(&h) {
                900.0 * (std::f64::consts::PI * (h - 6) as f64 / 13.0).sin()
            } else {
                0.0
            }
        })
        .collect();
    let wind = (0..24).map(|h| [8.0, 15.0, 22.0, 30.0, 45.0][h % 5]).collect();
    let price = (0..24)
        .map(|h| match h {
            17..=20 => 0.9,
            0..=6 | 22..=23 => 0.08,
            _ => 0.15,
        })
        .collect();
    EnvironmentSeries::new(demand, irradiance, wind, price).expect("day series is consistent")
}

/// Reference microgrid at `soc_min` over [`day_series`].
pub fn day_env(settlement: Settlement) -> MicrogridEnv {
    let mg = Microgrid::new(default_params(), settlement);
    MicrogridEnv::new(mg, day_series(), None).expect("episode fits the series")
}
