//! Seeded synthetic environment series.
//!
//! Used when no historical data is configured. Every process draws from one
//! `StdRng`, so a seed fully determines the series.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use super::EnvironmentSeries;
use crate::error::DataError;

/// Hours per simulated day.
const HOURS_PER_DAY: usize = 24;

/// Minimum cloud multiplier (heavy overcast).
const CLOUD_MIN: f64 = 0.2;
/// Maximum cloud multiplier (enhanced irradiance from cloud edges).
const CLOUD_MAX: f64 = 1.2;

/// Parameters of the synthetic weather, demand, and tariff model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticProfile {
    /// Mean hourly demand.
    pub demand_base: f64,
    /// Amplitude of the daily demand cycle.
    pub demand_amplitude: f64,
    /// Phase offset of the demand cycle (radians).
    pub demand_phase_rad: f64,
    /// Standard deviation of demand noise.
    pub demand_noise_std: f64,
    /// Clear-sky irradiance at solar noon (W/m²).
    pub peak_irradiance: f64,
    /// Sunrise hour (inclusive).
    pub sunrise_hour: usize,
    /// Sunset hour (exclusive).
    pub sunset_hour: usize,
    /// AR(1) persistence of the cloud multiplier (0–1).
    pub cloud_alpha: f64,
    /// Innovation noise of the cloud multiplier.
    pub cloud_noise_std: f64,
    /// Long-run mean wind speed (km/h).
    pub wind_mean_kmh: f64,
    /// AR(1) persistence of wind speed (0–1).
    pub wind_alpha: f64,
    /// Innovation noise of wind speed (km/h).
    pub wind_noise_std: f64,
    /// Price between 22:00 and 07:00.
    pub price_off_peak: f64,
    /// Price outside the off-peak and peak windows.
    pub price_shoulder: f64,
    /// Price between 17:00 and 21:00.
    pub price_peak: f64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        Self {
            demand_base: 40.0,
            demand_amplitude: 15.0,
            demand_phase_rad: -PI / 2.0,
            demand_noise_std: 2.0,
            peak_irradiance: 900.0,
            sunrise_hour: 6,
            sunset_hour: 19,
            cloud_alpha: 0.8,
            cloud_noise_std: 0.25,
            wind_mean_kmh: 20.0,
            wind_alpha: 0.85,
            wind_noise_std: 4.0,
            price_off_peak: 0.08,
            price_shoulder: 0.15,
            price_peak: 0.32,
        }
    }
}

/// Draws a Gaussian sample with mean 0 using the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    z0 * std_dev
}

/// Fraction of clear-sky irradiance at `hour`: a half-cosine between
/// sunrise and sunset, 0 at night.
pub fn daylight_fraction(hour: usize, sunrise: usize, sunset: usize) -> f64 {
    let h = hour % HOURS_PER_DAY;
    if h < sunrise || h >= sunset || sunrise >= sunset {
        return 0.0;
    }
    let x = (h - sunrise) as f64 / (sunset - sunrise) as f64;
    (PI * x).sin()
}

impl SyntheticProfile {
    /// Time-of-use price at `hour`.
    pub fn price_at(&self, hour: usize) -> f64 {
        match hour % HOURS_PER_DAY {
            17..=20 => self.price_peak,
            0..=6 | 22..=23 => self.price_off_peak,
            _ => self.price_shoulder,
        }
    }

    /// Generates `hours` aligned samples starting at midnight.
    pub fn generate(&self, hours: usize, seed: u64) -> Result<EnvironmentSeries, DataError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut demand = Vec::with_capacity(hours);
        let mut irradiance = Vec::with_capacity(hours);
        let mut wind = Vec::with_capacity(hours);
        let mut price = Vec::with_capacity(hours);

        let mut cloud = 1.0;
        let mut wind_speed = self.wind_mean_kmh;

        for t in 0..hours {
            let day_pos = (t % HOURS_PER_DAY) as f64 / HOURS_PER_DAY as f64;
            let angle = 2.0 * PI * day_pos + self.demand_phase_rad;
            let d = self.demand_base
                + self.demand_amplitude * angle.sin()
                + gaussian_noise(&mut rng, self.demand_noise_std);
            demand.push(d.max(0.0));

            // The cloud state evolves every hour, night included.
            let eps = gaussian_noise(&mut rng, self.cloud_noise_std);
            cloud = (self.cloud_alpha * cloud + (1.0 - self.cloud_alpha) * (1.0 + eps))
                .clamp(CLOUD_MIN, CLOUD_MAX);
            let frac = daylight_fraction(t, self.sunrise_hour, self.sunset_hour);
            irradiance.push(self.peak_irradiance * frac * cloud);

            let eps = gaussian_noise(&mut rng, self.wind_noise_std);
            wind_speed = (self.wind_mean_kmh
                + self.wind_alpha * (wind_speed - self.wind_mean_kmh)
                + eps)
                .max(0.0);
            wind.push(wind_speed);

            price.push(self.price_at(t));
        }

        EnvironmentSeries::new(demand, irradiance, wind, price)
    }
}
