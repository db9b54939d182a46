//! Environment time series consumed by the microgrid.
//!
//! A series is either loaded from CSV files ([`load`]) or generated from a
//! seeded stochastic model ([`synthetic`]).

pub mod load;
pub mod synthetic;

use serde::Serialize;

use crate::error::DataError;
use crate::sim::types::EnvironmentSample;

/// Four aligned hourly series: demand, irradiance, wind speed, and price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentSeries {
    energy_demand: Vec<f64>,
    solar_irradiance: Vec<f64>,
    wind_speed: Vec<f64>,
    rate_consumption_charge: Vec<f64>,
}

impl EnvironmentSeries {
    /// Builds a series, rejecting empty input and unequal lengths.
    pub fn new(
        energy_demand: Vec<f64>,
        solar_irradiance: Vec<f64>,
        wind_speed: Vec<f64>,
        rate_consumption_charge: Vec<f64>,
    ) -> Result<Self, DataError> {
        let n = energy_demand.len();
        if solar_irradiance.len() != n
            || wind_speed.len() != n
            || rate_consumption_charge.len() != n
        {
            return Err(DataError::LengthMismatch {
                demand: n,
                irradiance: solar_irradiance.len(),
                wind_speed: wind_speed.len(),
                price: rate_consumption_charge.len(),
            });
        }
        if n == 0 {
            return Err(DataError::Empty);
        }

        Ok(Self {
            energy_demand,
            solar_irradiance,
            wind_speed,
            rate_consumption_charge,
        })
    }

    /// Inputs for one step.
    pub fn sample(&self, step: usize) -> Result<EnvironmentSample, DataError> {
        if step >= self.len() {
            return Err(DataError::StepOutOfRange {
                step,
                len: self.len(),
            });
        }
        Ok(EnvironmentSample {
            energy_demand: self.energy_demand[step],
            solar_irradiance: self.solar_irradiance[step],
            wind_speed: self.wind_speed[step],
            price: self.rate_consumption_charge[step],
        })
    }

    pub fn len(&self) -> usize {
        self.energy_demand.len()
    }

    /// Always `false` for a constructed series.
    pub fn is_empty(&self) -> bool {
        self.energy_demand.is_empty()
    }

    pub fn energy_demand(&self) -> &[f64] {
        &self.energy_demand
    }

    pub fn solar_irradiance(&self) -> &[f64] {
        &self.solar_irradiance
    }

    pub fn wind_speed(&self) -> &[f64] {
        &self.wind_speed
    }

    pub fn rate_consumption_charge(&self) -> &[f64] {
        &self.rate_consumption_charge
    }
}
