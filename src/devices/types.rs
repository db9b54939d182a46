//! Common types and traits for generating devices.

use crate::sim::types::EnvironmentSample;

/// Contextual information passed to devices during energy calculations.
///
/// # Fields
/// * `status` - Effective working status of the device (0.0 = off, 1.0 = fully on)
/// * `solar_irradiance` - Irradiance for the period (W/m²)
/// * `wind_speed` - Wind speed for the period (km/h)
#[derive(Debug, Clone, Copy)]
pub struct DeviceContext {
    pub status: f64,
    pub solar_irradiance: f64,
    pub wind_speed: f64,
}

impl DeviceContext {
    /// Creates a context from a working status and the period's environment sample.
    pub fn new(status: f64, sample: &EnvironmentSample) -> Self {
        Self {
            status,
            solar_irradiance: sample.solar_irradiance,
            wind_speed: sample.wind_speed,
        }
    }

    /// Whether the device is switched on at all.
    pub fn is_active(&self) -> bool {
        self.status > 0.0
    }
}

/// Trait defining a source that generates energy for one period.
///
/// Generation is a pure function of the context: devices hold constants
/// only, so the same context always yields the same energy.
pub trait Device {
    /// Returns the energy generated over one period.
    ///
    /// # Arguments
    ///
    /// * `context` - Working status and exogenous conditions for the period
    ///
    /// # Returns
    ///
    /// Non-negative energy, scaled by the (possibly fractional) status.
    fn energy(&self, context: &DeviceContext) -> f64;

    /// Returns a human-readable type name for the device.
    fn device_type(&self) -> &'static str;
}
