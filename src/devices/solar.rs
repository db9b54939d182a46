use crate::devices::types::{Device, DeviceContext};
use crate::sim::params::SolarParams;

/// A solar PV array converting irradiance into energy.
///
/// Output is linear in irradiance, panel area, and conversion efficiency,
/// and scaled by the working status.
#[derive(Debug, Clone)]
pub struct SolarPv {
    /// Panel area.
    pub area: f64,

    /// Conversion efficiency (0.0 to 1.0).
    pub efficiency: f64,
}

impl SolarPv {
    /// Creates a new solar PV array.
    ///
    /// # Arguments
    ///
    /// * `area` - Panel area
    /// * `efficiency` - Conversion efficiency (0.0 to 1.0)
    ///
    /// # Panics
    ///
    /// Panics if the area is negative or the efficiency is outside `[0, 1]`.
    pub fn new(area: f64, efficiency: f64) -> Self {
        assert!(area >= 0.0);
        assert!((0.0..=1.0).contains(&efficiency));
        Self { area, efficiency }
    }

    pub fn from_params(params: &SolarParams) -> Self {
        Self::new(params.area, params.efficiency)
    }
}

impl Device for SolarPv {
    /// `status × irradiance × area × efficiency / 1000`, or 0 when switched off.
    fn energy(&self, context: &DeviceContext) -> f64 {
        if !context.is_active() {
            return 0.0;
        }
        context.status * context.solar_irradiance * self.area * self.efficiency / 1000.0
    }

    fn device_type(&self) -> &'static str {
        "SolarPV"
    }
}
