use crate::devices::types::{Device, DeviceContext};
use crate::sim::params::WindParams;

/// A wind farm of identical turbines following a cut-in / rated / cut-off power curve.
///
/// # Power curve
/// - `v < cut_in`: off
/// - `cut_in <= v < rated`: linear ramp from 0 to rated power
/// - `rated <= v < cut_off`: flat at rated power for the whole period
/// - `v >= cut_off`: off (turbine feathered)
#[derive(Debug, Clone)]
pub struct WindTurbine {
    /// Cut-in wind speed (km/h).
    pub cut_in_kmh: f64,

    /// Rated wind speed (km/h).
    pub rated_kmh: f64,

    /// Cut-off wind speed (km/h).
    pub cut_off_kmh: f64,

    /// Number of turbines.
    pub count: u32,

    /// Rated power of one turbine.
    pub rated_power: f64,

    /// Duration of one period in hours.
    dt_hours: f64,
}

impl WindTurbine {
    /// Creates a wind farm from its power-curve parameters.
    ///
    /// # Panics
    ///
    /// Panics unless `cut_in < rated < cut_off`.
    pub fn new(params: &WindParams, dt_hours: f64) -> Self {
        assert!(params.cut_in_kmh < params.rated_kmh && params.rated_kmh < params.cut_off_kmh);
        Self {
            cut_in_kmh: params.cut_in_kmh,
            rated_kmh: params.rated_kmh,
            cut_off_kmh: params.cut_off_kmh,
            count: params.turbines,
            rated_power: params.rated_power,
            dt_hours,
        }
    }

    /// Whether the turbine may run at all at this wind speed.
    ///
    /// Used to gate the requested working status; the band is closed on both
    /// ends, unlike the generation regimes.
    pub fn within_operating_band(&self, wind_speed: f64) -> bool {
        (self.cut_in_kmh..=self.cut_off_kmh).contains(&wind_speed)
    }

    fn farm_rating(&self) -> f64 {
        f64::from(self.count) * self.rated_power
    }
}

impl Device for WindTurbine {
    fn energy(&self, context: &DeviceContext) -> f64 {
        if !context.is_active() {
            return 0.0;
        }
        let v = context.wind_speed;
        if v >= self.cut_in_kmh && v < self.rated_kmh {
            context.status * self.farm_rating() * (v - self.cut_in_kmh)
                / (self.rated_kmh - self.cut_in_kmh)
        } else if v >= self.rated_kmh && v < self.cut_off_kmh {
            context.status * self.farm_rating() * self.dt_hours
        } else {
            0.0
        }
    }

    fn device_type(&self) -> &'static str {
        "WindTurbine"
    }
}
