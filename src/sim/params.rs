//! Physical and economic constants of the microgrid.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Wind turbine power curve thresholds and rating.
#[derive(Debug, Clone, Serialize)]
pub struct WindParams {
    /// Cut-in wind speed (km/h).
    pub cut_in_kmh: f64,
    /// Rated wind speed (km/h).
    pub rated_kmh: f64,
    /// Cut-off wind speed (km/h).
    pub cut_off_kmh: f64,
    /// Number of turbines on site.
    pub turbines: u32,
    /// Rated power of one turbine, derived from [`TurbineDesign`].
    pub rated_power: f64,
}

/// Rotor design constants from which the rated turbine power is derived.
///
/// Doubles as the `[turbine]` scenario section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TurbineDesign {
    /// Air density (kg/m³).
    pub air_density: f64,
    /// Blade radius (km).
    pub blade_radius_km: f64,
    /// Average wind speed at the site (km/h).
    pub average_wind_speed_kmh: f64,
    /// Power coefficient of the rotor.
    pub power_coefficient: f64,
    /// Gearbox transmission efficiency.
    pub gearbox_efficiency: f64,
    /// Electrical generator efficiency.
    pub generator_efficiency: f64,
}

/// Converts a cubed km/h speed back to the MW-equivalent power unit.
const KMH_CUBED: f64 = 3.6 * 3.6 * 3.6;

impl TurbineDesign {
    /// Rated power `0.5 · ρ · π · r² · v³ · Cp · η_t · η_g`, corrected for km/h inputs.
    pub fn rated_power(&self) -> f64 {
        let r = self.blade_radius_km;
        let v = self.average_wind_speed_kmh;
        0.5 * self.air_density * PI * r * r * v * v * v
            * self.power_coefficient
            * self.gearbox_efficiency
            * self.generator_efficiency
            / KMH_CUBED
    }
}

impl Default for TurbineDesign {
    fn default() -> Self {
        Self {
            air_density: 1.225,
            blade_radius_km: 25.0 / 1000.0,
            average_wind_speed_kmh: 3.952 * 3.6,
            power_coefficient: 0.593,
            gearbox_efficiency: 0.95,
            generator_efficiency: 0.95,
        }
    }
}

/// Solar PV array constants.
#[derive(Debug, Clone, Serialize)]
pub struct SolarParams {
    /// Panel area.
    pub area: f64,
    /// Conversion efficiency (0–1).
    pub efficiency: f64,
}

/// Diesel generator constants.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorParams {
    /// Number of generators.
    pub count: u32,
    /// Rated output per generator and hour.
    pub rated_output: f64,
}

/// Battery storage constants.
#[derive(Debug, Clone, Serialize)]
pub struct BatteryParams {
    /// Nominal capacity.
    pub capacity: f64,
    /// Lower state-of-charge bound (energy units).
    pub soc_min: f64,
    /// Upper state-of-charge bound (energy units).
    pub soc_max: f64,
    /// Charging and discharging efficiency (0–1).
    pub efficiency: f64,
}

/// Unit costs, prices, and penalties.
#[derive(Debug, Clone, Serialize)]
pub struct CostParams {
    /// Operational cost per unit of solar energy.
    pub solar: f64,
    /// Operational cost per unit of wind energy.
    pub wind: f64,
    /// Operational cost per unit of generator energy.
    pub generator: f64,
    /// Operational cost per battery charge/discharge cycle.
    pub battery: f64,
    /// Fixed price paid for energy sold back to the grid.
    pub sell_back_price: f64,
    /// Penalty when delivered energy falls short of demand.
    pub blackout: f64,
    /// Penalty when a dispatch exceeds a source's generation.
    pub feasibility: f64,
}

/// Immutable parameterization of one microgrid.
///
/// Built once and shared read-only between episodes (wrap in `Arc`).
/// [`ParameterSet::default`] is the reference parameterization.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterSet {
    pub wind: WindParams,
    pub solar: SolarParams,
    pub generator: GeneratorParams,
    pub battery: BatteryParams,
    pub costs: CostParams,
    /// Duration of one step in hours.
    pub dt_hours: f64,
    /// Number of levels in a discretized action (`>= 2`).
    pub discrete_steps: usize,
}

impl ParameterSet {
    /// Checks the invariants every consumer of a parameter set relies on.
    ///
    /// Returns an empty vector if the set is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let w = &self.wind;
        if !(w.cut_in_kmh < w.rated_kmh && w.rated_kmh < w.cut_off_kmh) {
            errors.push(ConfigError::new(
                "wind",
                format!(
                    "must satisfy cut_in < rated < cut_off, got {} / {} / {}",
                    w.cut_in_kmh, w.rated_kmh, w.cut_off_kmh
                ),
            ));
        }
        if w.rated_power < 0.0 || !w.rated_power.is_finite() {
            errors.push(ConfigError::new("wind.rated_power", "must be finite and >= 0"));
        }

        let b = &self.battery;
        if b.capacity <= 0.0 {
            errors.push(ConfigError::new("battery.capacity", "must be > 0"));
        }
        if !(b.soc_min < b.soc_max && b.soc_max <= b.capacity) {
            errors.push(ConfigError::new(
                "battery.soc_max",
                format!(
                    "must satisfy soc_min < soc_max <= capacity, got {} / {} / {}",
                    b.soc_min, b.soc_max, b.capacity
                ),
            ));
        }
        if b.soc_min < 0.0 {
            errors.push(ConfigError::new("battery.soc_min", "must be >= 0"));
        }
        if !(b.efficiency > 0.0 && b.efficiency <= 1.0) {
            errors.push(ConfigError::new("battery.efficiency", "must be in (0, 1]"));
        }

        if !(0.0..=1.0).contains(&self.solar.efficiency) {
            errors.push(ConfigError::new("solar.efficiency", "must be in [0, 1]"));
        }
        if self.solar.area < 0.0 {
            errors.push(ConfigError::new("solar.area", "must be >= 0"));
        }
        if self.generator.rated_output < 0.0 {
            errors.push(ConfigError::new("generator.rated_output", "must be >= 0"));
        }
        if self.dt_hours <= 0.0 {
            errors.push(ConfigError::new("simulation.dt_hours", "must be > 0"));
        }
        if self.discrete_steps < 2 {
            errors.push(ConfigError::new("simulation.discrete_steps", "must be >= 2"));
        }

        let c = &self.costs;
        for (field, value) in [
            ("economics.unit_cost_solar", c.solar),
            ("economics.unit_cost_wind", c.wind),
            ("economics.unit_cost_generator", c.generator),
            ("economics.unit_cost_battery", c.battery),
            ("economics.sell_back_price", c.sell_back_price),
            ("economics.blackout_cost", c.blackout),
            ("economics.feasibility_cost", c.feasibility),
        ] {
            if value < 0.0 {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        errors
    }

    /// Usable battery energy window `soc_max - soc_min`.
    pub fn usable_capacity(&self) -> f64 {
        self.battery.soc_max - self.battery.soc_min
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        let capacity = 300.0;
        Self {
            wind: WindParams {
                cut_in_kmh: 3.0 * 3.6,
                rated_kmh: 7.0 * 3.6,
                cut_off_kmh: 11.0 * 3.6,
                turbines: 1,
                rated_power: TurbineDesign::default().rated_power(),
            },
            solar: SolarParams {
                area: 1400.0,
                efficiency: 0.2,
            },
            generator: GeneratorParams {
                count: 1,
                rated_output: 600.0,
            },
            battery: BatteryParams {
                capacity,
                soc_min: 0.05 * capacity,
                soc_max: 0.95 * capacity,
                efficiency: 0.95,
            },
            costs: CostParams {
                solar: 0.15,
                wind: 0.085,
                generator: 0.55,
                battery: 0.95,
                sell_back_price: 0.2,
                blackout: 300.0,
                feasibility: 100.0,
            },
            dt_hours: 1.0,
            discrete_steps: 3,
        }
    }
}
