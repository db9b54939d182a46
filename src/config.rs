//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::EnvironmentSeries;
use crate::data::load::{CsvSource, DEFAULT_DEMAND_COLUMN, InsufficientHouseholds};
use crate::data::synthetic::SyntheticProfile;
use crate::error::{ConfigError, DataError};
use crate::sim::cost::{PricingMode, Settlement};
use crate::sim::params::{
    BatteryParams, CostParams, GeneratorParams, ParameterSet, SolarParams, TurbineDesign,
    WindParams,
};
use crate::sim::policy::ActionEncoding;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Episode, policy, and settlement options.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Wind turbine power curve.
    #[serde(default)]
    pub wind: WindConfig,
    /// Rotor design from which the rated turbine power is derived.
    #[serde(default)]
    pub turbine: TurbineDesign,
    #[serde(default)]
    pub solar: SolarConfig,
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Unit costs, prices, and penalties.
    #[serde(default)]
    pub economics: EconomicsConfig,
    /// Where the environment series comes from.
    #[serde(default)]
    pub data: DataConfig,
}

/// Built-in decision policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Idle,
    #[default]
    Greedy,
    Random,
}

/// Episode, policy, and settlement options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Episode length in hours; defaults to the whole series.
    pub steps: Option<usize>,
    /// Master random seed.
    pub seed: u64,
    pub policy: PolicyKind,
    /// Encoding emitted by the greedy policy. The random policy is always discrete.
    pub action_encoding: ActionEncoding,
    pub pricing: PricingMode,
    /// Charge the feasibility penalty; defaults to on for discrete actions only.
    pub feasibility_check: Option<bool>,
    /// Initial state of charge (energy units); defaults to `soc_min`.
    pub initial_soc: Option<f64>,
    /// Step duration in hours.
    pub dt_hours: f64,
    /// Number of levels of a discrete action.
    pub discrete_steps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: None,
            seed: 42,
            policy: PolicyKind::Greedy,
            action_encoding: ActionEncoding::Energy,
            pricing: PricingMode::Linear,
            feasibility_check: None,
            initial_soc: None,
            dt_hours: 1.0,
            discrete_steps: 3,
        }
    }
}

/// Wind turbine power curve.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindConfig {
    pub cut_in_kmh: f64,
    pub rated_kmh: f64,
    pub cut_off_kmh: f64,
    pub turbines: u32,
    /// Overrides the rated power derived from `[turbine]`.
    pub rated_power: Option<f64>,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            cut_in_kmh: 3.0 * 3.6,
            rated_kmh: 7.0 * 3.6,
            cut_off_kmh: 11.0 * 3.6,
            turbines: 1,
            rated_power: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    pub area: f64,
    /// Conversion efficiency (0.0–1.0).
    pub efficiency: f64,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            area: 1400.0,
            efficiency: 0.2,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    pub capacity: f64,
    /// Lower SOC bound as a fraction of capacity.
    pub soc_min: f64,
    /// Upper SOC bound as a fraction of capacity.
    pub soc_max: f64,
    /// Charge and discharge efficiency (0.0–1.0).
    pub efficiency: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity: 300.0,
            soc_min: 0.05,
            soc_max: 0.95,
            efficiency: 0.95,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub count: u32,
    /// Output per generator and hour.
    pub rated_output: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 1,
            rated_output: 600.0,
        }
    }
}

/// Unit costs, prices, and penalties.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicsConfig {
    pub unit_cost_solar: f64,
    pub unit_cost_wind: f64,
    pub unit_cost_generator: f64,
    pub unit_cost_battery: f64,
    pub sell_back_price: f64,
    pub blackout_cost: f64,
    pub feasibility_cost: f64,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            unit_cost_solar: 0.15,
            unit_cost_wind: 0.085,
            unit_cost_generator: 0.55,
            unit_cost_battery: 0.95,
            sell_back_price: 0.2,
            blackout_cost: 300.0,
            feasibility_cost: 100.0,
        }
    }
}

/// Origin of the environment series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    #[default]
    Synthetic,
    Csv,
}

/// Where the environment series comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub source: DataSourceKind,
    /// Environment CSV (`solar_irradiance`, `wind_speed`, `rate_consumption_charge`).
    pub environment_csv: Option<PathBuf>,
    /// Directory of household load profiles.
    pub households_dir: Option<PathBuf>,
    /// Households are the files named `USA_<region>*`.
    pub region: String,
    /// Number of households to aggregate.
    pub households: usize,
    pub demand_column: String,
    /// Wind speed in the environment CSV is in m/s.
    pub wind_in_m_per_s: bool,
    pub on_insufficient_households: InsufficientHouseholds,
    /// Length of a synthetic series when `simulation.steps` is unset.
    pub synthetic_hours: usize,
    pub synthetic: SyntheticProfile,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: DataSourceKind::Synthetic,
            environment_csv: None,
            households_dir: None,
            region: "CA".to_string(),
            households: 10,
            demand_column: DEFAULT_DEMAND_COLUMN.to_string(),
            wind_in_m_per_s: true,
            on_insufficient_households: InsufficientHouseholds::Warn,
            synthetic_hours: 168,
            synthetic: SyntheticProfile::default(),
        }
    }
}

impl DataConfig {
    /// File-name prefix selecting the region's households.
    pub fn household_prefix(&self) -> String {
        format!("USA_{}", self.region)
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: reference parameters, greedy policy,
    /// one synthetic week.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the convex-pricing preset: purchases get dearer with volume.
    pub fn convex_pricing() -> Self {
        Self {
            simulation: SimulationConfig {
                pricing: PricingMode::Convex,
                ..SimulationConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the discrete-agent preset: random discrete actions with the
    /// feasibility penalty active.
    pub fn discrete_agent() -> Self {
        Self {
            simulation: SimulationConfig {
                policy: PolicyKind::Random,
                action_encoding: ActionEncoding::Discrete,
                steps: Some(48),
                ..SimulationConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "convex_pricing", "discrete_agent"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "convex_pricing" => Ok(Self::convex_pricing()),
            "discrete_agent" => Ok(Self::discrete_agent()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// Relative data paths are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            cfg.data.resolve_relative_to(base);
        }
        Ok(cfg)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Encoding the configured policy actually emits.
    pub fn action_encoding(&self) -> ActionEncoding {
        match self.simulation.policy {
            PolicyKind::Random => ActionEncoding::Discrete,
            _ => self.simulation.action_encoding,
        }
    }

    /// Builds the immutable parameter set.
    pub fn parameters(&self) -> ParameterSet {
        let w = &self.wind;
        let b = &self.battery;
        let e = &self.economics;
        ParameterSet {
            wind: WindParams {
                cut_in_kmh: w.cut_in_kmh,
                rated_kmh: w.rated_kmh,
                cut_off_kmh: w.cut_off_kmh,
                turbines: w.turbines,
                rated_power: w.rated_power.unwrap_or_else(|| self.turbine.rated_power()),
            },
            solar: SolarParams {
                area: self.solar.area,
                efficiency: self.solar.efficiency,
            },
            generator: GeneratorParams {
                count: self.generator.count,
                rated_output: self.generator.rated_output,
            },
            battery: BatteryParams {
                capacity: b.capacity,
                soc_min: b.soc_min * b.capacity,
                soc_max: b.soc_max * b.capacity,
                efficiency: b.efficiency,
            },
            costs: CostParams {
                solar: e.unit_cost_solar,
                wind: e.unit_cost_wind,
                generator: e.unit_cost_generator,
                battery: e.unit_cost_battery,
                sell_back_price: e.sell_back_price,
                blackout: e.blackout_cost,
                feasibility: e.feasibility_cost,
            },
            dt_hours: self.simulation.dt_hours,
            discrete_steps: self.simulation.discrete_steps,
        }
    }

    /// Settlement options, resolving the feasibility default.
    pub fn settlement(&self) -> Settlement {
        let discrete = self.action_encoding() == ActionEncoding::Discrete;
        Settlement {
            pricing: self.simulation.pricing,
            feasibility_check: self.simulation.feasibility_check.unwrap_or(discrete),
        }
    }

    /// Loads or generates the environment series.
    ///
    /// # Errors
    ///
    /// Any [`DataError`] from ingestion; a CSV source without paths yields
    /// [`DataError::MissingPath`] naming the first missing field.
    pub fn load_series(&self) -> Result<EnvironmentSeries, DataError> {
        let d = &self.data;
        match d.source {
            DataSourceKind::Synthetic => {
                let hours = self.simulation.steps.unwrap_or(d.synthetic_hours);
                d.synthetic.generate(hours, self.simulation.seed)
            }
            DataSourceKind::Csv => {
                let environment = d.environment_csv.clone().ok_or(DataError::MissingPath {
                    field: "data.environment_csv",
                })?;
                let households_dir = d.households_dir.clone().ok_or(DataError::MissingPath {
                    field: "data.households_dir",
                })?;
                CsvSource {
                    environment,
                    households_dir,
                    household_prefix: d.household_prefix(),
                    households: d.households,
                    demand_column: d.demand_column.clone(),
                    wind_in_m_per_s: d.wind_in_m_per_s,
                    on_insufficient: d.on_insufficient_households,
                }
                .load()
            }
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.parameters().validate();
        let s = &self.simulation;

        if s.steps == Some(0) {
            errors.push(ConfigError::new("simulation.steps", "must be > 0"));
        }
        if s.initial_soc.is_some_and(|soc| !(soc.is_finite() && soc >= 0.0)) {
            errors.push(ConfigError::new("simulation.initial_soc", "must be finite and >= 0"));
        }
        if !(0.0..=1.0).contains(&self.battery.soc_min)
            || !(0.0..=1.0).contains(&self.battery.soc_max)
        {
            errors.push(ConfigError::new(
                "battery.soc_min",
                "bounds are fractions of capacity in [0.0, 1.0]",
            ));
        }
        if self.turbine.rated_power() <= 0.0 && self.wind.rated_power.is_none() {
            errors.push(ConfigError::new("turbine", "derived rated power must be > 0"));
        }

        let d = &self.data;
        match d.source {
            DataSourceKind::Csv => {
                if d.environment_csv.is_none() {
                    errors.push(ConfigError::new("data.environment_csv", "required for csv data"));
                }
                if d.households_dir.is_none() {
                    errors.push(ConfigError::new("data.households_dir", "required for csv data"));
                }
                if d.households == 0 {
                    errors.push(ConfigError::new("data.households", "must be > 0"));
                }
            }
            DataSourceKind::Synthetic => {
                let p = &d.synthetic;
                if s.steps.is_none() && d.synthetic_hours == 0 {
                    errors.push(ConfigError::new("data.synthetic_hours", "must be > 0"));
                }
                if !(p.sunrise_hour < p.sunset_hour && p.sunset_hour <= 24) {
                    errors.push(ConfigError::new(
                        "data.synthetic.sunrise_hour",
                        "must be < data.synthetic.sunset_hour <= 24",
                    ));
                }
                for (field, value) in [
                    ("data.synthetic.cloud_alpha", p.cloud_alpha),
                    ("data.synthetic.wind_alpha", p.wind_alpha),
                ] {
                    if !(0.0..=1.0).contains(&value) {
                        errors.push(ConfigError::new(field, "must be in [0.0, 1.0]"));
                    }
                }
            }
        }

        errors
    }
}

impl DataConfig {
    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [&mut self.environment_csv, &mut self.households_dir]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn every_preset_is_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).unwrap();
            assert!(cfg.validate().is_empty(), "{name} should be valid");
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent").unwrap_err();
        assert!(err.message.contains("unknown preset"));
        assert_eq!(err.field, "preset");
    }

    #[test]
    fn baseline_parameters_match_reference_set() {
        let p = ScenarioConfig::baseline().parameters();
        let reference = ParameterSet::default();
        assert_relative_eq!(p.wind.rated_power, reference.wind.rated_power);
        assert_relative_eq!(p.battery.soc_min, reference.battery.soc_min);
        assert_relative_eq!(p.battery.soc_max, reference.battery.soc_max);
        assert_eq!(p.wind.cut_off_kmh, reference.wind.cut_off_kmh);
        assert_eq!(p.costs.generator, reference.costs.generator);
        assert_eq!(p.discrete_steps, reference.discrete_steps);
    }

    #[test]
    fn feasibility_check_follows_encoding_by_default() {
        assert!(!ScenarioConfig::baseline().settlement().feasibility_check);
        assert!(ScenarioConfig::discrete_agent().settlement().feasibility_check);

        let mut cfg = ScenarioConfig::discrete_agent();
        cfg.simulation.feasibility_check = Some(false);
        assert!(!cfg.settlement().feasibility_check);
    }

    #[test]
    fn random_policy_is_always_discrete() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.policy = PolicyKind::Random;
        assert_eq!(cfg.action_encoding(), ActionEncoding::Discrete);
    }

    #[test]
    fn convex_preset_prices_convexly() {
        assert_eq!(
            ScenarioConfig::convex_pricing().settlement().pricing,
            PricingMode::Convex
        );
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
steps = 48
seed = 99
policy = "random"
pricing = "convex"
feasibility_check = false
initial_soc = 100.0

[wind]
turbines = 3

[turbine]
blade_radius_km = 0.05

[battery]
capacity = 500.0
soc_min = 0.1

[economics]
blackout_cost = 1000.0

[data]
source = "synthetic"

[data.synthetic]
peak_irradiance = 700.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.simulation.steps, Some(48));
        assert_eq!(cfg.simulation.policy, PolicyKind::Random);
        assert_eq!(cfg.simulation.pricing, PricingMode::Convex);
        assert_eq!(cfg.wind.turbines, 3);
        assert_eq!(cfg.data.synthetic.peak_irradiance, 700.0);
        let p = cfg.parameters();
        assert_relative_eq!(p.battery.soc_min, 50.0);
        assert_relative_eq!(
            p.wind.rated_power,
            4.0 * TurbineDesign::default().rated_power(),
            epsilon = 1e-12
        );
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
steps = 24
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(ScenarioConfig::from_toml_str("[feeder]\nmax_import_kw = 1.0\n").is_err());
    }

    #[test]
    fn validation_catches_zero_steps() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.steps = Some(0);
        assert!(cfg.validate().iter().any(|e| e.field == "simulation.steps"));
    }

    #[test]
    fn validation_catches_inverted_battery_bounds() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.soc_min = 0.9;
        cfg.battery.soc_max = 0.2;
        assert!(cfg.validate().iter().any(|e| e.field == "battery.soc_max"));
    }

    #[test]
    fn validation_requires_csv_paths() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.data.source = DataSourceKind::Csv;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "data.environment_csv"));
        assert!(errors.iter().any(|e| e.field == "data.households_dir"));
    }

    #[test]
    fn loading_csv_without_paths_names_the_missing_field() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.data.source = DataSourceKind::Csv;
        let err = cfg.load_series().unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingPath {
                field: "data.environment_csv"
            }
        ));

        cfg.data.environment_csv = Some(PathBuf::from("environment.csv"));
        let err = cfg.load_series().unwrap_err();
        assert!(err.to_string().contains("data.households_dir"));
    }

    #[test]
    fn validation_catches_bad_daylight_window() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.data.synthetic.sunrise_hour = 20;
        assert!(
            cfg.validate()
                .iter()
                .any(|e| e.field == "data.synthetic.sunrise_hour")
        );
    }

    #[test]
    fn synthetic_series_length_follows_steps() {
        let mut cfg = ScenarioConfig::baseline();
        assert_eq!(cfg.load_series().unwrap().len(), 168);
        cfg.simulation.steps = Some(30);
        assert_eq!(cfg.load_series().unwrap().len(), 30);
    }

    #[test]
    fn household_prefix_uses_region() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.data.region = "NY".to_string();
        assert_eq!(cfg.data.household_prefix(), "USA_NY");
    }
}
