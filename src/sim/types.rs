//! Core simulation types: per-source records, environment samples, and step data.

use std::fmt;

use serde::Serialize;

use super::cost::CostBreakdown;

/// A dispatchable energy source of the microgrid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Solar,
    Wind,
    Generator,
}

impl Source {
    /// All sources in canonical order.
    pub const ALL: [Source; 3] = [Source::Solar, Source::Wind, Source::Generator];

    /// Lower-case name used in logs, CSV headers, and error fields.
    pub fn name(self) -> &'static str {
        match self {
            Source::Solar => "solar",
            Source::Wind => "wind",
            Source::Generator => "generator",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per source, with named access.
///
/// Replaces positional `[solar, wind, generator]` lists so that a swapped
/// index can never silently route energy to the wrong source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PerSource<T> {
    pub solar: T,
    pub wind: T,
    pub generator: T,
}

impl<T> PerSource<T> {
    pub fn new(solar: T, wind: T, generator: T) -> Self {
        Self {
            solar,
            wind,
            generator,
        }
    }

    pub fn get(&self, source: Source) -> &T {
        match source {
            Source::Solar => &self.solar,
            Source::Wind => &self.wind,
            Source::Generator => &self.generator,
        }
    }

    pub fn get_mut(&mut self, source: Source) -> &mut T {
        match source {
            Source::Solar => &mut self.solar,
            Source::Wind => &mut self.wind,
            Source::Generator => &mut self.generator,
        }
    }

    /// Builds a record by evaluating `f` for every source.
    pub fn from_fn(mut f: impl FnMut(Source) -> T) -> Self {
        Self {
            solar: f(Source::Solar),
            wind: f(Source::Wind),
            generator: f(Source::Generator),
        }
    }

    /// Maps every entry through `f`.
    pub fn map<U>(&self, mut f: impl FnMut(Source, &T) -> U) -> PerSource<U> {
        PerSource::from_fn(|s| f(s, self.get(s)))
    }

    /// Iterates `(source, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Source, &T)> {
        Source::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

impl<T: Copy + std::iter::Sum<T>> PerSource<T> {
    pub fn total(&self) -> T {
        Source::ALL.into_iter().map(|s| *self.get(s)).sum()
    }
}

/// Working status of each source: `0.0` is off, `1.0` fully on.
///
/// Fractional values appear when actions are discretized.
pub type WorkingStatus = PerSource<f64>;

/// One time step's exogenous inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnvironmentSample {
    /// Energy demand for the period.
    pub energy_demand: f64,
    /// Solar irradiance (W/m²).
    pub solar_irradiance: f64,
    /// Wind speed (km/h).
    pub wind_speed: f64,
    /// Grid energy price for the period.
    pub price: f64,
}

/// Per-source split of energy across its three destinations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DispatchShare {
    /// Energy serving the demand.
    pub load: f64,
    /// Energy routed into the battery.
    pub battery: f64,
    /// Energy sold back to the utility grid.
    pub sell: f64,
}

impl DispatchShare {
    pub fn new(load: f64, battery: f64, sell: f64) -> Self {
        Self {
            load,
            battery,
            sell,
        }
    }

    /// Total energy requested from the source.
    pub fn total(&self) -> f64 {
        self.load + self.battery + self.sell
    }
}

/// Grid purchase flags for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Purchase {
    /// Buy whatever demand remains unserved.
    pub load: bool,
    /// Top the battery off to its upper bound.
    pub battery: bool,
}

/// Complete record of one microgrid transition.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// Step index into the environment series.
    pub timestep: usize,
    /// Exogenous inputs consumed by this step.
    pub sample: EnvironmentSample,
    /// Effective working status after wind gating.
    pub status: WorkingStatus,
    /// Energy generated by each source.
    pub generated: PerSource<f64>,
    /// Resolved dispatch shares actually credited.
    pub dispatch: PerSource<DispatchShare>,
    /// Energy discharged from the battery to the load.
    pub discharged: f64,
    /// Energy bought to cover unserved demand.
    pub purchased_load: f64,
    /// Energy bought to top the battery off.
    pub purchased_battery: f64,
    /// Total energy delivered to the load.
    pub delivered: f64,
    /// Battery state of charge after the step.
    pub soc: f64,
    /// Settlement of the step.
    pub cost: CostBreakdown,
    /// Whether delivered energy fell short of demand.
    pub blackout: bool,
    /// Whether any source was asked for more energy than it generated.
    pub infeasible: bool,
}

impl StepResult {
    /// Energy sold back to the grid across all sources.
    pub fn sold(&self) -> f64 {
        self.dispatch.map(|_, d| d.sell).total()
    }

    /// Energy routed into the battery from generation.
    pub fn charged(&self) -> f64 {
        self.dispatch.map(|_, d| d.battery).total()
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>4} | demand={:>8.2}  delivered={:>8.2} | gen(s={:.2} w={:.2} g={:.2}) \
             dis={:.2} buy(load={:.2} bat={:.2}) | soc={:>7.2} | cost={:>9.3}{}{}",
            self.timestep,
            self.sample.energy_demand,
            self.delivered,
            self.generated.solar,
            self.generated.wind,
            self.generated.generator,
            self.discharged,
            self.purchased_load,
            self.purchased_battery,
            self.soc,
            self.cost.total(),
            if self.blackout { " BLACKOUT" } else { "" },
            if self.infeasible { " INFEASIBLE" } else { "" },
        )
    }
}
