//! Baseline decision policies driving the microgrid without an external agent.

use std::sync::Arc;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::action::{Action, ActionBundle, DiscreteAction, DispatchLevels};
use super::env::Observation;
use super::params::ParameterSet;
use super::types::{DispatchShare, PerSource, Purchase, Source, WorkingStatus};
use crate::devices::{Battery, Device, DeviceContext, DieselGenerator, SolarPv, WindTurbine};

/// Which action encoding a policy emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionEncoding {
    /// Explicit energies ([`ActionBundle`]).
    #[default]
    Energy,
    /// Fractions of generation ([`DiscreteAction`]).
    Discrete,
}

/// A decision-maker that maps each observation to an action.
pub trait Policy {
    /// Chooses the action for the step described by `observation`.
    fn decide(&mut self, observation: &Observation) -> Action;

    /// Short name for logs and reports.
    fn name(&self) -> &'static str;
}

/// Switches everything off and buys the whole demand from the grid.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdlePolicy;

impl Policy for IdlePolicy {
    fn decide(&mut self, _observation: &Observation) -> Action {
        Action::Energy(ActionBundle {
            purchased: Purchase {
                load: true,
                battery: false,
            },
            ..ActionBundle::zero()
        })
    }

    fn name(&self) -> &'static str {
        "idle"
    }
}

/// Merit-order dispatch with one step of lookahead on the observed sample.
///
/// Renewables run whenever they can and serve the load cheapest first.
/// Their surplus charges the battery up to its headroom and the rest is
/// sold. A remaining shortfall is covered by the battery, then by the
/// generator if it undercuts the grid price, then by grid purchase.
#[derive(Debug, Clone)]
pub struct GreedyPolicy {
    params: Arc<ParameterSet>,
    encoding: ActionEncoding,
    solar: SolarPv,
    wind: WindTurbine,
    generator: DieselGenerator,
    battery: Battery,
}

impl GreedyPolicy {
    pub fn new(params: Arc<ParameterSet>, encoding: ActionEncoding) -> Self {
        Self {
            solar: SolarPv::from_params(&params.solar),
            wind: WindTurbine::new(&params.wind, params.dt_hours),
            generator: DieselGenerator::new(&params.generator, params.dt_hours),
            battery: Battery::new(&params.battery, params.battery.soc_min),
            params,
            encoding,
        }
    }

    /// The dispatch plan in energy units, with the generation it assumes.
    pub fn plan(&self, observation: &Observation) -> (ActionBundle, PerSource<f64>) {
        let sample = &observation.sample;
        let battery = self.battery_at(observation.soc);
        let costs = &self.params.costs;

        let mut status = WorkingStatus::new(1.0, 1.0, 0.0);
        if !self.wind.within_operating_band(sample.wind_speed) {
            status.wind = 0.0;
        }
        let mut generated = PerSource::new(
            self.solar.energy(&DeviceContext::new(status.solar, sample)),
            self.wind.energy(&DeviceContext::new(status.wind, sample)),
            0.0,
        );

        let mut dispatch = PerSource::<DispatchShare>::default();
        let mut remaining = sample.energy_demand;
        let mut headroom = battery.headroom();

        let mut renewables = [Source::Solar, Source::Wind];
        renewables.sort_by(|a, b| unit_cost(costs, *a).total_cmp(&unit_cost(costs, *b)));
        for source in renewables {
            let g = *generated.get(source);
            let load = g.min(remaining);
            remaining -= load;
            let surplus = g - load;
            let to_battery = surplus.min(headroom);
            headroom -= to_battery;
            *dispatch.get_mut(source) = DispatchShare::new(load, to_battery, surplus - to_battery);
        }

        let discharged = remaining.min(battery.deliverable());
        remaining -= discharged;

        let full_output = self
            .generator
            .energy(&DeviceContext::new(1.0, sample));
        if remaining > 0.0 && full_output > 0.0 && costs.generator < sample.price {
            status.generator = (remaining / full_output).min(1.0);
            let g = self
                .generator
                .energy(&DeviceContext::new(status.generator, sample));
            generated.generator = g;
            dispatch.generator = DispatchShare::new(g, 0.0, 0.0);
        }

        let bundle = ActionBundle {
            adjusting_status: status,
            dispatch,
            purchased: Purchase {
                load: true,
                battery: false,
            },
            discharged,
        };
        (bundle, generated)
    }

    /// The policy's battery model holding the observed state of charge.
    fn battery_at(&self, soc: f64) -> Battery {
        Battery {
            soc,
            ..self.battery.clone()
        }
    }
}

fn unit_cost(costs: &super::params::CostParams, source: Source) -> f64 {
    match source {
        Source::Solar => costs.solar,
        Source::Wind => costs.wind,
        Source::Generator => costs.generator,
    }
}

impl Policy for GreedyPolicy {
    fn decide(&mut self, observation: &Observation) -> Action {
        let (bundle, generated) = self.plan(observation);
        match self.encoding {
            ActionEncoding::Energy => Action::Energy(bundle),
            ActionEncoding::Discrete => {
                Action::Discrete(DiscreteAction::encode(
                    &bundle,
                    self.params.discrete_steps,
                    &generated,
                    self.battery_at(observation.soc).deliverable(),
                ))
            }
        }
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

/// Uniformly random discrete actions from a seeded generator.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    steps: usize,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(steps: usize, seed: u64) -> Self {
        Self {
            steps: steps.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn level(&mut self) -> usize {
        self.rng.random_range(0..self.steps)
    }

    fn levels(&mut self) -> DispatchLevels {
        DispatchLevels {
            load: self.level(),
            battery: self.level(),
            sell: self.level(),
        }
    }
}

impl Policy for RandomPolicy {
    fn decide(&mut self, _observation: &Observation) -> Action {
        let status = PerSource::new(self.level(), self.level(), self.level());
        let dispatch = PerSource::new(self.levels(), self.levels(), self.levels());
        let purchase = Purchase {
            load: self.rng.random_bool(0.5),
            battery: self.rng.random_bool(0.5),
        };
        Action::Discrete(DiscreteAction {
            status,
            dispatch,
            purchase,
            discharge: self.level(),
        })
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
