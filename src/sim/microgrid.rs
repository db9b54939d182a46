//! The microgrid state-transition and cost-accounting engine.
//!
//! A [`Microgrid`] owns the battery and the working status of its sources.
//! Each call to [`Microgrid::transition`] consumes one action and one
//! environment sample, settles the energy balance in a fixed order and
//! leaves the step's figures available for cost queries until the next
//! transition.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::action::{Action, ActionBundle};
use super::cost::{self, CostBreakdown, Settlement};
use super::params::ParameterSet;
use super::types::{DispatchShare, EnvironmentSample, PerSource, Source, StepResult, WorkingStatus};
use crate::data::EnvironmentSeries;
use crate::devices::{Battery, Device, DeviceContext, DieselGenerator, SolarPv, WindTurbine};
use crate::error::MicrogridError;

/// Derived figures of the most recent transition.
#[derive(Debug, Clone, Copy, Default)]
struct StepFigures {
    generated: PerSource<f64>,
    /// Dispatch actually credited: shares of inactive sources are zeroed.
    credited: PerSource<DispatchShare>,
    charged: f64,
    purchased_load: f64,
    purchased_battery: f64,
    delivered: f64,
    infeasible: bool,
}

/// An islanded microgrid with solar, wind, a diesel generator, a battery and
/// a grid connection.
#[derive(Debug, Clone)]
pub struct Microgrid {
    params: Arc<ParameterSet>,
    settlement: Settlement,

    solar: SolarPv,
    wind: WindTurbine,
    generator: DieselGenerator,
    battery: Battery,

    initial_status: WorkingStatus,
    initial_soc: f64,

    status: WorkingStatus,
    sample: EnvironmentSample,
    action: ActionBundle,
    figures: StepFigures,
}

impl Microgrid {
    /// Creates a microgrid with every source off and the battery at `soc_min`.
    ///
    /// # Panics
    ///
    /// Panics if the battery or wind parameters violate their invariants;
    /// run [`ParameterSet::validate`] first for a descriptive error.
    pub fn new(params: Arc<ParameterSet>, settlement: Settlement) -> Self {
        let solar = SolarPv::from_params(&params.solar);
        let wind = WindTurbine::new(&params.wind, params.dt_hours);
        let generator = DieselGenerator::new(&params.generator, params.dt_hours);
        let initial_soc = params.battery.soc_min;
        let battery = Battery::new(&params.battery, initial_soc);

        Self {
            params,
            settlement,
            solar,
            wind,
            generator,
            battery,
            initial_status: WorkingStatus::default(),
            initial_soc,
            status: WorkingStatus::default(),
            sample: EnvironmentSample::default(),
            action: ActionBundle::zero(),
            figures: StepFigures::default(),
        }
    }

    /// Sets the state of charge restored by [`Microgrid::reset`] and resets.
    ///
    /// A value outside `[soc_min, soc_max]` is accepted and clamped by the
    /// first transition.
    pub fn with_initial_soc(mut self, soc: f64) -> Self {
        self.initial_soc = soc;
        self.reset();
        self
    }

    /// Sets the working status restored by [`Microgrid::reset`] and resets.
    pub fn with_initial_status(mut self, status: WorkingStatus) -> Self {
        self.initial_status = status;
        self.reset();
        self
    }

    /// Restores the configured initial status and state of charge.
    pub fn reset(&mut self) {
        self.status = self.initial_status;
        self.battery.soc = self.initial_soc;
        self.sample = EnvironmentSample::default();
        self.action = ActionBundle::zero();
        self.figures = StepFigures::default();
        trace!(soc = self.initial_soc, "microgrid reset");
    }

    /// Advances the microgrid by one step.
    ///
    /// The action is validated and the sample fetched before anything is
    /// mutated; on error the state is exactly what it was before the call.
    ///
    /// The requested `discharged` energy counts in full toward delivered
    /// energy even when the battery holds less; only the state of charge is
    /// clamped. Callers that need a physical bound should cap discharge at
    /// [`Battery::deliverable`] themselves.
    pub fn transition(
        &mut self,
        action: &Action,
        data: &EnvironmentSeries,
        step: usize,
    ) -> Result<(), MicrogridError> {
        let steps = self.params.discrete_steps;
        match action {
            Action::Energy(bundle) => bundle.validate()?,
            Action::Discrete(discrete) => discrete.validate(steps)?,
        }
        let sample = data.sample(step)?;

        self.sample = sample;
        self.status = match action {
            Action::Energy(bundle) => bundle.adjusting_status,
            Action::Discrete(discrete) => discrete.working_status(steps),
        };
        self.update_working_status();

        let generated = PerSource::new(
            self.solar_energy(),
            self.wind_energy(),
            self.generator_energy(),
        );

        let deliverable = self.battery.deliverable();
        self.action = match action {
            Action::Energy(bundle) => *bundle,
            Action::Discrete(discrete) => discrete.decode(steps, &generated, deliverable),
        };

        let infeasible = cost::is_infeasible(&self.action.dispatch, &generated);
        let credited = self.action.dispatch.map(|source, share| {
            if *self.status.get(source) > 0.0 {
                *share
            } else {
                DispatchShare::default()
            }
        });

        self.figures = StepFigures {
            generated,
            credited,
            infeasible,
            ..StepFigures::default()
        };
        self.settle_energy();

        trace!(
            step,
            soc = self.battery.soc,
            delivered = self.figures.delivered,
            generated = generated.total(),
            "transition"
        );
        if self.is_blackout() {
            debug!(
                step,
                demand = self.sample.energy_demand,
                delivered = self.figures.delivered,
                "blackout"
            );
        }
        if infeasible {
            debug!(step, "dispatch exceeds generation");
        }

        Ok(())
    }

    /// Applies wind-speed gating to the requested status.
    ///
    /// Solar and generator keep their requested values; wind is forced off
    /// outside `[cut_in, cut_off]`.
    pub fn update_working_status(&mut self) {
        if !self.wind.within_operating_band(self.sample.wind_speed) {
            self.status.wind = 0.0;
        }
    }

    /// Battery and energy balance; the order of operations is load-bearing.
    fn settle_energy(&mut self) {
        let credited = self.figures.credited;
        let discharged = self.action.discharged;
        let demand = self.sample.energy_demand;

        let charged = credited.map(|_, d| d.battery).total();
        self.battery.charge(charged);

        let purchased_battery = if self.action.purchased.battery {
            self.battery.top_off()
        } else {
            0.0
        };

        let mut delivered = credited.map(|_, d| d.load).total() + discharged;
        let mut purchased_load = 0.0;
        if self.action.purchased.load && delivered < demand {
            purchased_load = demand - delivered;
            delivered = demand;
        }

        self.battery.discharge(discharged);
        self.battery.clamp();

        self.figures.charged = charged;
        self.figures.purchased_battery = purchased_battery;
        self.figures.purchased_load = purchased_load;
        self.figures.delivered = delivered;
    }

    fn context(&self, source: Source) -> DeviceContext {
        DeviceContext::new(*self.status.get(source), &self.sample)
    }

    /// Solar energy for the current status and sample.
    pub fn solar_energy(&self) -> f64 {
        self.solar.energy(&self.context(Source::Solar))
    }

    /// Wind energy for the current status and sample.
    pub fn wind_energy(&self) -> f64 {
        self.wind.energy(&self.context(Source::Wind))
    }

    /// Generator energy for the current status.
    pub fn generator_energy(&self) -> f64 {
        self.generator.energy(&self.context(Source::Generator))
    }

    pub fn operational_cost(&self) -> f64 {
        cost::operational_cost(
            &self.params,
            &self.figures.generated,
            &self.figures.credited,
            self.action.discharged,
        )
    }

    pub fn blackout_cost(&self) -> f64 {
        cost::blackout_cost(&self.params, self.figures.delivered, self.sample.energy_demand)
    }

    pub fn feasibility_cost(&self) -> f64 {
        if self.settlement.feasibility_check && self.figures.infeasible {
            self.params.costs.feasibility
        } else {
            0.0
        }
    }

    /// Cost of everything bought from the grid this step, for load and battery.
    pub fn purchase_cost(&self) -> f64 {
        let energy = self.figures.purchased_load + self.figures.purchased_battery;
        self.settlement.pricing.purchase_cost(energy, self.sample.price)
    }

    pub fn sell_back_reward(&self) -> f64 {
        cost::sell_back_reward(&self.params, &self.figures.credited)
    }

    /// Every cost term of the most recent step.
    pub fn cost_breakdown(&self) -> CostBreakdown {
        CostBreakdown {
            purchase: self.purchase_cost(),
            operational: self.operational_cost(),
            blackout: self.blackout_cost(),
            feasibility: self.feasibility_cost(),
            sell_back: self.sell_back_reward(),
        }
    }

    /// Total cost of the most recent step.
    pub fn cost_of_epoch(&self) -> f64 {
        self.cost_breakdown().total()
    }

    pub fn params(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    pub fn settlement(&self) -> Settlement {
        self.settlement
    }

    /// Effective working status after gating.
    pub fn status(&self) -> WorkingStatus {
        self.status
    }

    pub fn soc(&self) -> f64 {
        self.battery.soc
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn sample(&self) -> EnvironmentSample {
        self.sample
    }

    pub fn solar_irradiance(&self) -> f64 {
        self.sample.solar_irradiance
    }

    pub fn wind_speed(&self) -> f64 {
        self.sample.wind_speed
    }

    pub fn price(&self) -> f64 {
        self.sample.price
    }

    pub fn energy_demand(&self) -> f64 {
        self.sample.energy_demand
    }

    /// The resolved action of the most recent step, in energy units.
    pub fn action(&self) -> &ActionBundle {
        &self.action
    }

    /// Energy generated per source in the most recent step.
    pub fn generated(&self) -> PerSource<f64> {
        self.figures.generated
    }

    /// Dispatch shares credited in the most recent step.
    pub fn dispatch(&self) -> PerSource<DispatchShare> {
        self.figures.credited
    }

    pub fn charged(&self) -> f64 {
        self.figures.charged
    }

    pub fn discharged(&self) -> f64 {
        self.action.discharged
    }

    pub fn purchased_for_load(&self) -> f64 {
        self.figures.purchased_load
    }

    pub fn purchased_for_battery(&self) -> f64 {
        self.figures.purchased_battery
    }

    pub fn delivered(&self) -> f64 {
        self.figures.delivered
    }

    pub fn is_blackout(&self) -> bool {
        self.figures.delivered < self.sample.energy_demand
    }

    pub fn is_infeasible(&self) -> bool {
        self.figures.infeasible
    }

    /// Snapshot of the most recent step.
    pub fn step_result(&self, timestep: usize) -> StepResult {
        StepResult {
            timestep,
            sample: self.sample,
            status: self.status,
            generated: self.figures.generated,
            dispatch: self.figures.credited,
            discharged: self.action.discharged,
            purchased_load: self.figures.purchased_load,
            purchased_battery: self.figures.purchased_battery,
            delivered: self.figures.delivered,
            soc: self.battery.soc,
            cost: self.cost_breakdown(),
            blackout: self.is_blackout(),
            infeasible: self.figures.infeasible,
        }
    }

    /// Type labels of the generating devices, per source.
    pub fn device_types(&self) -> PerSource<&'static str> {
        PerSource::new(
            self.solar.device_type(),
            self.wind.device_type(),
            self.generator.device_type(),
        )
    }

    /// Writes the human-readable state dump to stdout.
    pub fn print_microgrid(&self) {
        println!("{self}");
    }
}

impl fmt::Display for Microgrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.status;
        let g = &self.figures.generated;
        let c = self.cost_breakdown();
        writeln!(f, "Microgrid")?;
        writeln!(
            f,
            "  status      solar={:.2} wind={:.2} generator={:.2}",
            s.solar, s.wind, s.generator
        )?;
        writeln!(
            f,
            "  battery     soc={:.3} [{:.1}, {:.1}]",
            self.battery.soc, self.battery.soc_min, self.battery.soc_max
        )?;
        writeln!(
            f,
            "  sample      demand={:.3} irradiance={:.2} wind={:.2} km/h price={:.4}",
            self.sample.energy_demand,
            self.sample.solar_irradiance,
            self.sample.wind_speed,
            self.sample.price
        )?;
        writeln!(
            f,
            "  generated   solar={:.3} wind={:.3} generator={:.3}",
            g.solar, g.wind, g.generator
        )?;
        for (source, d) in self.figures.credited.iter() {
            writeln!(
                f,
                "  {:<11} load={:.3} battery={:.3} sell={:.3}",
                source.name(),
                d.load,
                d.battery,
                d.sell
            )?;
        }
        writeln!(
            f,
            "  energy      discharged={:.3} bought(load)={:.3} bought(battery)={:.3} delivered={:.3}",
            self.action.discharged,
            self.figures.purchased_load,
            self.figures.purchased_battery,
            self.figures.delivered
        )?;
        write!(
            f,
            "  cost        purchase={:.3} operational={:.3} blackout={:.1} feasibility={:.1} \
             sell_back={:.3} total={:.3}",
            c.purchase,
            c.operational,
            c.blackout,
            c.feasibility,
            c.sell_back,
            c.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::{ActionError, DataError};
    use crate::sim::action::{DiscreteAction, DispatchLevels};
    use crate::sim::cost::PricingMode;
    use crate::sim::types::Purchase;

    fn grid(settlement: Settlement) -> Microgrid {
        Microgrid::new(Arc::new(ParameterSet::default()), settlement)
    }

    fn series(demand: f64, irradiance: f64, wind: f64, price: f64) -> EnvironmentSeries {
        EnvironmentSeries::new(vec![demand], vec![irradiance], vec![wind], vec![price]).unwrap()
    }

    fn buy_load() -> ActionBundle {
        ActionBundle {
            purchased: Purchase {
                load: true,
                battery: false,
            },
            ..ActionBundle::zero()
        }
    }

    #[test]
    fn initial_state() {
        let mg = grid(Settlement::default());
        assert_eq!(mg.soc(), 15.0);
        assert_eq!(mg.status(), WorkingStatus::default());
        assert_eq!(mg.cost_of_epoch(), 0.0);
    }

    #[test]
    fn buying_all_demand_from_the_grid() {
        let mut mg = grid(Settlement::default());
        let data = series(34.0, 0.0, 0.0, 0.12);
        mg.transition(&buy_load().into(), &data, 0).unwrap();

        assert_relative_eq!(mg.delivered(), 34.0);
        assert_relative_eq!(mg.purchased_for_load(), 34.0);
        assert_eq!(mg.blackout_cost(), 0.0);
        assert_eq!(mg.operational_cost(), 0.0);
        assert_relative_eq!(mg.cost_of_epoch(), 34.0 * 0.12, epsilon = 1e-12);
        assert_eq!(mg.soc(), 15.0);
    }

    #[test]
    fn wind_in_flat_regime_yields_rated_power() {
        let mut mg = grid(Settlement::default());
        let data = series(0.0, 0.0, 30.0, 0.1);
        let mut action = ActionBundle::zero();
        action.adjusting_status.wind = 1.0;
        mg.transition(&action.into(), &data, 0).unwrap();

        let rated = mg.params().wind.rated_power;
        assert_relative_eq!(mg.generated().wind, rated, epsilon = 1e-15);
        assert_eq!(mg.generated().solar, 0.0);
        assert_eq!(mg.generated().generator, 0.0);
    }

    #[test]
    fn wind_on_the_ramp_yields_half_rated_power() {
        let mut mg = grid(Settlement::default());
        let data = series(0.0, 0.0, 18.0, 0.1);
        let mut action = ActionBundle::zero();
        action.adjusting_status.wind = 1.0;
        mg.transition(&action.into(), &data, 0).unwrap();

        let rated = mg.params().wind.rated_power;
        assert_relative_eq!(mg.wind_energy(), 0.5 * rated, epsilon = 1e-12);
    }

    #[test]
    fn wind_is_gated_outside_operating_band() {
        let mut mg = grid(Settlement::default());
        let mut action = ActionBundle::zero();
        action.adjusting_status = WorkingStatus::new(1.0, 1.0, 1.0);

        mg.transition(&action.into(), &series(0.0, 0.0, 45.0, 0.1), 0).unwrap();
        assert_eq!(mg.status(), WorkingStatus::new(1.0, 0.0, 1.0));

        mg.transition(&action.into(), &series(0.0, 0.0, 5.0, 0.1), 0).unwrap();
        assert_eq!(mg.status().wind, 0.0);

        let cut_off = mg.params().wind.cut_off_kmh;
        mg.transition(&action.into(), &series(0.0, 0.0, cut_off, 0.1), 0).unwrap();
        assert_eq!(mg.status().wind, 1.0);
        assert_eq!(mg.generated().wind, 0.0);
    }

    #[test]
    fn zero_action_blacks_out_positive_demand() {
        let mut mg = grid(Settlement::default());
        mg.transition(&ActionBundle::zero().into(), &series(20.0, 800.0, 30.0, 0.1), 0)
            .unwrap();

        assert_eq!(mg.delivered(), 0.0);
        assert_eq!(mg.blackout_cost(), 300.0);
        assert_eq!(mg.operational_cost(), 0.0);
        assert_eq!(mg.purchase_cost(), 0.0);
        assert!(mg.is_blackout());
    }

    #[test]
    fn zero_action_with_zero_demand_is_free() {
        let mut mg = grid(Settlement::default());
        mg.transition(&ActionBundle::zero().into(), &series(0.0, 0.0, 0.0, 0.1), 0)
            .unwrap();
        assert_eq!(mg.cost_of_epoch(), 0.0);
    }

    #[test]
    fn charge_then_discharge_order() {
        let mut mg = grid(Settlement::default());
        let mut action = ActionBundle::zero();
        action.adjusting_status.generator = 1.0;
        action.dispatch.generator = DispatchShare::new(0.0, 100.0, 0.0);
        action.discharged = 19.0;
        mg.transition(&action.into(), &series(19.0, 0.0, 0.0, 0.1), 0).unwrap();

        // 15 + 100 * 0.95 = 110, then 110 - 19 / 0.95 = 90
        assert_relative_eq!(mg.soc(), 90.0, epsilon = 1e-9);
        assert_relative_eq!(mg.charged(), 100.0);
        assert_relative_eq!(mg.delivered(), 19.0);
        assert!(!mg.is_blackout());
        assert!(!mg.is_infeasible());
    }

    #[test]
    fn battery_top_off_is_recorded_and_not_delivered() {
        let mut mg = grid(Settlement::default());
        let action = ActionBundle {
            purchased: Purchase {
                load: false,
                battery: true,
            },
            ..ActionBundle::zero()
        };
        mg.transition(&action.into(), &series(10.0, 0.0, 0.0, 0.5), 0).unwrap();

        assert_relative_eq!(mg.purchased_for_battery(), 270.0, epsilon = 1e-9);
        assert_relative_eq!(mg.soc(), 285.0, epsilon = 1e-9);
        assert_eq!(mg.delivered(), 0.0);
        assert!(mg.is_blackout());
        assert_relative_eq!(mg.purchase_cost(), 135.0, epsilon = 1e-9);
    }

    #[test]
    fn top_off_when_full_buys_nothing() {
        let mut mg = grid(Settlement::default()).with_initial_soc(285.0);
        let action = ActionBundle {
            purchased: Purchase {
                load: false,
                battery: true,
            },
            ..ActionBundle::zero()
        };
        mg.transition(&action.into(), &series(0.0, 0.0, 0.0, 0.5), 0).unwrap();
        assert_eq!(mg.purchased_for_battery(), 0.0);
    }

    #[test]
    fn soc_stays_within_bounds_for_extreme_actions() {
        let mut mg = grid(Settlement::default());
        let data = series(50.0, 1000.0, 30.0, 0.1);

        let mut flood = ActionBundle::zero();
        flood.adjusting_status = WorkingStatus::new(1.0, 1.0, 1.0);
        flood.dispatch.generator.battery = 10_000.0;
        flood.dispatch.solar.battery = 10_000.0;

        let drain = ActionBundle {
            discharged: 10_000.0,
            ..ActionBundle::zero()
        };

        let top = ActionBundle {
            purchased: Purchase {
                load: true,
                battery: true,
            },
            discharged: 500.0,
            ..ActionBundle::zero()
        };

        for action in [flood, drain, top, flood, ActionBundle::zero(), drain] {
            mg.transition(&action.into(), &data, 0).unwrap();
            assert!(mg.soc() >= 15.0 && mg.soc() <= 285.0, "soc {}", mg.soc());
        }
    }

    #[test]
    fn out_of_range_initial_soc_is_clamped_by_first_transition() {
        let mut mg = grid(Settlement::default()).with_initial_soc(0.0);
        assert_eq!(mg.soc(), 0.0);
        mg.transition(&ActionBundle::zero().into(), &series(0.0, 0.0, 0.0, 0.1), 0)
            .unwrap();
        assert_eq!(mg.soc(), 15.0);
    }

    #[test]
    fn cost_increases_with_price_when_buying() {
        let mut cheap = grid(Settlement::default());
        let mut dear = grid(Settlement::default());
        cheap.transition(&buy_load().into(), &series(34.0, 0.0, 0.0, 0.1), 0).unwrap();
        dear.transition(&buy_load().into(), &series(34.0, 0.0, 0.0, 0.3), 0).unwrap();
        assert!(dear.cost_of_epoch() > cheap.cost_of_epoch());
    }

    #[test]
    fn price_is_irrelevant_without_purchase() {
        let mut action = ActionBundle::zero();
        action.adjusting_status.generator = 1.0;
        action.dispatch.generator = DispatchShare::new(34.0, 0.0, 10.0);

        let mut cheap = grid(Settlement::default());
        let mut dear = grid(Settlement::default());
        cheap.transition(&action.into(), &series(34.0, 0.0, 0.0, 0.1), 0).unwrap();
        dear.transition(&action.into(), &series(34.0, 0.0, 0.0, 9.0), 0).unwrap();
        assert_eq!(dear.cost_of_epoch(), cheap.cost_of_epoch());
    }

    #[test]
    fn convex_pricing_applies_to_total_purchase() {
        let mut mg = grid(Settlement {
            pricing: PricingMode::Convex,
            feasibility_check: false,
        });
        mg.transition(&buy_load().into(), &series(4.0, 0.0, 0.0, 2.0), 0).unwrap();
        assert_relative_eq!(mg.purchase_cost(), 12.0, epsilon = 1e-12);
    }

    fn buy_both() -> ActionBundle {
        ActionBundle {
            purchased: Purchase {
                load: true,
                battery: true,
            },
            ..ActionBundle::zero()
        }
    }

    #[test]
    fn buying_for_load_and_battery_prices_the_sum() {
        let demand = 34.0;
        let price = 0.5;
        let mut mg = grid(Settlement::default());
        mg.transition(&buy_both().into(), &series(demand, 0.0, 0.0, price), 0).unwrap();

        assert_relative_eq!(mg.purchased_for_load(), demand, epsilon = 1e-9);
        assert_relative_eq!(mg.purchased_for_battery(), 270.0, epsilon = 1e-9);
        assert_relative_eq!(mg.delivered(), demand, epsilon = 1e-9);
        assert!(!mg.is_blackout());
        assert_relative_eq!(mg.purchase_cost(), (demand + 270.0) * price, epsilon = 1e-9);
    }

    #[test]
    fn convex_pricing_applies_to_load_and_battery_together() {
        let demand = 34.0;
        let price = 0.5;
        let mut mg = grid(Settlement {
            pricing: PricingMode::Convex,
            feasibility_check: false,
        });
        mg.transition(&buy_both().into(), &series(demand, 0.0, 0.0, price), 0).unwrap();

        let e = demand + 270.0;
        let expected = 0.25 * e * e * price + 0.5 * e * price;
        assert_relative_eq!(mg.purchase_cost(), expected, epsilon = 1e-9);
        // priced on the sum, not per purpose
        let split = PricingMode::Convex.purchase_cost(demand, price)
            + PricingMode::Convex.purchase_cost(270.0, price);
        assert!(mg.purchase_cost() > split);
    }

    #[test]
    fn feasibility_penalty_only_when_enabled() {
        let mut action = ActionBundle::zero();
        action.adjusting_status.generator = 1.0;
        action.dispatch.generator = DispatchShare::new(500.0, 100.0, 100.0);
        let data = series(500.0, 0.0, 0.0, 0.1);

        let mut off = grid(Settlement::default());
        off.transition(&action.into(), &data, 0).unwrap();
        assert!(off.is_infeasible());
        assert_eq!(off.feasibility_cost(), 0.0);

        let mut on = grid(Settlement {
            feasibility_check: true,
            ..Settlement::default()
        });
        on.transition(&action.into(), &data, 0).unwrap();
        assert_eq!(on.feasibility_cost(), 100.0);
    }

    #[test]
    fn inactive_source_shares_are_not_credited() {
        let mut mg = grid(Settlement::default());
        let mut action = ActionBundle::zero();
        action.dispatch.solar = DispatchShare::new(10.0, 10.0, 10.0);
        mg.transition(&action.into(), &series(10.0, 800.0, 0.0, 0.1), 0).unwrap();

        assert_eq!(mg.delivered(), 0.0);
        assert_eq!(mg.charged(), 0.0);
        assert_eq!(mg.sell_back_reward(), 0.0);
        assert!(mg.is_infeasible());
        assert_eq!(mg.soc(), 15.0);
    }

    #[test]
    fn sell_back_reduces_cost() {
        let mut mg = grid(Settlement::default());
        let mut action = ActionBundle::zero();
        action.adjusting_status.solar = 1.0;
        action.dispatch.solar = DispatchShare::new(0.0, 0.0, 100.0);
        // 500 W/m² * 1400 * 0.2 / 1000 = 140
        mg.transition(&action.into(), &series(0.0, 500.0, 0.0, 0.1), 0).unwrap();

        assert_relative_eq!(mg.generated().solar, 140.0, epsilon = 1e-9);
        assert_relative_eq!(mg.sell_back_reward(), 20.0, epsilon = 1e-9);
        assert_relative_eq!(mg.cost_of_epoch(), 140.0 * 0.15 - 20.0, epsilon = 1e-9);
    }

    #[test]
    fn discrete_action_scales_against_generation() {
        let mut mg = grid(Settlement::default()).with_initial_soc(115.0);
        let mut action = DiscreteAction::default();
        action.status.generator = 2;
        action.dispatch.generator = DispatchLevels {
            load: 1,
            battery: 0,
            sell: 0,
        };
        action.discharge = 2;
        mg.transition(&action.into(), &series(395.0, 0.0, 0.0, 0.1), 0).unwrap();

        // 600 * 1/2 to the load, plus (115 - 15) * 0.95 from the battery
        assert_relative_eq!(mg.dispatch().generator.load, 300.0, epsilon = 1e-9);
        assert_relative_eq!(mg.discharged(), 95.0, epsilon = 1e-9);
        assert_relative_eq!(mg.delivered(), 395.0, epsilon = 1e-9);
        assert_relative_eq!(mg.soc(), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn discrete_over_dispatch_is_infeasible() {
        let mut mg = grid(Settlement {
            feasibility_check: true,
            ..Settlement::default()
        });
        let action = DiscreteAction::from_flat(&[0, 0, 2, 0, 0, 0, 0, 0, 0, 2, 1, 0, 0, 0, 0]).unwrap();
        mg.transition(&action.into(), &series(0.0, 0.0, 0.0, 0.1), 0).unwrap();
        assert!(mg.is_infeasible());
        assert_eq!(mg.feasibility_cost(), 100.0);
    }

    #[test]
    fn invalid_action_leaves_state_untouched() {
        let mut mg = grid(Settlement::default());
        let data = series(34.0, 0.0, 0.0, 0.1);
        mg.transition(&buy_load().into(), &data, 0).unwrap();
        let before = mg.step_result(0);

        let mut bad = ActionBundle::zero();
        bad.discharged = -1.0;
        let err = mg.transition(&bad.into(), &data, 0).unwrap_err();
        assert!(matches!(
            err,
            MicrogridError::Action(ActionError::Negative { field: "discharged", .. })
        ));

        let after = mg.step_result(0);
        assert_eq!(after.soc, before.soc);
        assert_eq!(after.delivered, before.delivered);
        assert_eq!(after.cost, before.cost);
    }

    #[test]
    fn out_of_range_step_leaves_state_untouched() {
        let mut mg = grid(Settlement::default());
        let data = series(34.0, 0.0, 0.0, 0.1);
        let mut action = buy_load();
        action.adjusting_status.generator = 1.0;
        mg.transition(&action.into(), &data, 0).unwrap();
        let before = mg.step_result(0);

        let err = mg.transition(&ActionBundle::zero().into(), &data, 1).unwrap_err();
        assert!(matches!(
            err,
            MicrogridError::Data(DataError::StepOutOfRange { step: 1, len: 1 })
        ));

        let after = mg.step_result(0);
        assert_eq!(after.status, before.status);
        assert_eq!(after.soc, before.soc);
        assert_eq!(after.cost, before.cost);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut mg = grid(Settlement::default())
            .with_initial_status(WorkingStatus::new(0.0, 0.0, 1.0))
            .with_initial_soc(100.0);
        let mut action = ActionBundle::zero();
        action.discharged = 50.0;
        mg.transition(&action.into(), &series(50.0, 0.0, 0.0, 0.1), 0).unwrap();
        assert!(mg.soc() < 100.0);

        mg.reset();
        assert_eq!(mg.soc(), 100.0);
        assert_eq!(mg.status(), WorkingStatus::new(0.0, 0.0, 1.0));
        assert_eq!(mg.cost_of_epoch(), 0.0);
    }

    #[test]
    fn transitions_are_reproducible() {
        let data = EnvironmentSeries::new(
            vec![30.0, 60.0, 10.0],
            vec![0.0, 600.0, 300.0],
            vec![12.0, 27.0, 45.0],
            vec![0.1, 0.3, 0.2],
        )
        .unwrap();
        let mut action = buy_load();
        action.adjusting_status = WorkingStatus::new(1.0, 1.0, 0.0);
        action.dispatch.solar = DispatchShare::new(20.0, 5.0, 1.0);
        action.discharged = 4.0;

        let run = || {
            let mut mg = grid(Settlement::default());
            (0..data.len())
                .map(|t| {
                    mg.transition(&action.into(), &data, t).unwrap();
                    (mg.soc().to_bits(), mg.cost_of_epoch().to_bits())
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn unbacked_discharge_still_counts_as_delivered() {
        let mut mg = grid(Settlement::default());
        let action = ActionBundle {
            discharged: 500.0,
            ..ActionBundle::zero()
        };
        mg.transition(&action.into(), &series(500.0, 0.0, 0.0, 0.1), 0).unwrap();
        assert_eq!(mg.delivered(), 500.0);
        assert!(!mg.is_blackout());
        assert_eq!(mg.soc(), 15.0);
    }

    #[test]
    fn device_types_label_each_source() {
        let mg = grid(Settlement::default());
        let types = mg.device_types();
        assert_eq!(types.solar, "SolarPV");
        assert_eq!(types.wind, "WindTurbine");
        assert_eq!(types.generator, "DieselGenerator");
    }

    #[test]
    fn display_lists_every_source() {
        let mg = grid(Settlement::default());
        let dump = mg.to_string();
        for name in ["solar", "wind", "generator", "soc=", "total="] {
            assert!(dump.contains(name), "missing {name}");
        }
    }
}
