//! Economic settlement of one step: purchase, operation, penalties, and sell-back.

use serde::{Deserialize, Serialize};

use super::params::ParameterSet;
use super::types::{DispatchShare, PerSource};

/// How grid purchases are priced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// `E × price`.
    #[default]
    Linear,
    /// `0.25 · E² · price + 0.5 · E · price`: marginal price rises with volume.
    Convex,
}

impl PricingMode {
    /// Cost of buying `energy` at the given grid price.
    pub fn purchase_cost(self, energy: f64, price: f64) -> f64 {
        match self {
            PricingMode::Linear => energy * price,
            PricingMode::Convex => 0.25 * energy * energy * price + 0.5 * energy * price,
        }
    }
}

/// Settlement options fixed at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub pricing: PricingMode,
    /// Charge the feasibility penalty for over-dispatched sources.
    pub feasibility_check: bool,
}

/// Every term of one step's cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub purchase: f64,
    pub operational: f64,
    pub blackout: f64,
    pub feasibility: f64,
    pub sell_back: f64,
}

impl CostBreakdown {
    /// Purchase + blackout + feasibility + operational − sell-back.
    pub fn total(&self) -> f64 {
        self.purchase + self.blackout + self.feasibility + self.operational - self.sell_back
    }
}

/// Operational cost of generation plus the battery cycling proxy.
///
/// The battery term normalizes throughput (`discharged + Σ battery shares`)
/// by the usable capacity: `throughput · Δt · c_b / (2 · capacity · (soc_max − soc_min))`.
pub fn operational_cost(
    params: &ParameterSet,
    generated: &PerSource<f64>,
    dispatch: &PerSource<DispatchShare>,
    discharged: f64,
) -> f64 {
    let c = &params.costs;
    let generation = generated.solar * c.solar
        + generated.wind * c.wind
        + generated.generator * c.generator;

    let throughput = discharged + dispatch.map(|_, d| d.battery).total();
    let cycling = throughput * params.dt_hours * c.battery
        / (2.0 * params.battery.capacity * params.usable_capacity());

    generation + cycling
}

/// Fixed blackout penalty when delivered energy falls short of demand.
pub fn blackout_cost(params: &ParameterSet, delivered: f64, demand: f64) -> f64 {
    if delivered < demand {
        params.costs.blackout
    } else {
        0.0
    }
}

/// Revenue from energy sold back at the fixed sell-back price.
pub fn sell_back_reward(params: &ParameterSet, dispatch: &PerSource<DispatchShare>) -> f64 {
    dispatch.map(|_, d| d.sell).total() * params.costs.sell_back_price
}

/// Relative slack below which an over-dispatch counts as rounding.
const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// Whether any source was asked for more energy than it generated.
pub fn is_infeasible(requested: &PerSource<DispatchShare>, generated: &PerSource<f64>) -> bool {
    requested.iter().any(|(source, share)| {
        let g = *generated.get(source);
        share.total() > g + FEASIBILITY_TOLERANCE * g.max(1.0)
    })
}
