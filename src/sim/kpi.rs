//! Post-hoc episode report computed from step results.

use std::fmt;

use serde::Serialize;

use super::cost::CostBreakdown;
use super::types::{PerSource, StepResult};

/// Aggregate indicators of a complete episode.
///
/// Computed post-hoc from `Vec<StepResult>` to ensure consistency between
/// step data and reported figures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EpisodeReport {
    pub steps: usize,
    /// Sum of per-step total cost.
    pub total_cost: f64,
    pub mean_cost: f64,
    /// Every cost term summed over the episode.
    pub costs: CostBreakdown,
    pub blackout_steps: usize,
    pub infeasible_steps: usize,
    pub demand: f64,
    pub delivered: f64,
    pub purchased_load: f64,
    pub purchased_battery: f64,
    pub sold: f64,
    pub generated: PerSource<f64>,
    /// Energy charged from generation plus energy discharged to the load.
    pub battery_throughput: f64,
    /// Throughput over twice the battery capacity.
    pub battery_equivalent_full_cycles: f64,
    pub final_soc: f64,
}

impl EpisodeReport {
    /// Aggregates an episode.
    ///
    /// # Arguments
    ///
    /// * `results` - Complete episode step results
    /// * `battery_capacity` - Battery capacity for the cycle count
    pub fn from_results(results: &[StepResult], battery_capacity: f64) -> Self {
        let Some(last) = results.last() else {
            return Self::default();
        };

        let mut report = Self {
            steps: results.len(),
            final_soc: last.soc,
            ..Self::default()
        };

        for r in results {
            let c = &r.cost;
            report.total_cost += c.total();
            report.costs.purchase += c.purchase;
            report.costs.operational += c.operational;
            report.costs.blackout += c.blackout;
            report.costs.feasibility += c.feasibility;
            report.costs.sell_back += c.sell_back;

            report.blackout_steps += usize::from(r.blackout);
            report.infeasible_steps += usize::from(r.infeasible);

            report.demand += r.sample.energy_demand;
            report.delivered += r.delivered;
            report.purchased_load += r.purchased_load;
            report.purchased_battery += r.purchased_battery;
            report.sold += r.sold();
            report.generated.solar += r.generated.solar;
            report.generated.wind += r.generated.wind;
            report.generated.generator += r.generated.generator;
            report.battery_throughput += r.charged() + r.discharged;
        }

        report.mean_cost = report.total_cost / results.len() as f64;
        report.battery_equivalent_full_cycles = if battery_capacity > 0.0 {
            report.battery_throughput / (2.0 * battery_capacity)
        } else {
            0.0
        };
        report
    }
}

impl fmt::Display for EpisodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Episode Report ---")?;
        writeln!(f, "Steps:                 {}", self.steps)?;
        writeln!(
            f,
            "Total cost:            {:.3} (mean {:.3} per step)",
            self.total_cost, self.mean_cost
        )?;
        writeln!(
            f,
            "  purchase {:.3} | operational {:.3} | blackout {:.1} | feasibility {:.1} | sell-back -{:.3}",
            self.costs.purchase,
            self.costs.operational,
            self.costs.blackout,
            self.costs.feasibility,
            self.costs.sell_back
        )?;
        writeln!(
            f,
            "Demand / delivered:    {:.2} / {:.2}",
            self.demand, self.delivered
        )?;
        writeln!(
            f,
            "Generated:             solar {:.2} | wind {:.2} | generator {:.2}",
            self.generated.solar, self.generated.wind, self.generated.generator
        )?;
        writeln!(
            f,
            "Purchased:             load {:.2} | battery {:.2}",
            self.purchased_load, self.purchased_battery
        )?;
        writeln!(f, "Sold back:             {:.2}", self.sold)?;
        writeln!(
            f,
            "Battery throughput:    {:.2} ({:.2} equiv. cycles), final soc {:.2}",
            self.battery_throughput, self.battery_equivalent_full_cycles, self.final_soc
        )?;
        write!(
            f,
            "Blackouts / infeasible: {} / {}",
            self.blackout_steps, self.infeasible_steps
        )
    }
}
