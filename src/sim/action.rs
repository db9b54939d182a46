//! Actions accepted by the microgrid: explicit energies or discrete fractions.

use serde::Serialize;

use super::types::{DispatchShare, PerSource, Purchase, Source, WorkingStatus};
use crate::error::ActionError;

/// Number of entries in a flat discrete action.
pub const FLAT_ACTION_LEN: usize = 15;

/// One step's decision expressed in energy units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ActionBundle {
    /// Requested working status per source, each in `[0, 1]`.
    pub adjusting_status: WorkingStatus,
    /// Requested split of each source's energy.
    pub dispatch: PerSource<DispatchShare>,
    /// Grid purchase flags.
    pub purchased: Purchase,
    /// Energy drawn from the battery to serve the load.
    pub discharged: f64,
}

impl ActionBundle {
    /// Everything off, nothing dispatched, nothing bought.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Rejects non-finite or negative energies and statuses outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ActionError> {
        for (source, &status) in self.adjusting_status.iter() {
            if !status.is_finite() || !(0.0..=1.0).contains(&status) {
                return Err(ActionError::StatusOutOfRange {
                    field: status_field(source),
                    value: status,
                });
            }
        }
        for (source, share) in self.dispatch.iter() {
            let [load, battery, sell] = dispatch_fields(source);
            for (field, value) in [(load, share.load), (battery, share.battery), (sell, share.sell)] {
                check_energy(field, value)?;
            }
        }
        check_energy("discharged", self.discharged)
    }
}

fn check_energy(field: &'static str, value: f64) -> Result<(), ActionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ActionError::Negative { field, value })
    }
}

fn status_field(source: Source) -> &'static str {
    match source {
        Source::Solar => "adjusting_status.solar",
        Source::Wind => "adjusting_status.wind",
        Source::Generator => "adjusting_status.generator",
    }
}

fn dispatch_fields(source: Source) -> [&'static str; 3] {
    match source {
        Source::Solar => ["dispatch.solar.load", "dispatch.solar.battery", "dispatch.solar.sell"],
        Source::Wind => ["dispatch.wind.load", "dispatch.wind.battery", "dispatch.wind.sell"],
        Source::Generator => [
            "dispatch.generator.load",
            "dispatch.generator.battery",
            "dispatch.generator.sell",
        ],
    }
}

/// Discrete dispatch levels of one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchLevels {
    pub load: usize,
    pub battery: usize,
    pub sell: usize,
}

/// One step's decision as levels in `{0, …, steps − 1}`.
///
/// A level `l` stands for the fraction `l / (steps − 1)`. Dispatch fractions
/// apply to the source's generation for the step, the discharge fraction to
/// the battery's deliverable energy at the start of the step. The three
/// dispatch fractions of a source are independent, so their sum may exceed
/// the generation; that is what the feasibility penalty prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiscreteAction {
    pub status: PerSource<usize>,
    pub dispatch: PerSource<DispatchLevels>,
    pub purchase: Purchase,
    pub discharge: usize,
}

impl DiscreteAction {
    /// Checks every level against the action resolution.
    pub fn validate(&self, steps: usize) -> Result<(), ActionError> {
        let check = |field: &'static str, level: usize| {
            if level < steps {
                Ok(())
            } else {
                Err(ActionError::LevelOutOfRange { field, level, steps })
            }
        };
        for (source, &level) in self.status.iter() {
            check(status_field(source), level)?;
        }
        for (source, levels) in self.dispatch.iter() {
            let [load, battery, sell] = dispatch_fields(source);
            check(load, levels.load)?;
            check(battery, levels.battery)?;
            check(sell, levels.sell)?;
        }
        check("discharged", self.discharge)
    }

    /// Parses the flat agent encoding: 3 status, 9 dispatch (per source
    /// load/battery/sell), 2 purchase flags (non-zero means set), 1 discharge.
    pub fn from_flat(flat: &[usize]) -> Result<Self, ActionError> {
        if flat.len() != FLAT_ACTION_LEN {
            return Err(ActionError::FlatLength {
                expected: FLAT_ACTION_LEN,
                found: flat.len(),
            });
        }
        let levels = |offset: usize| DispatchLevels {
            load: flat[offset],
            battery: flat[offset + 1],
            sell: flat[offset + 2],
        };
        Ok(Self {
            status: PerSource::new(flat[0], flat[1], flat[2]),
            dispatch: PerSource::new(levels(3), levels(6), levels(9)),
            purchase: Purchase {
                load: flat[12] != 0,
                battery: flat[13] != 0,
            },
            discharge: flat[14],
        })
    }

    pub fn to_flat(&self) -> [usize; FLAT_ACTION_LEN] {
        let d = &self.dispatch;
        [
            self.status.solar,
            self.status.wind,
            self.status.generator,
            d.solar.load,
            d.solar.battery,
            d.solar.sell,
            d.wind.load,
            d.wind.battery,
            d.wind.sell,
            d.generator.load,
            d.generator.battery,
            d.generator.sell,
            usize::from(self.purchase.load),
            usize::from(self.purchase.battery),
            self.discharge,
        ]
    }

    /// Requested working status as fractions.
    pub fn working_status(&self, steps: usize) -> WorkingStatus {
        self.status.map(|_, &level| fraction(level, steps))
    }

    /// Resolves the levels into energies against this step's generation and
    /// the battery's deliverable energy.
    pub fn decode(
        &self,
        steps: usize,
        generated: &PerSource<f64>,
        deliverable: f64,
    ) -> ActionBundle {
        ActionBundle {
            adjusting_status: self.working_status(steps),
            dispatch: self.dispatch.map(|source, levels| {
                let g = *generated.get(source);
                DispatchShare::new(
                    fraction(levels.load, steps) * g,
                    fraction(levels.battery, steps) * g,
                    fraction(levels.sell, steps) * g,
                )
            }),
            purchased: self.purchase,
            discharged: fraction(self.discharge, steps) * deliverable,
        }
    }

    /// Nearest discrete action to an energy bundle, for the same references
    /// [`DiscreteAction::decode`] scales against.
    pub fn encode(
        bundle: &ActionBundle,
        steps: usize,
        generated: &PerSource<f64>,
        deliverable: f64,
    ) -> Self {
        Self {
            status: bundle.adjusting_status.map(|_, &s| level(s, 1.0, steps)),
            dispatch: bundle.dispatch.map(|source, share| {
                let g = *generated.get(source);
                DispatchLevels {
                    load: level(share.load, g, steps),
                    battery: level(share.battery, g, steps),
                    sell: level(share.sell, g, steps),
                }
            }),
            purchase: bundle.purchased,
            discharge: level(bundle.discharged, deliverable, steps),
        }
    }
}

fn fraction(level: usize, steps: usize) -> f64 {
    level as f64 / (steps - 1) as f64
}

fn level(value: f64, reference: f64, steps: usize) -> usize {
    if reference <= 0.0 {
        return 0;
    }
    let top = (steps - 1) as f64;
    (value / reference * top).round().clamp(0.0, top) as usize
}

/// An action in either accepted encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Energy(ActionBundle),
    Discrete(DiscreteAction),
}

impl From<ActionBundle> for Action {
    fn from(bundle: ActionBundle) -> Self {
        Action::Energy(bundle)
    }
}

impl From<DiscreteAction> for Action {
    fn from(action: DiscreteAction) -> Self {
        Action::Discrete(action)
    }
}
