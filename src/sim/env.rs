//! Step/reset adapter exposing the microgrid as a sequential decision environment.

use serde::Serialize;

use super::action::{Action, DiscreteAction};
use super::cost::CostBreakdown;
use super::microgrid::Microgrid;
use super::types::{EnvironmentSample, StepResult, WorkingStatus};
use crate::data::EnvironmentSeries;
use crate::error::{ConfigError, MicrogridError};

/// Length of [`Observation::to_vec`].
pub const OBSERVATION_LEN: usize = 8;

/// What a policy sees before deciding: the microgrid's state and the
/// environment of the step about to be played.
///
/// Once the episode is done the sample is that of the last played step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    /// Index of the step about to be played.
    pub step: usize,
    pub status: WorkingStatus,
    pub soc: f64,
    pub sample: EnvironmentSample,
}

impl Observation {
    /// `[status_solar, status_wind, status_generator, soc, irradiance,
    /// wind_speed, price, demand]`.
    pub fn to_vec(&self) -> [f64; OBSERVATION_LEN] {
        [
            self.status.solar,
            self.status.wind,
            self.status.generator,
            self.soc,
            self.sample.solar_irradiance,
            self.sample.wind_speed,
            self.sample.price,
            self.sample.energy_demand,
        ]
    }
}

/// Outcome of one [`MicrogridEnv::step`].
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub observation: Observation,
    /// Negative total cost.
    pub reward: f64,
    pub cost: CostBreakdown,
    pub done: bool,
    pub record: StepResult,
}

/// A microgrid bound to an environment series for episodes of fixed length.
#[derive(Debug, Clone)]
pub struct MicrogridEnv {
    microgrid: Microgrid,
    data: EnvironmentSeries,
    episode_len: usize,
    t: usize,
}

impl MicrogridEnv {
    /// Binds a microgrid to a series.
    ///
    /// `episode_len` defaults to the series length and may not exceed it.
    pub fn new(
        microgrid: Microgrid,
        data: EnvironmentSeries,
        episode_len: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let episode_len = episode_len.unwrap_or(data.len());
        if episode_len == 0 || episode_len > data.len() {
            return Err(ConfigError::new(
                "simulation.steps",
                format!("must be in 1..={}, got {episode_len}", data.len()),
            ));
        }
        let mut env = Self {
            microgrid,
            data,
            episode_len,
            t: 0,
        };
        env.microgrid.reset();
        Ok(env)
    }

    /// Starts a new episode.
    pub fn reset(&mut self) -> Observation {
        self.microgrid.reset();
        self.t = 0;
        self.observe()
    }

    /// Plays one step.
    ///
    /// # Errors
    ///
    /// [`MicrogridError::EpisodeFinished`] once the episode is done, and any
    /// action error from the microgrid. A rejected action does not advance
    /// the episode.
    pub fn step(&mut self, action: &Action) -> Result<Step, MicrogridError> {
        if self.is_done() {
            return Err(MicrogridError::EpisodeFinished {
                steps: self.episode_len,
            });
        }

        self.microgrid.transition(action, &self.data, self.t)?;
        let record = self.microgrid.step_result(self.t);
        self.t += 1;

        Ok(Step {
            observation: self.observe(),
            reward: -record.cost.total(),
            cost: record.cost,
            done: self.is_done(),
            record,
        })
    }

    /// Plays one step from the flat discrete encoding.
    pub fn step_flat(&mut self, flat: &[usize]) -> Result<Step, MicrogridError> {
        let action = DiscreteAction::from_flat(flat)?;
        self.step(&Action::Discrete(action))
    }

    /// Current observation without advancing.
    pub fn observe(&self) -> Observation {
        let sample = self
            .data
            .sample(self.t)
            .unwrap_or_else(|_| self.microgrid.sample());
        Observation {
            step: self.t,
            status: self.microgrid.status(),
            soc: self.microgrid.soc(),
            sample,
        }
    }

    pub fn is_done(&self) -> bool {
        self.t >= self.episode_len
    }

    /// Index of the next step.
    pub fn timestep(&self) -> usize {
        self.t
    }

    pub fn episode_len(&self) -> usize {
        self.episode_len
    }

    pub fn microgrid(&self) -> &Microgrid {
        &self.microgrid
    }

    pub fn data(&self) -> &EnvironmentSeries {
        &self.data
    }
}
