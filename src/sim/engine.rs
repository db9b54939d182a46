//! Episode runner pairing a policy with a microgrid environment.

use tracing::{debug, info};

use super::env::MicrogridEnv;
use super::policy::Policy;
use super::types::StepResult;
use crate::error::MicrogridError;

/// Simulation engine owning the environment and the policy.
///
/// Generic over `P: Policy` for static dispatch.
pub struct Engine<P: Policy> {
    env: MicrogridEnv,
    policy: P,
}

impl<P: Policy> Engine<P> {
    pub fn new(env: MicrogridEnv, policy: P) -> Self {
        Self { env, policy }
    }

    /// Plays the next step and returns its record.
    ///
    /// # Errors
    ///
    /// Fails once the episode is done or if the policy emits a malformed action.
    pub fn step(&mut self) -> Result<StepResult, MicrogridError> {
        let observation = self.env.observe();
        let action = self.policy.decide(&observation);
        let step = self.env.step(&action)?;
        debug!(
            step = step.record.timestep,
            cost = step.cost.total(),
            soc = step.record.soc,
            "step settled"
        );
        Ok(step.record)
    }

    /// Resets the environment and runs a complete episode.
    pub fn run(&mut self) -> Result<Vec<StepResult>, MicrogridError> {
        self.env.reset();
        let mut results = Vec::with_capacity(self.env.episode_len());
        while !self.env.is_done() {
            results.push(self.step()?);
        }
        info!(
            policy = self.policy.name(),
            steps = results.len(),
            "episode finished"
        );
        Ok(results)
    }

    pub fn env(&self) -> &MicrogridEnv {
        &self.env
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }
}
