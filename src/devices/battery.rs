use crate::sim::params::BatteryParams;

/// A battery energy storage system with a bounded state of charge.
///
/// `Battery` tracks its state of charge (SOC) in energy units. Charging and
/// discharging are both lossy with the same efficiency: stored energy grows by
/// `energy × η` when charging and shrinks by `energy / η` when discharging.
///
/// Intermediate operations may leave the SOC outside `[soc_min, soc_max]`;
/// [`Battery::clamp`] restores the bounds and must close every update.
#[derive(Debug, Clone)]
pub struct Battery {
    /// Nominal capacity.
    pub capacity: f64,

    /// Lower SOC bound (energy units).
    pub soc_min: f64,

    /// Upper SOC bound (energy units).
    pub soc_max: f64,

    /// Charging / discharging efficiency (0..1.0).
    pub efficiency: f64,

    /// State of charge (energy units).
    pub soc: f64,
}

impl Battery {
    /// Creates a new battery with the given initial state of charge.
    ///
    /// The initial SOC is not checked against the bounds; an out-of-range
    /// value is clamped by the first update.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero/negative, the SOC bounds are inverted or
    /// exceed capacity, or the efficiency is outside `(0, 1]`.
    pub fn new(params: &BatteryParams, soc: f64) -> Self {
        assert!(params.capacity > 0.0);
        assert!(params.soc_min < params.soc_max && params.soc_max <= params.capacity);
        assert!(params.efficiency > 0.0 && params.efficiency <= 1.0);

        Self {
            capacity: params.capacity,
            soc_min: params.soc_min,
            soc_max: params.soc_max,
            efficiency: params.efficiency,
            soc,
        }
    }

    /// Stores `energy` after charging losses.
    pub fn charge(&mut self, energy: f64) {
        self.soc += energy * self.efficiency;
    }

    /// Raises the SOC to its upper bound and returns the energy this took.
    ///
    /// Returns 0 when the SOC already sits at or above the bound.
    pub fn top_off(&mut self) -> f64 {
        let purchased = (self.soc_max - self.soc).max(0.0);
        self.soc += purchased;
        purchased
    }

    /// Draws `energy` for the load; the cell loses `energy / η`.
    pub fn discharge(&mut self, energy: f64) {
        self.soc -= energy / self.efficiency;
    }

    /// Restores `soc_min <= soc <= soc_max`.
    pub fn clamp(&mut self) {
        self.soc = self.soc.clamp(self.soc_min, self.soc_max);
    }

    /// Energy that can reach the load before the SOC hits its lower bound.
    pub fn deliverable(&self) -> f64 {
        (self.soc - self.soc_min).max(0.0) * self.efficiency
    }

    /// Room left before the SOC hits its upper bound, in input energy.
    pub fn headroom(&self) -> f64 {
        (self.soc_max - self.soc).max(0.0) / self.efficiency
    }
}
