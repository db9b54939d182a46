use crate::devices::types::{Device, DeviceContext};
use crate::sim::params::GeneratorParams;

/// A bank of diesel generators running at rated output whenever switched on.
#[derive(Debug, Clone)]
pub struct DieselGenerator {
    /// Number of generators.
    pub count: u32,

    /// Rated output per generator and hour.
    pub rated_output: f64,

    /// Duration of one period in hours.
    dt_hours: f64,
}

impl DieselGenerator {
    pub fn new(params: &GeneratorParams, dt_hours: f64) -> Self {
        Self {
            count: params.count,
            rated_output: params.rated_output,
            dt_hours,
        }
    }
}

impl Device for DieselGenerator {
    fn energy(&self, context: &DeviceContext) -> f64 {
        if !context.is_active() {
            return 0.0;
        }
        context.status * f64::from(self.count) * self.rated_output * self.dt_hours
    }

    fn device_type(&self) -> &'static str {
        "DieselGenerator"
    }
}
