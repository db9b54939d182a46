//! Device models for the microgrid's sources and storage.

/// Battery storage with bounded state of charge.
pub mod battery;
/// Diesel generator bank.
pub mod generator;
/// Solar photovoltaic array.
pub mod solar;
pub mod types;
/// Wind turbine power curve.
pub mod wind;

// Re-export the main types for convenience
pub use battery::Battery;
pub use generator::DieselGenerator;
pub use solar::SolarPv;
pub use types::Device;
pub use types::DeviceContext;
pub use wind::WindTurbine;
