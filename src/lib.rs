//! Microgrid state-transition and cost engine.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// Environment series: CSV ingestion and synthetic generation.
pub mod data;
pub mod devices;
pub mod error;
pub mod io;
pub mod runner;
/// Microgrid transition, settlement, environment adapter, and policies.
pub mod sim;
