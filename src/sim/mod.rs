/// Action encodings and their validation.
pub mod action;
pub mod cost;
pub mod engine;
/// Step/reset environment adapter.
pub mod env;
pub mod kpi;
/// The microgrid state-transition engine.
pub mod microgrid;
pub mod params;
/// Baseline decision policies.
pub mod policy;
pub mod types;
