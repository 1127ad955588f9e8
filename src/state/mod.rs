//! Observable state of the tubule simulation.
//!
//! Contains the flat metrics snapshot consumed by diagnostics and export.

mod metrics;

pub use metrics::{SimulationMetrics, SoluteStatus, TubuleStatus};
