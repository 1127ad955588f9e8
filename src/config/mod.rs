//! Configuration module for loading simulation parameters.
//!
//! All biological parameters include citations to their source publications.

mod parameters;

pub use parameters::{
    load_json_or_default, ChemistryParameters, CompartmentParameters, Parameters, SimulationParameters,
    TransportTable, DEFAULT_PARAMETER_DIR,
};
