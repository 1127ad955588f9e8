//! Tubule Simulator X - emergent ion transport in the renal proximal
//! convoluted tubule
//!
//! This library couples particle-count compartments, an electrochemical
//! membrane field, bicarbonate buffer chemistry and stochastic transporter
//! state machines (Na+/K+-ATPase, SGLT2, NHE3). Reabsorption, membrane
//! potential and pH regulation are not prescribed; they emerge from the
//! transporters acting on shared compartments.

// Allow non-snake-case for unit suffixes in field names (mM, mV, L, A, etc.)
// This follows the project convention of including units in names.
#![allow(non_snake_case)]

pub mod biochemistry;
pub mod compartment;
pub mod config;
pub mod constants;
pub mod electrochemistry;
pub mod error;
pub mod export;
pub mod simulation;
pub mod state;
pub mod transport;

pub use biochemistry::{CarbonicAcidEquilibrium, CarbonicAnhydrase, CompartmentReaction};
pub use compartment::{
    Compartment, CompartmentId, CompartmentKind, CompartmentRegistry, CompartmentSpec, IonPool,
    SimulationContext, Species, BLOOD_ID, CELL_ID, LUMEN_ID,
};
pub use config::Parameters;
pub use electrochemistry::{ElectrochemicalField, MembraneConfig};
pub use error::{ActivationError, TransportError};
pub use simulation::{TubuleDiagnostics, TubuleSimulation};
pub use state::SimulationMetrics;
pub use transport::{NaKAtpase, Nhe3, Sglt2, Transporter, TransporterDefinition, TransporterKind};
