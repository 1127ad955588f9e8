//! Electrochemistry of the epithelial membrane.
//!
//! Two voltages are tracked for each compartment:
//! - the GHK equilibrium potential, a pure function of the current
//!   concentrations on both sides of the membrane
//! - the dynamic membrane potential, a capacitor charged by the currents that
//!   transporters report every tick
//!
//! The dynamic potential is free to drift away from GHK equilibrium. No
//! passive leak conductance pulls it back; only ATP-driven pumping maintains
//! the gradients that set it.
//!
//! References:
//! - Goldman DE. J Gen Physiol. 1943;27:37-60
//! - Hodgkin AL, Katz B. J Physiol. 1949;108:37-77
//! - Hille B. Ion Channels of Excitable Membranes. 3rd ed. Sinauer, 2001

mod field;

pub use field::{
    ghk_potential_mV, goldman_hodgkin_katz, osmolality_mOsm, total_charge_C, ElectrochemicalField,
    GhkPermeabilities, MembraneConfig,
};
