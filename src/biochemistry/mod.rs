//! Intracompartment chemistry for the PCT model.
//!
//! Two reactions buffer H+ in every compartment:
//! - Carbonic acid dissociation: H2CO3 ⇌ H+ + HCO3- (fast, pKa ≈ 3.6)
//! - Carbonic anhydrase: CO2 + H2O ⇌ H2CO3 (enzyme-catalysed hydration)
//!
//! Both update particle counts in place through the `IonPool` interface and
//! never debit more than a compartment holds.
//!
//! Key targets:
//! - Cytosolic pH: 7.1-7.3
//! - Luminal/plasma pH: 7.35-7.45
//!
//! References:
//! - Boron WF. J Am Soc Nephrol. 2006;17:2368-2382 (proximal HCO3- reabsorption)
//! - Lindskog S. Pharmacol Ther. 1997;74:1-20 (carbonic anhydrase kinetics)

pub mod carbonic;
pub mod enzyme;

pub use carbonic::{CarbonicAcidConfig, CarbonicAcidEquilibrium, CarbonicAnhydrase, CarbonicAnhydraseConfig};
pub use enzyme::{event_probability, fractional_saturation, michaelis_menten, CompartmentReaction, ReactionFlux};
