//! Electrochemical field attached to a single compartment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::compartment::{CompartmentId, IonPool, Species};
use crate::constants::{ELEMENTARY_CHARGE_C, FALLBACK_POTENTIAL_MV, GHK_SLOPE_MV_PER_DECADE};

/// Relative membrane permeabilities used by the GHK equation
///
/// Reference: Hodgkin & Katz 1949 (P_K : P_Na : P_Cl = 1 : 0.04 : 0.45)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GhkPermeabilities {
    pub potassium: f64,
    pub sodium: f64,
    pub chloride: f64,
}

impl Default for GhkPermeabilities {
    fn default() -> Self {
        Self {
            potassium: 1.0,
            sodium: 0.04,
            chloride: 0.45,
        }
    }
}

/// Electrical properties of the simulated membrane patch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MembraneConfig {
    /// Membrane capacitance (F)
    /// Reference: ~1 μF/cm² specific capacitance (Hille 2001) over ~1e-2 cm²
    /// of folded brush-border and basolateral membrane
    pub capacitance_F: f64,
    /// Potential at construction (mV)
    pub initial_potential_mV: f64,
    /// Lower safety clamp (mV)
    pub min_potential_mV: f64,
    /// Upper safety clamp (mV)
    pub max_potential_mV: f64,
    /// GHK permeability weights
    pub permeabilities: GhkPermeabilities,
}

impl Default for MembraneConfig {
    fn default() -> Self {
        Self {
            capacitance_F: 1e-8, // 10 nF
            initial_potential_mV: -70.0,
            min_potential_mV: -200.0,
            max_potential_mV: 100.0,
            permeabilities: GhkPermeabilities::default(),
        }
    }
}

/// GHK potential from raw concentrations (mM)
///
/// V = 61.5 · log10((P_K[K]o + P_Na[Na]o + P_Cl[Cl]i) / (P_K[K]i + P_Na[Na]i + P_Cl[Cl]o))
///
/// Cl- terms are swapped between inside and outside because the anion's
/// driving force has the opposite sign. Degenerate inputs (non-positive sums,
/// NaN/Inf) return the -70 mV fallback.
#[allow(clippy::too_many_arguments)]
pub fn ghk_potential_mV(
    k_in_mM: f64,
    na_in_mM: f64,
    cl_in_mM: f64,
    k_out_mM: f64,
    na_out_mM: f64,
    cl_out_mM: f64,
    p: &GhkPermeabilities,
) -> f64 {
    let numerator = p.potassium * k_out_mM + p.sodium * na_out_mM + p.chloride * cl_in_mM;
    let denominator = p.potassium * k_in_mM + p.sodium * na_in_mM + p.chloride * cl_out_mM;

    if !(numerator > 0.0 && denominator > 0.0) {
        return FALLBACK_POTENTIAL_MV;
    }

    let v = GHK_SLOPE_MV_PER_DECADE * (numerator / denominator).log10();
    if v.is_finite() {
        v
    } else {
        FALLBACK_POTENTIAL_MV
    }
}

/// GHK equilibrium potential of `inside` relative to `outside` (mV)
pub fn goldman_hodgkin_katz<I, O>(inside: &I, outside: &O, p: &GhkPermeabilities) -> f64
where
    I: IonPool + ?Sized,
    O: IonPool + ?Sized,
{
    ghk_potential_mV(
        inside.concentration_mM(Species::Potassium),
        inside.concentration_mM(Species::Sodium),
        inside.concentration_mM(Species::Chloride),
        outside.concentration_mM(Species::Potassium),
        outside.concentration_mM(Species::Sodium),
        outside.concentration_mM(Species::Chloride),
        p,
    )
}

/// Net charge carried by all tracked ions in a pool (C)
pub fn total_charge_C<P: IonPool + ?Sized>(pool: &P) -> f64 {
    Species::ALL
        .iter()
        .map(|&s| s.valence() as f64 * pool.actual(s))
        .sum::<f64>()
        * ELEMENTARY_CHARGE_C
}

/// Osmolality from all osmotically active solutes (mOsm/L ≈ mOsm/kg)
pub fn osmolality_mOsm<P: IonPool + ?Sized>(pool: &P) -> f64 {
    Species::ALL
        .iter()
        .filter(|s| s.is_osmotically_active())
        .map(|&s| pool.concentration_mM(s))
        .sum()
}

/// Electrochemical state of one compartment
///
/// Owns the *dynamic* membrane potential: a capacitor integrated from the net
/// current transporters report during a tick. The GHK potential is recomputed
/// each tick as a reference for drift diagnostics only.
#[derive(Debug, Clone)]
pub struct ElectrochemicalField {
    compartment: CompartmentId,
    reference: Option<CompartmentId>,
    config: MembraneConfig,
    volume_L: f64,
    membrane_potential_mV: f64,
    equilibrium_potential_mV: f64,
    total_current_A: f64,
    transporter_currents: BTreeMap<String, f64>,
    last_currents: BTreeMap<String, f64>,
    last_total_current_A: f64,
    inert: bool,
}

impl ElectrochemicalField {
    /// Create the field for a compartment of the given volume
    pub fn new(compartment: CompartmentId, volume_L: f64, config: MembraneConfig) -> Self {
        let inert = !(volume_L > 0.0 && volume_L.is_finite()) || !(config.capacitance_F > 0.0);
        let v0 = if config.initial_potential_mV.is_finite() {
            config.initial_potential_mV
        } else {
            FALLBACK_POTENTIAL_MV
        };
        Self {
            compartment,
            reference: None,
            volume_L,
            membrane_potential_mV: v0,
            equilibrium_potential_mV: v0,
            total_current_A: 0.0,
            transporter_currents: BTreeMap::new(),
            last_currents: BTreeMap::new(),
            last_total_current_A: 0.0,
            inert,
            config,
        }
    }

    /// Compartment this field belongs to
    pub fn compartment(&self) -> CompartmentId {
        self.compartment
    }

    /// Outside compartment used for the GHK reference
    pub fn reference(&self) -> Option<CompartmentId> {
        self.reference
    }

    pub fn set_reference(&mut self, reference: Option<CompartmentId>) {
        self.reference = reference;
    }

    pub fn volume_L(&self) -> f64 {
        self.volume_L
    }

    pub fn config(&self) -> &MembraneConfig {
        &self.config
    }

    pub fn is_inert(&self) -> bool {
        self.inert
    }

    /// Dynamic membrane potential (mV)
    pub fn membrane_potential_mV(&self) -> f64 {
        self.membrane_potential_mV
    }

    /// Override the dynamic potential, clamped to the safety band
    pub fn set_membrane_potential(&mut self, mV: f64) {
        self.membrane_potential_mV = self.clamp_potential(mV);
    }

    /// GHK potential computed during the last tick (mV)
    pub fn equilibrium_potential_mV(&self) -> f64 {
        self.equilibrium_potential_mV
    }

    /// Dynamic minus equilibrium potential (mV)
    pub fn drift_mV(&self) -> f64 {
        self.membrane_potential_mV - self.equilibrium_potential_mV
    }

    /// Current accumulated so far in this tick (A)
    pub fn total_current_A(&self) -> f64 {
        self.total_current_A
    }

    /// Net current integrated during the last completed tick (A)
    pub fn last_total_current_A(&self) -> f64 {
        self.last_total_current_A
    }

    /// Per-transporter currents accumulated so far in this tick (A)
    pub fn transporter_currents(&self) -> &BTreeMap<String, f64> {
        &self.transporter_currents
    }

    /// Per-transporter currents of the last completed tick (A)
    pub fn last_transporter_currents(&self) -> &BTreeMap<String, f64> {
        &self.last_currents
    }

    /// Concentration of a species in the owning compartment (mM)
    pub fn ion_concentration<P: IonPool + ?Sized>(&self, pool: &P, species: Species) -> f64 {
        if self.inert {
            return 0.0;
        }
        let mM = pool.concentration_mM(species);
        if mM.is_finite() {
            mM.max(0.0)
        } else {
            0.0
        }
    }

    /// GHK equilibrium potential against an outside pool (mV)
    pub fn equilibrium_potential<I, O>(&self, inside: &I, outside: &O) -> f64
    where
        I: IonPool + ?Sized,
        O: IonPool + ?Sized,
    {
        goldman_hodgkin_katz(inside, outside, &self.config.permeabilities)
    }

    /// Accumulate a transporter's current for this tick
    ///
    /// `current = ion_flux × charge_per_ion × e`. Positive current is positive
    /// charge entering this compartment.
    pub fn add_transporter_current(&mut self, id: &str, ion_flux_per_sec: f64, charge_per_ion: f64) {
        if self.inert {
            return;
        }
        let current_A = ion_flux_per_sec * charge_per_ion * ELEMENTARY_CHARGE_C;
        if !current_A.is_finite() {
            log::warn!("Ignoring non-finite current from {}", id);
            return;
        }
        self.total_current_A += current_A;
        *self.transporter_currents.entry(id.to_string()).or_insert(0.0) += current_A;
    }

    /// Advance the dynamic potential by `delta_sec`
    ///
    /// 1. GHK reference against `outside` (if any)
    /// 2. NaN/Inf guard on both potentials
    /// 3. V += I / C · Δt (V → mV)
    /// 4. clamp to the safety band
    /// 5. reset the per-tick current accumulators
    pub fn tick<I, O>(&mut self, inside: &I, outside: Option<&O>, delta_sec: f64)
    where
        I: IonPool + ?Sized,
        O: IonPool + ?Sized,
    {
        if self.inert {
            self.reset_currents();
            return;
        }

        if let Some(outside) = outside {
            self.equilibrium_potential_mV = self.equilibrium_potential(inside, outside);
        }

        if !self.equilibrium_potential_mV.is_finite() {
            self.equilibrium_potential_mV = FALLBACK_POTENTIAL_MV;
        }
        if !self.membrane_potential_mV.is_finite() {
            log::warn!("Membrane potential of {} degenerated; resetting", self.compartment);
            self.membrane_potential_mV = FALLBACK_POTENTIAL_MV;
        }

        if delta_sec > 0.0 && delta_sec.is_finite() {
            let dv_mV = self.total_current_A / self.config.capacitance_F * delta_sec * 1000.0;
            if dv_mV.is_finite() {
                self.membrane_potential_mV += dv_mV;
            }
        }
        self.membrane_potential_mV = self.clamp_potential(self.membrane_potential_mV);

        self.reset_currents();
    }

    fn reset_currents(&mut self) {
        self.last_total_current_A = self.total_current_A;
        self.last_currents = std::mem::take(&mut self.transporter_currents);
        self.total_current_A = 0.0;
    }

    fn clamp_potential(&self, mV: f64) -> f64 {
        if !mV.is_finite() {
            return FALLBACK_POTENTIAL_MV;
        }
        mV.clamp(self.config.min_potential_mV, self.config.max_potential_mV)
    }
}
