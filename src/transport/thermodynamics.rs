//! Free energy of transport and transition-state-theory gating.
//!
//! For a cycle moving n_i particles of each species i from a source to a
//! destination compartment:
//!
//! ΔG = Σ n_i · [ R·T·ln([i]_dest / [i]_src) + z_i·F·ΔV_i ]
//!
//! where ΔV_i = V_dest − V_src is the potential step species i crosses.
//! Rates follow transition state theory with the free energy split evenly
//! across the barrier:
//!
//! k_fwd = k0 · exp(−(ΔG‡ + ΔG/2)/RT),  k_bwd = k0 · exp(−(ΔG‡ − ΔG/2)/RT)
//!
//! so k_fwd / k_bwd = exp(−ΔG/RT) (detailed balance) before clamping.
//!
//! References:
//! - Eyring H. J Chem Phys. 1935;3:107-115
//! - Läuger P. Electrogenic Ion Pumps. Sinauer, 1991 (ch. 4)
//! - Hill TL. Free Energy Transduction in Biology. Academic Press, 1977

use serde::{Deserialize, Serialize};

use crate::compartment::Species;
use crate::constants::{rt_J_per_mol, tst_prefactor_per_sec, BODY_TEMPERATURE_K, FARADAY_C_PER_MOL};

/// Concentration floor for the logarithm (mM)
const MIN_CONCENTRATION_MM: f64 = 1e-12;

/// One species' contribution to a transport cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportLeg {
    pub species: Species,
    /// Particles of this species moved per cycle
    pub stoichiometry: f64,
    /// Concentration on the side the particles leave (mM)
    pub source_mM: f64,
    /// Concentration on the side the particles enter (mM)
    pub destination_mM: f64,
    /// Potential step V_dest − V_src crossed by this species (mV)
    pub delta_v_mV: f64,
}

impl TransportLeg {
    /// Molar free energy of this leg (J/mol)
    pub fn free_energy_J_per_mol(&self, temperature_K: f64) -> f64 {
        let src = self.source_mM.max(MIN_CONCENTRATION_MM);
        let dest = self.destination_mM.max(MIN_CONCENTRATION_MM);
        let chemical = rt_J_per_mol(temperature_K) * (dest / src).ln();
        let electrical = self.species.valence() as f64 * FARADAY_C_PER_MOL * self.delta_v_mV * 1e-3;
        self.stoichiometry * (chemical + electrical)
    }
}

/// Free energy of one complete transport cycle (J/mol)
///
/// Negative values mean the forward cycle is spontaneous. Degenerate inputs
/// yield 0 (no thermodynamic bias).
pub fn free_energy_J_per_mol(legs: &[TransportLeg], temperature_K: f64) -> f64 {
    let dg: f64 = legs.iter().map(|leg| leg.free_energy_J_per_mol(temperature_K)).sum();
    if dg.is_finite() {
        dg
    } else {
        0.0
    }
}

/// Energy barrier and rate bounds for a conformational transition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionBarrier {
    /// Activation free energy ΔG‡ (J/mol)
    pub activation_energy_J_per_mol: f64,
    /// Attempt frequency k0 (1/s); `None` uses kB·T/h
    pub attempt_frequency_per_sec: Option<f64>,
    /// Lower rate clamp (1/s)
    pub min_rate_per_sec: f64,
    /// Upper rate clamp (1/s)
    pub max_rate_per_sec: f64,
    /// Temperature (K)
    pub temperature_K: f64,
}

impl Default for TransitionBarrier {
    fn default() -> Self {
        Self {
            // ~10 /s unbiased turnover at 37 °C, typical for SLC transporters
            // Reference: Wright EM et al. Physiol Rev. 2011;91:733-794
            activation_energy_J_per_mol: 70_000.0,
            attempt_frequency_per_sec: None,
            min_rate_per_sec: 1e-3,
            max_rate_per_sec: 1e3,
            temperature_K: BODY_TEMPERATURE_K,
        }
    }
}

impl TransitionBarrier {
    /// Attempt frequency in use (1/s)
    pub fn prefactor_per_sec(&self) -> f64 {
        self.attempt_frequency_per_sec
            .unwrap_or_else(|| tst_prefactor_per_sec(self.temperature_K))
    }

    /// Forward/backward rates for a cycle with free energy `delta_g`
    pub fn rates(&self, delta_g_J_per_mol: f64) -> TransitionRates {
        let rt = rt_J_per_mol(self.temperature_K);
        let k0 = self.prefactor_per_sec();
        let barrier = self.activation_energy_J_per_mol;
        let dg = if delta_g_J_per_mol.is_finite() { delta_g_J_per_mol } else { 0.0 };

        let unclamped_forward = k0 * (-(barrier + dg / 2.0) / rt).exp();
        let unclamped_backward = k0 * (-(barrier - dg / 2.0) / rt).exp();

        TransitionRates {
            forward_per_sec: self.clamp(unclamped_forward),
            backward_per_sec: self.clamp(unclamped_backward),
            unclamped_forward_per_sec: unclamped_forward,
            unclamped_backward_per_sec: unclamped_backward,
            delta_g_J_per_mol: dg,
        }
    }

    fn clamp(&self, rate: f64) -> f64 {
        if rate.is_nan() {
            return self.min_rate_per_sec;
        }
        rate.clamp(self.min_rate_per_sec, self.max_rate_per_sec)
    }
}

/// Rates produced by [`TransitionBarrier::rates`]
///
/// The clamp keeps per-tick probabilities usable but breaks strict detailed
/// balance under extreme gradients; [`TransitionRates::is_clamped`] reports
/// when that happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransitionRates {
    pub forward_per_sec: f64,
    pub backward_per_sec: f64,
    pub unclamped_forward_per_sec: f64,
    pub unclamped_backward_per_sec: f64,
    pub delta_g_J_per_mol: f64,
}

impl TransitionRates {
    pub fn is_clamped(&self) -> bool {
        self.forward_per_sec != self.unclamped_forward_per_sec
            || self.backward_per_sec != self.unclamped_backward_per_sec
    }

    /// k_fwd / k_bwd of the clamped rates
    pub fn ratio(&self) -> f64 {
        self.forward_per_sec / self.backward_per_sec
    }
}

/// Outcome of one gating attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Forward,
    Backward,
    Hold,
}

/// Decide the transition for one tick from a single uniform draw `u ∈ [0, 1)`
///
/// Forward is tested first: forward iff u < p_f, backward iff
/// p_f ≤ u < p_f + p_b. The two outcomes are mutually exclusive, and when
/// p_f + p_b would exceed 1 both are scaled down keeping their ratio, so the
/// forward:backward event ratio equals k_fwd / k_bwd.
pub fn decide_transition(rates: &TransitionRates, delta_sec: f64, u: f64) -> GateOutcome {
    let mut p_forward = (rates.forward_per_sec * delta_sec).max(0.0);
    let mut p_backward = (rates.backward_per_sec * delta_sec).max(0.0);
    if !(p_forward.is_finite() && p_backward.is_finite()) {
        return GateOutcome::Hold;
    }

    let total = p_forward + p_backward;
    if total > 1.0 {
        p_forward /= total;
        p_backward /= total;
    }

    if u < p_forward {
        GateOutcome::Forward
    } else if u < p_forward + p_backward {
        GateOutcome::Backward
    } else {
        GateOutcome::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_gradient_has_zero_free_energy() {
        let leg = TransportLeg {
            species: Species::Glucose,
            stoichiometry: 1.0,
            source_mM: 5.0,
            destination_mM: 5.0,
            delta_v_mV: -70.0,
        };
        assert_eq!(leg.free_energy_J_per_mol(BODY_TEMPERATURE_K), 0.0);
    }

    #[test]
    fn test_sodium_entry_is_downhill() {
        let leg = TransportLeg {
            species: Species::Sodium,
            stoichiometry: 1.0,
            source_mM: 140.0,
            destination_mM: 12.0,
            delta_v_mV: -70.0,
        };
        let dg = leg.free_energy_J_per_mol(BODY_TEMPERATURE_K);
        // chemical ≈ -6.3 kJ/mol, electrical ≈ -6.8 kJ/mol
        assert!((dg - (-13_089.0)).abs() < 50.0, "ΔG = {}", dg);
    }

    #[test]
    fn test_unclamped_ratio_is_boltzmann() {
        let barrier = TransitionBarrier::default();
        let rt = rt_J_per_mol(barrier.temperature_K);
        for dg in [-20_000.0, -1.0, 0.0, 7_500.0] {
            let r = barrier.rates(dg);
            let ratio = r.unclamped_forward_per_sec / r.unclamped_backward_per_sec;
            let expected = (-dg / rt).exp();
            assert!((ratio / expected - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_clamp_is_reported() {
        let barrier = TransitionBarrier {
            activation_energy_J_per_mol: 0.0,
            ..Default::default()
        };
        let r = barrier.rates(0.0);
        assert!(r.is_clamped());
        assert_eq!(r.forward_per_sec, barrier.max_rate_per_sec);
    }

    #[test]
    fn test_gate_partitions_unit_interval() {
        let rates = TransitionRates {
            forward_per_sec: 100.0,
            backward_per_sec: 10.0,
            unclamped_forward_per_sec: 100.0,
            unclamped_backward_per_sec: 10.0,
            delta_g_J_per_mol: 0.0,
        };
        assert_eq!(decide_transition(&rates, 1e-3, 0.05), GateOutcome::Forward);
        assert_eq!(decide_transition(&rates, 1e-3, 0.105), GateOutcome::Backward);
        assert_eq!(decide_transition(&rates, 1e-3, 0.5), GateOutcome::Hold);
        // Saturated: p_f + p_b scaled to 1, ratio preserved
        assert_eq!(decide_transition(&rates, 1.0, 0.90), GateOutcome::Forward);
        assert_eq!(decide_transition(&rates, 1.0, 0.95), GateOutcome::Backward);
    }
}
