//! CO2 / bicarbonate chemistry inside a compartment.
//!
//! Two coupled reactions:
//! - CO2 + H2O ⇌ H2CO3, catalysed by carbonic anhydrase (CA II in the PCT
//!   cytosol, CA IV on the brush border)
//! - H2CO3 ⇌ H+ + HCO3-, spontaneous and fast
//!
//! Together they supply the H+ that NHE3 secretes and the HCO3- that the
//! basolateral membrane reabsorbs.
//!
//! References:
//! - Maren TH. Physiol Rev. 1967;47:595-781 (carbonic anhydrase)
//! - Khalifah RG. J Biol Chem. 1971;246:2561-2573 (CA II kcat ~1e6 /s)
//! - Purkerson JM, Schwartz GJ. Kidney Int. 2007;71:103-115 (renal CA)

use serde::{Deserialize, Serialize};

use super::enzyme::{michaelis_menten, CompartmentReaction, ReactionFlux};
use crate::compartment::{IonPool, Species};
use crate::constants::mM_to_count;

/// Parameters for H2CO3 ⇌ H+ + HCO3-
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonicAcidConfig {
    /// pKa of carbonic acid (true acid, not the apparent 6.1)
    /// Reference: Adamczyk K et al. Science. 2009;326:1690-1694
    pub pka: f64,
    /// Effective dissociation rate constant (1/s)
    ///
    /// The physical constant (~1e7 /s) is far too stiff for explicit ticks;
    /// the explicit update stays monotone while
    /// k_f · (1 + [HCO3-]/K_eq) · Δt < 1.
    pub k_forward_per_sec: f64,
}

impl Default for CarbonicAcidConfig {
    fn default() -> Self {
        Self {
            pka: 3.6,
            k_forward_per_sec: 5.0,
        }
    }
}

impl CarbonicAcidConfig {
    /// Equilibrium constant K_eq = 10^-pKa expressed in mM
    pub fn k_eq_mM(&self) -> f64 {
        10f64.powf(-self.pka) * 1000.0
    }

    /// Association rate constant (1/(mM·s)) from detailed balance
    pub fn k_backward_per_mM_sec(&self) -> f64 {
        self.k_forward_per_sec / self.k_eq_mM()
    }
}

/// Fast H2CO3 ⇌ H+ + HCO3- equilibrium
///
/// Forward (first order) and backward (second order) turnover are both
/// computed from the same pre-update snapshot, capped independently at
/// what is available, then applied.
#[derive(Debug, Clone, Default)]
pub struct CarbonicAcidEquilibrium {
    pub config: CarbonicAcidConfig,
}

impl CarbonicAcidEquilibrium {
    pub fn new(config: CarbonicAcidConfig) -> Self {
        Self { config }
    }

    /// Reaction quotient [H+][HCO3-]/[H2CO3] (mM)
    pub fn reaction_quotient_mM<P: IonPool + ?Sized>(pool: &P) -> f64 {
        let h2co3 = pool.concentration_mM(Species::CarbonicAcid);
        if h2co3 <= 0.0 {
            return f64::INFINITY;
        }
        pool.concentration_mM(Species::Hydrogen) * pool.concentration_mM(Species::Bicarbonate) / h2co3
    }
}

impl CompartmentReaction for CarbonicAcidEquilibrium {
    fn name(&self) -> &'static str {
        "Carbonic acid dissociation"
    }

    fn react(&mut self, pool: &mut dyn IonPool, delta_sec: f64) -> ReactionFlux {
        if !pool.is_valid() || !(delta_sec > 0.0) {
            return ReactionFlux::default();
        }
        let volume_L = pool.volume_L();

        // Snapshot before either direction is applied
        let h2co3_mM = pool.concentration_mM(Species::CarbonicAcid);
        let h_mM = pool.concentration_mM(Species::Hydrogen);
        let hco3_mM = pool.concentration_mM(Species::Bicarbonate);
        let h2co3 = pool.actual(Species::CarbonicAcid);
        let h = pool.actual(Species::Hydrogen);
        let hco3 = pool.actual(Species::Bicarbonate);

        let k_f = self.config.k_forward_per_sec;
        let k_b = self.config.k_backward_per_mM_sec();

        let forward = mM_to_count(k_f * h2co3_mM * delta_sec, volume_L).min(h2co3);
        let backward = mM_to_count(k_b * h_mM * hco3_mM * delta_sec, volume_L).min(h.min(hco3));

        if pool.debit(Species::CarbonicAcid, forward) {
            pool.credit(Species::Hydrogen, forward);
            pool.credit(Species::Bicarbonate, forward);
        }
        if pool.has_available(Species::Hydrogen, backward) && pool.has_available(Species::Bicarbonate, backward) {
            pool.debit(Species::Hydrogen, backward);
            pool.debit(Species::Bicarbonate, backward);
            pool.credit(Species::CarbonicAcid, backward);
        }

        ReactionFlux { forward, backward }
    }
}

/// Parameters for carbonic anhydrase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonicAnhydraseConfig {
    /// Hydration turnover number (1/s)
    /// Reference: Khalifah 1971, CA II kcat ≈ 1e6 /s
    pub kcat_forward_per_sec: f64,
    /// Dehydration turnover number (1/(s·mM))
    ///
    /// Sets the enzyme's fixed point [H2CO3]/[CO2] = kcat_f / (kcat_r · (Km + [CO2])).
    /// The default places it at the hydration constant K_hyd = 10^(3.6 - 6.1)
    /// for [CO2] = 1.2 mM, matching the seeded H2CO3.
    /// Reference: Adamczyk 2009 (true pKa 3.6 vs apparent pKa 6.1)
    pub kcat_reverse_per_sec: f64,
    /// Km for CO2 (mM)
    /// Reference: Khalifah 1971, Km ≈ 8-12 mM
    pub km_co2_mM: f64,
    /// Enzyme molecules represented in the compartment
    pub enzyme_count: f64,
}

impl Default for CarbonicAnhydraseConfig {
    fn default() -> Self {
        Self {
            kcat_forward_per_sec: 1e6,
            kcat_reverse_per_sec: 2.8234e7,
            km_co2_mM: 10.0,
            enzyme_count: 100.0,
        }
    }
}

impl CarbonicAnhydraseConfig {
    /// [H2CO3]/[CO2] at which hydration and dehydration balance
    pub fn steady_state_ratio(&self, co2_mM: f64) -> f64 {
        let denominator = self.kcat_reverse_per_sec * (self.km_co2_mM + co2_mM.max(0.0));
        if denominator > 0.0 {
            self.kcat_forward_per_sec / denominator
        } else {
            f64::INFINITY
        }
    }
}

/// Carbonic anhydrase: CO2 + H2O ⇌ H2CO3
///
/// v_f = kcat_f · n · [CO2]/(Km + [CO2]), v_r = kcat_r · n · [H2CO3].
/// Without a CO2 source the net flux decays towards zero; that steady state
/// is the expected terminal behaviour.
#[derive(Debug, Clone, Default)]
pub struct CarbonicAnhydrase {
    pub config: CarbonicAnhydraseConfig,
}

impl CarbonicAnhydrase {
    pub fn new(config: CarbonicAnhydraseConfig) -> Self {
        Self { config }
    }

    /// Hydration velocity (molecules/s)
    pub fn forward_velocity<P: IonPool + ?Sized>(&self, pool: &P) -> f64 {
        let c = &self.config;
        michaelis_menten(
            c.kcat_forward_per_sec * c.enzyme_count,
            c.km_co2_mM,
            pool.concentration_mM(Species::CarbonDioxide),
        )
    }

    /// Dehydration velocity (molecules/s)
    pub fn reverse_velocity<P: IonPool + ?Sized>(&self, pool: &P) -> f64 {
        let c = &self.config;
        (c.kcat_reverse_per_sec * c.enzyme_count * pool.concentration_mM(Species::CarbonicAcid)).max(0.0)
    }
}

impl CompartmentReaction for CarbonicAnhydrase {
    fn name(&self) -> &'static str {
        "Carbonic anhydrase"
    }

    fn ec_number(&self) -> Option<&'static str> {
        Some("4.2.1.1")
    }

    fn react(&mut self, pool: &mut dyn IonPool, delta_sec: f64) -> ReactionFlux {
        if !pool.is_valid() || !(delta_sec > 0.0) {
            return ReactionFlux::default();
        }

        let co2 = pool.actual(Species::CarbonDioxide);
        let water = pool.actual(Species::Water);
        let h2co3 = pool.actual(Species::CarbonicAcid);

        let forward = (self.forward_velocity(&*pool) * delta_sec).min(co2).min(water);
        let backward = (self.reverse_velocity(&*pool) * delta_sec).min(h2co3);

        if pool.has_available(Species::CarbonDioxide, forward) && pool.has_available(Species::Water, forward) {
            pool.debit(Species::CarbonDioxide, forward);
            pool.debit(Species::Water, forward);
            pool.credit(Species::CarbonicAcid, forward);
        }
        if pool.debit(Species::CarbonicAcid, backward) {
            pool.credit(Species::CarbonDioxide, backward);
            pool.credit(Species::Water, backward);
        }

        ReactionFlux { forward, backward }
    }
}
