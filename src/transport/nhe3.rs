//! NHE3 Na+/H+ exchanger on the apical membrane.
//!
//! 1 Na+ lumen → cell exchanged for 1 H+ cell → lumen. The two sites bind
//! independently, in either order. Because equal charges cross in opposite
//! directions the exchange is electroneutral: the electrical terms of the
//! free energy cancel and the net current is zero.
//!
//! Secreted H+ titrates filtered HCO3- in the lumen; together with carbonic
//! anhydrase this drives proximal bicarbonate reabsorption.
//!
//! References:
//! - Orlowski J, Grinstein S. Pflugers Arch. 2004;447:549-565
//! - Aronson PS. Annu Rev Physiol. 1985;47:545-560 (H+ modifier site)
//! - Boron WF, Boulpaep EL. Medical Physiology. 3rd ed. 2017 (ch. 39)

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::thermodynamics::{decide_transition, free_energy_J_per_mol, GateOutcome, TransitionBarrier, TransitionRates, TransportLeg};
use super::{deposit, try_bind, BindingSite, ReleaseTimer, Transporter, TransporterDiagnostics, TransporterKind};
use crate::compartment::{CompartmentId, IonPool, SimulationContext, Species};

/// NHE3 kinetic parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Nhe3Config {
    /// Exchangers cycling in lock-step (batch multiplier)
    ///
    /// Kept small: the cytosol holds only ~8e4 free H+ at pH 7.2.
    pub transport_count: f64,
    /// Km for luminal Na+ (mM)
    /// Reference: Orlowski & Grinstein 2004 (5-30 mM)
    pub km_na_mM: f64,
    /// Km for cytosolic H+ (mM), pK ≈ 7.0
    /// Reference: Aronson 1985
    pub km_h_mM: f64,
    /// Binding rate constant at full saturation (1/s)
    pub binding_rate_per_sec: f64,
    /// Exchange and release window (s)
    pub release_duration_sec: f64,
    /// Conformational barrier for the loaded exchanger
    pub barrier: TransitionBarrier,
}

impl Default for Nhe3Config {
    fn default() -> Self {
        Self {
            transport_count: 10.0,
            km_na_mM: 15.0,
            km_h_mM: 1e-4,
            binding_rate_per_sec: 100.0,
            release_duration_sec: 0.002,
            barrier: TransitionBarrier::default(),
        }
    }
}

/// NHE3 conformations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Nhe3State {
    Empty,
    /// Only the luminal Na+ site occupied
    NaBound,
    /// Only the cytosolic H+ site occupied
    HBound,
    /// Both sites occupied, waiting on the thermodynamic gate
    FullyBound,
    /// Exchanging and releasing on the far sides
    Exchanging,
}

impl Nhe3State {
    pub fn name(self) -> &'static str {
        match self {
            Nhe3State::Empty => "Empty",
            Nhe3State::NaBound => "Na+ bound",
            Nhe3State::HBound => "H+ bound",
            Nhe3State::FullyBound => "Fully bound",
            Nhe3State::Exchanging => "Exchanging",
        }
    }
}

/// A population of NHE3 exchangers cycling together
#[derive(Debug, Clone)]
pub struct Nhe3 {
    id: String,
    pub config: Nhe3Config,
    lumen: Option<CompartmentId>,
    cell: Option<CompartmentId>,
    state: Nhe3State,
    cycling: bool,
    release: ReleaseTimer,
    bound_na: f64,
    bound_h: f64,
    cycles_completed: u64,
    backward_transitions: u64,
    last_delta_g: Option<f64>,
    last_rates: Option<TransitionRates>,
}

impl Nhe3 {
    pub fn new(id: impl Into<String>, lumen: CompartmentId, cell: CompartmentId, config: Nhe3Config) -> Self {
        Self::wired(id.into(), Some(lumen), Some(cell), config)
    }

    pub fn inert(id: impl Into<String>, config: Nhe3Config) -> Self {
        Self::wired(id.into(), None, None, config)
    }

    fn wired(id: String, lumen: Option<CompartmentId>, cell: Option<CompartmentId>, config: Nhe3Config) -> Self {
        Self {
            id,
            config,
            lumen,
            cell,
            state: Nhe3State::Empty,
            cycling: false,
            release: ReleaseTimer::default(),
            bound_na: 0.0,
            bound_h: 0.0,
            cycles_completed: 0,
            backward_transitions: 0,
            last_delta_g: None,
            last_rates: None,
        }
    }

    pub fn state(&self) -> Nhe3State {
        self.state
    }

    pub fn backward_transitions(&self) -> u64 {
        self.backward_transitions
    }

    pub fn last_delta_g(&self) -> Option<f64> {
        self.last_delta_g
    }

    /// Free energy of one exchange under current conditions (J/mol)
    ///
    /// Na+ moves lumen → cell across +V_m, H+ moves cell → lumen across −V_m.
    pub fn free_energy(&self, ctx: &SimulationContext) -> Option<f64> {
        let lumen = ctx.compartment(self.lumen?)?;
        let cell_id = self.cell?;
        let cell = ctx.compartment(cell_id)?;
        let v_m = ctx.membrane_potential_mV(cell_id)?;
        let legs = [
            TransportLeg {
                species: Species::Sodium,
                stoichiometry: 1.0,
                source_mM: lumen.concentration_mM(Species::Sodium),
                destination_mM: cell.concentration_mM(Species::Sodium),
                delta_v_mV: v_m,
            },
            TransportLeg {
                species: Species::Hydrogen,
                stoichiometry: 1.0,
                source_mM: cell.concentration_mM(Species::Hydrogen),
                destination_mM: lumen.concentration_mM(Species::Hydrogen),
                delta_v_mV: -v_m,
            },
        ];
        Some(free_energy_J_per_mol(&legs, self.config.barrier.temperature_K))
    }

    fn na_site(&self, lumen: CompartmentId) -> BindingSite {
        BindingSite {
            species: Species::Sodium,
            source: lumen,
            stoichiometry: 1.0,
            km_mM: self.config.km_na_mM,
        }
    }

    fn h_site(&self, cell: CompartmentId) -> BindingSite {
        BindingSite {
            species: Species::Hydrogen,
            source: cell,
            stoichiometry: 1.0,
            km_mM: self.config.km_h_mM,
        }
    }

    fn bind_na(&mut self, ctx: &mut SimulationContext, lumen: CompartmentId, delta_sec: f64, rng: &mut dyn RngCore) -> bool {
        let site = self.na_site(lumen);
        match try_bind(ctx, &site, self.config.transport_count, self.config.binding_rate_per_sec, delta_sec, rng) {
            Some(batch) => {
                self.bound_na = batch;
                true
            }
            None => false,
        }
    }

    fn bind_h(&mut self, ctx: &mut SimulationContext, cell: CompartmentId, delta_sec: f64, rng: &mut dyn RngCore) -> bool {
        let site = self.h_site(cell);
        match try_bind(ctx, &site, self.config.transport_count, self.config.binding_rate_per_sec, delta_sec, rng) {
            Some(batch) => {
                self.bound_h = batch;
                true
            }
            None => false,
        }
    }

    fn gate(
        &mut self,
        ctx: &mut SimulationContext,
        lumen: CompartmentId,
        cell: CompartmentId,
        delta_sec: f64,
        rng: &mut dyn RngCore,
    ) {
        let dg = match self.free_energy(ctx) {
            Some(dg) => dg,
            None => return,
        };
        let rates = self.config.barrier.rates(dg);
        self.last_delta_g = Some(dg);
        self.last_rates = Some(rates);

        let u: f64 = rng.gen();
        match decide_transition(&rates, delta_sec, u) {
            GateOutcome::Forward => {
                self.release.reset();
                self.cycling = true;
                self.state = Nhe3State::Exchanging;
            }
            GateOutcome::Backward => {
                deposit(ctx, lumen, Species::Sodium, self.bound_na);
                deposit(ctx, cell, Species::Hydrogen, self.bound_h);
                self.bound_na = 0.0;
                self.bound_h = 0.0;
                self.backward_transitions += 1;
                self.cycling = false;
                self.state = Nhe3State::Empty;
            }
            GateOutcome::Hold => {}
        }
    }
}

impl Transporter for Nhe3 {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TransporterKind {
        TransporterKind::Nhe3
    }

    fn advance(&mut self, ctx: &mut SimulationContext, delta_sec: f64, rng: &mut dyn RngCore) {
        let (lumen, cell) = match (self.lumen, self.cell) {
            (Some(lumen), Some(cell)) => (lumen, cell),
            _ => return,
        };
        if delta_sec.is_nan() || delta_sec <= 0.0 {
            return;
        }

        match self.state {
            Nhe3State::Empty => {
                // Independent sites: one draw each this tick
                let na = self.bind_na(ctx, lumen, delta_sec, rng);
                let h = self.bind_h(ctx, cell, delta_sec, rng);
                self.state = match (na, h) {
                    (true, true) => Nhe3State::FullyBound,
                    (true, false) => Nhe3State::NaBound,
                    (false, true) => Nhe3State::HBound,
                    (false, false) => Nhe3State::Empty,
                };
            }
            Nhe3State::NaBound => {
                if self.bind_h(ctx, cell, delta_sec, rng) {
                    self.state = Nhe3State::FullyBound;
                }
            }
            Nhe3State::HBound => {
                if self.bind_na(ctx, lumen, delta_sec, rng) {
                    self.state = Nhe3State::FullyBound;
                }
            }
            Nhe3State::FullyBound => self.gate(ctx, lumen, cell, delta_sec, rng),
            Nhe3State::Exchanging => {
                let (flux, done) = self.release.step(self.bound_na, self.config.release_duration_sec, delta_sec);
                // +1 in with Na+, -1 out with H+
                ctx.add_transporter_current(cell, &self.id, flux, 0.0);
                if done {
                    deposit(ctx, cell, Species::Sodium, self.bound_na);
                    deposit(ctx, lumen, Species::Hydrogen, self.bound_h);
                    self.bound_na = 0.0;
                    self.bound_h = 0.0;
                    self.cycles_completed += 1;
                    self.cycling = false;
                    self.state = Nhe3State::Empty;
                }
            }
        }
    }

    fn state_name(&self) -> &'static str {
        self.state.name()
    }

    fn bound(&self, species: Species) -> f64 {
        match species {
            Species::Sodium => self.bound_na,
            Species::Hydrogen => self.bound_h,
            _ => 0.0,
        }
    }

    fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    fn is_inert(&self) -> bool {
        self.lumen.is_none() || self.cell.is_none()
    }

    fn is_cycling(&self) -> bool {
        self.cycling
    }

    fn diagnostics(&self) -> TransporterDiagnostics {
        TransporterDiagnostics {
            id: self.id.clone(),
            kind: self.kind(),
            state: self.state.name(),
            inert: self.is_inert(),
            cycling: self.cycling,
            cycles_completed: self.cycles_completed,
            cycles_reversed: self.backward_transitions,
            bound: vec![(Species::Sodium, self.bound_na), (Species::Hydrogen, self.bound_h)],
            last_delta_g_J_per_mol: self.last_delta_g,
            last_rates: self.last_rates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compartment::Compartment;
    use crate::constants::{rt_J_per_mol, BODY_TEMPERATURE_K};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (SimulationContext, CompartmentId, CompartmentId) {
        let mut ctx = SimulationContext::default();
        let lumen = ctx.add_compartment("lumen", Compartment::lumen()).unwrap();
        let cell = ctx.add_compartment("cell", Compartment::cell()).unwrap();
        (ctx, lumen, cell)
    }

    #[test]
    fn test_exchange_is_electroneutral() {
        let (mut ctx, lumen, cell) = setup();
        let nhe = Nhe3::new("nhe3", lumen, cell, Nhe3Config::default());
        let at_rest = nhe.free_energy(&ctx).unwrap();
        ctx.field_mut(cell).unwrap().set_membrane_potential(-150.0);
        let hyperpolarised = nhe.free_energy(&ctx).unwrap();
        assert!((at_rest - hyperpolarised).abs() < 1e-9);

        // Chemical terms only: Na+ in, H+ out
        let rt = rt_J_per_mol(BODY_TEMPERATURE_K);
        let expected = rt * (12.0_f64 / 140.0).ln() + rt * (3.98e-5_f64 / 6.36e-5).ln();
        assert!((at_rest - expected).abs() < 10.0, "ΔG = {}", at_rest);
    }

    #[test]
    fn test_forward_exchange_swaps_ions() {
        let (mut ctx, lumen, cell) = setup();
        let mut nhe = Nhe3::new("nhe3", lumen, cell, Nhe3Config::default());
        let mut rng = StdRng::seed_from_u64(17);
        let lumen_h0 = ctx.compartment(lumen).unwrap().actual(Species::Hydrogen);
        let cell_na0 = ctx.compartment(cell).unwrap().actual(Species::Sodium);
        for _ in 0..200_000 {
            nhe.advance(&mut ctx, 1e-3, &mut rng);
            assert_eq!(nhe.is_cycling(), nhe.state() == Nhe3State::Exchanging);
            if nhe.cycles_completed() > 0 {
                break;
            }
        }
        assert_eq!(nhe.cycles_completed(), 1);
        assert!(!nhe.is_cycling());
        let lumen_h = ctx.compartment(lumen).unwrap().actual(Species::Hydrogen);
        let cell_na = ctx.compartment(cell).unwrap().actual(Species::Sodium);
        // Backward events return ions to their source, so net movement is one batch
        assert!((lumen_h - lumen_h0 - 10.0).abs() < 1e-6);
        assert!((cell_na - cell_na0 - 10.0).abs() < 1e-3);
        assert_eq!(ctx.field(cell).unwrap().total_current_A(), 0.0);
        assert!(ctx.field(cell).unwrap().transporter_currents().contains_key("nhe3"));
    }
}
