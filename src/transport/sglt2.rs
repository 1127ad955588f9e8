//! SGLT2 sodium-glucose cotransporter on the apical membrane.
//!
//! 1 Na+ : 1 glucose symport from lumen into cell, driven by the Na+
//! electrochemical gradient. Binding is ordered (Na+ first, then glucose).
//! Once loaded, the conformational change is gated by the free energy of
//! the full cycle through transition state theory: a favourable ΔG makes
//! forward translocation likely, an unfavourable one sends both substrates
//! back to the lumen.
//!
//! References:
//! - Wright EM, Loo DDF, Hirayama BA. Physiol Rev. 2011;91:733-794
//! - Vallon V. Annu Rev Med. 2015;66:255-270 (SGLT2 in the early PCT)
//! - Parent L et al. J Membr Biol. 1992;125:49-62 (ordered binding model)

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::thermodynamics::{decide_transition, free_energy_J_per_mol, GateOutcome, TransitionBarrier, TransitionRates, TransportLeg};
use super::{deposit, try_bind, BindingSite, ReleaseTimer, Transporter, TransporterDiagnostics, TransporterKind};
use crate::compartment::{CompartmentId, IonPool, SimulationContext, Species};

/// SGLT2 kinetic parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Sglt2Config {
    /// Transporters cycling in lock-step (batch multiplier)
    pub transport_count: f64,
    /// Km for luminal Na+ (mM)
    /// Reference: Wright et al. 2011
    pub km_na_mM: f64,
    /// Km for luminal glucose (mM); SGLT2 is the low-affinity isoform
    /// Reference: Vallon 2015 (~2-5 mM)
    pub km_glucose_mM: f64,
    /// Binding rate constant at full saturation (1/s)
    pub binding_rate_per_sec: f64,
    /// Translocation and release window into the cell (s)
    pub release_duration_sec: f64,
    /// Conformational barrier for the loaded transporter
    pub barrier: TransitionBarrier,
}

impl Default for Sglt2Config {
    fn default() -> Self {
        Self {
            transport_count: 1e4,
            km_na_mM: 25.0,
            km_glucose_mM: 2.0,
            binding_rate_per_sec: 100.0,
            release_duration_sec: 0.002,
            barrier: TransitionBarrier::default(),
        }
    }
}

/// SGLT2 conformations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sglt2State {
    /// Outward-facing, empty
    Empty,
    /// Na+ bound, glucose site open
    NaBound,
    /// Both substrates bound, waiting on the thermodynamic gate
    FullyBound,
    /// Inward conformation, releasing into the cell
    Translocating,
}

impl Sglt2State {
    pub fn name(self) -> &'static str {
        match self {
            Sglt2State::Empty => "Empty",
            Sglt2State::NaBound => "Na+ bound",
            Sglt2State::FullyBound => "Fully bound",
            Sglt2State::Translocating => "Translocating",
        }
    }
}

/// A population of SGLT2 symporters cycling together
#[derive(Debug, Clone)]
pub struct Sglt2 {
    id: String,
    pub config: Sglt2Config,
    lumen: Option<CompartmentId>,
    cell: Option<CompartmentId>,
    state: Sglt2State,
    cycling: bool,
    release: ReleaseTimer,
    bound_na: f64,
    bound_glucose: f64,
    cycles_completed: u64,
    backward_transitions: u64,
    last_delta_g: Option<f64>,
    last_rates: Option<TransitionRates>,
}

impl Sglt2 {
    pub fn new(id: impl Into<String>, lumen: CompartmentId, cell: CompartmentId, config: Sglt2Config) -> Self {
        Self::wired(id.into(), Some(lumen), Some(cell), config)
    }

    pub fn inert(id: impl Into<String>, config: Sglt2Config) -> Self {
        Self::wired(id.into(), None, None, config)
    }

    fn wired(id: String, lumen: Option<CompartmentId>, cell: Option<CompartmentId>, config: Sglt2Config) -> Self {
        Self {
            id,
            config,
            lumen,
            cell,
            state: Sglt2State::Empty,
            cycling: false,
            release: ReleaseTimer::default(),
            bound_na: 0.0,
            bound_glucose: 0.0,
            cycles_completed: 0,
            backward_transitions: 0,
            last_delta_g: None,
            last_rates: None,
        }
    }

    pub fn state(&self) -> Sglt2State {
        self.state
    }

    /// Loaded transporters that returned their substrates to the lumen
    pub fn backward_transitions(&self) -> u64 {
        self.backward_transitions
    }

    /// Free energy at the last gating attempt (J/mol)
    pub fn last_delta_g(&self) -> Option<f64> {
        self.last_delta_g
    }

    pub fn last_rates(&self) -> Option<TransitionRates> {
        self.last_rates
    }

    /// Free energy of one lumen → cell cycle under current conditions (J/mol)
    ///
    /// The lumen is the potential reference, so Na+ entering the cell crosses
    /// ΔV = V_m of the cell field.
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
                species: Species::Glucose,
                stoichiometry: 1.0,
                source_mM: lumen.concentration_mM(Species::Glucose),
                destination_mM: cell.concentration_mM(Species::Glucose),
                delta_v_mV: v_m,
            },
        ];
        Some(free_energy_J_per_mol(&legs, self.config.barrier.temperature_K))
    }

    fn gate(&mut self, ctx: &mut SimulationContext, lumen: CompartmentId, delta_sec: f64, rng: &mut dyn RngCore) {
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
                self.state = Sglt2State::Translocating;
            }
            GateOutcome::Backward => {
                deposit(ctx, lumen, Species::Sodium, self.bound_na);
                deposit(ctx, lumen, Species::Glucose, self.bound_glucose);
                self.bound_na = 0.0;
                self.bound_glucose = 0.0;
                self.backward_transitions += 1;
                self.cycling = false;
                self.state = Sglt2State::Empty;
            }
            GateOutcome::Hold => {}
        }
    }
}

impl Transporter for Sglt2 {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TransporterKind {
        TransporterKind::Sglt2
    }

    fn advance(&mut self, ctx: &mut SimulationContext, delta_sec: f64, rng: &mut dyn RngCore) {
        let (lumen, cell) = match (self.lumen, self.cell) {
            (Some(lumen), Some(cell)) => (lumen, cell),
            _ => return,
        };
        if delta_sec.is_nan() || delta_sec <= 0.0 {
            return;
        }
        let count = self.config.transport_count;
        let rate = self.config.binding_rate_per_sec;

        match self.state {
            Sglt2State::Empty => {
                let site = BindingSite {
                    species: Species::Sodium,
                    source: lumen,
                    stoichiometry: 1.0,
                    km_mM: self.config.km_na_mM,
                };
                if let Some(batch) = try_bind(ctx, &site, count, rate, delta_sec, rng) {
                    self.bound_na = batch;
                    self.state = Sglt2State::NaBound;
                }
            }
            Sglt2State::NaBound => {
                let site = BindingSite {
                    species: Species::Glucose,
                    source: lumen,
                    stoichiometry: 1.0,
                    km_mM: self.config.km_glucose_mM,
                };
                if let Some(batch) = try_bind(ctx, &site, count, rate, delta_sec, rng) {
                    self.bound_glucose = batch;
                    self.state = Sglt2State::FullyBound;
                }
            }
            Sglt2State::FullyBound => self.gate(ctx, lumen, delta_sec, rng),
            Sglt2State::Translocating => {
                let (flux, done) = self.release.step(self.bound_na, self.config.release_duration_sec, delta_sec);
                // Na+ carries the charge; glucose is neutral
                ctx.add_transporter_current(cell, &self.id, flux, 1.0);
                if done {
                    deposit(ctx, cell, Species::Sodium, self.bound_na);
                    deposit(ctx, cell, Species::Glucose, self.bound_glucose);
                    self.bound_na = 0.0;
                    self.bound_glucose = 0.0;
                    self.cycles_completed += 1;
                    self.cycling = false;
                    self.state = Sglt2State::Empty;
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
            Species::Glucose => self.bound_glucose,
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
            bound: vec![(Species::Sodium, self.bound_na), (Species::Glucose, self.bound_glucose)],
            last_delta_g_J_per_mol: self.last_delta_g,
            last_rates: self.last_rates,
        }
    }
}
