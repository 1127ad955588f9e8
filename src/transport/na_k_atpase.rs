//! Na+/K+-ATPase on the basolateral membrane (Post-Albers cycle).
//!
//! Per cycle: 3 Na+ cell → blood, 2 K+ blood → cell, 1 ATP hydrolysed.
//! Net charge per cycle is one positive charge leaving the cell, so the pump
//! is electrogenic and hyperpolarising.
//!
//! E1 ──bind 3 Na+ (cell)──▶ E1·Na3 ──ATP──▶ E1P·Na3 (occluded, timer)
//!   ▲                                           │
//!   │                                   E2P releases Na+ to blood
//!   │                                           ▼
//! E1 releases K+ to cell ◀──timer── E2·K2 ◀──bind 2 K+ (blood)── E2P
//!
//! Phosphorylation is the commitment step. Before it, bound Na+ can still be
//! refunded to the cell if ATP never becomes available; after it, the ions
//! are committed and always complete the cycle.
//!
//! References:
//! - Post RL, Hegyvary C, Kume S. J Biol Chem. 1972;247:6530-6540
//! - Albers RW. Annu Rev Biochem. 1967;36:727-756
//! - Garrahan PJ, Glynn IM. J Physiol. 1967;192:159-174 (Km values)
//! - Läuger P. Electrogenic Ion Pumps. Sinauer, 1991

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{deposit, try_bind, BindingSite, ReleaseTimer, Transporter, TransporterDiagnostics, TransporterKind};
use crate::compartment::{CompartmentId, IonPool, SimulationContext, Species};
use crate::error::ActivationError;

/// Configuration for the Na+/K+-ATPase population
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NaKAtpaseConfig {
    /// Pumps cycling in lock-step (batch multiplier)
    pub pump_count: f64,
    /// Na+ exported per cycle
    pub na_per_cycle: f64,
    /// K+ imported per cycle
    pub k_per_cycle: f64,
    /// ATP hydrolysed per cycle
    pub atp_per_cycle: f64,
    /// Km for cytosolic Na+ (mM)
    /// Reference: Garrahan & Glynn 1967
    pub km_na_mM: f64,
    /// Km for extracellular K+ (mM)
    /// Reference: Garrahan & Glynn 1967
    pub km_k_mM: f64,
    /// Binding rate constant at full saturation (1/s)
    pub binding_rate_per_sec: f64,
    /// E1P·Na3 occlusion time before Na+ release (s)
    pub phosphorylation_duration_sec: f64,
    /// Na+ release window on the blood side (s)
    pub na_release_duration_sec: f64,
    /// E2·K2 dephosphorylation/occlusion time (s)
    pub occlusion_duration_sec: f64,
    /// K+ release window on the cell side (s)
    pub k_release_duration_sec: f64,
    /// Phosphorylate without an external `activate()` call
    pub auto_activate: bool,
    /// How long an autonomous pump waits for ATP before aborting (s)
    pub atp_wait_timeout_sec: f64,
}

impl Default for NaKAtpaseConfig {
    fn default() -> Self {
        Self {
            pump_count: 1e6,
            na_per_cycle: 3.0,
            k_per_cycle: 2.0,
            atp_per_cycle: 1.0,
            km_na_mM: 15.0,
            km_k_mM: 1.5,
            // Turnover ~100 /s at saturation (Läuger 1991)
            binding_rate_per_sec: 200.0,
            phosphorylation_duration_sec: 0.002,
            na_release_duration_sec: 0.002,
            occlusion_duration_sec: 0.003,
            k_release_duration_sec: 0.002,
            auto_activate: true,
            atp_wait_timeout_sec: 0.05,
        }
    }
}

/// Post-Albers conformations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PumpState {
    /// Inward-facing, empty, high Na+ affinity
    E1,
    /// 3 Na+ bound, awaiting phosphorylation
    E1Na3,
    /// Phosphorylated, Na+ occluded
    E1PNa3,
    /// Outward-facing, releasing Na+ to blood
    E2PReleasingNa,
    /// Outward-facing, empty, high K+ affinity
    E2P,
    /// 2 K+ bound, dephosphorylating
    E2K2,
    /// Inward-facing, releasing K+ to cell
    E1ReleasingK,
}

impl PumpState {
    pub fn name(self) -> &'static str {
        match self {
            PumpState::E1 => "E1",
            PumpState::E1Na3 => "E1·Na3",
            PumpState::E1PNa3 => "E1P·Na3",
            PumpState::E2PReleasingNa => "E2P releasing Na+",
            PumpState::E2P => "E2P",
            PumpState::E2K2 => "E2·K2",
            PumpState::E1ReleasingK => "E1 releasing K+",
        }
    }
}

/// A population of Na+/K+-ATPase pumps cycling together
#[derive(Debug, Clone)]
pub struct NaKAtpase {
    id: String,
    pub config: NaKAtpaseConfig,
    cell: Option<CompartmentId>,
    blood: Option<CompartmentId>,
    state: PumpState,
    state_timer_sec: f64,
    atp_wait_sec: f64,
    /// Committed to the phosphorylated half of the cycle
    cycling: bool,
    release: ReleaseTimer,
    bound_na: f64,
    bound_k: f64,
    cycles_completed: u64,
    cycles_aborted: u64,
    atp_consumed: f64,
}

impl NaKAtpase {
    /// Create a pump population between the cell and blood compartments
    pub fn new(id: impl Into<String>, cell: CompartmentId, blood: CompartmentId, config: NaKAtpaseConfig) -> Self {
        Self::wired(id.into(), Some(cell), Some(blood), config)
    }

    /// A pump whose compartments could not be resolved
    pub fn inert(id: impl Into<String>, config: NaKAtpaseConfig) -> Self {
        Self::wired(id.into(), None, None, config)
    }

    fn wired(id: String, cell: Option<CompartmentId>, blood: Option<CompartmentId>, config: NaKAtpaseConfig) -> Self {
        Self {
            id,
            config,
            cell,
            blood,
            state: PumpState::E1,
            state_timer_sec: 0.0,
            atp_wait_sec: 0.0,
            cycling: false,
            release: ReleaseTimer::default(),
            bound_na: 0.0,
            bound_k: 0.0,
            cycles_completed: 0,
            cycles_aborted: 0,
            atp_consumed: 0.0,
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    /// Cycles aborted for lack of ATP
    pub fn cycles_aborted(&self) -> u64 {
        self.cycles_aborted
    }

    /// Total ATP hydrolysed (molecules)
    pub fn atp_consumed(&self) -> f64 {
        self.atp_consumed
    }

    fn atp_required(&self) -> f64 {
        self.config.atp_per_cycle * self.config.pump_count
    }

    /// ATP check and debit; the only way into E1P·Na3
    fn phosphorylate(&mut self, ctx: &mut SimulationContext, cell: CompartmentId) -> Result<(), ActivationError> {
        if self.state != PumpState::E1Na3 {
            return Err(ActivationError::WrongState {
                expected: PumpState::E1Na3.name(),
                actual: self.state.name(),
            });
        }
        let required = self.atp_required();
        let pool = ctx
            .compartment_mut(cell)
            .ok_or_else(|| ActivationError::Inert(self.id.clone()))?;
        let available = pool.actual(Species::Atp);
        if !pool.debit(Species::Atp, required) {
            return Err(ActivationError::InsufficientAtp { available, required });
        }
        self.atp_consumed += required;
        self.atp_wait_sec = 0.0;
        self.state_timer_sec = 0.0;
        self.cycling = true;
        self.state = PumpState::E1PNa3;
        log::debug!("{}: phosphorylated, {:.3e} Na+ occluded", self.id, self.bound_na);
        Ok(())
    }

    /// Return bound Na+ to the cell and reset to E1
    fn abort_to_e1(&mut self, ctx: &mut SimulationContext, cell: CompartmentId) {
        log::warn!(
            "{}: no ATP for {:.3} s, aborting cycle and returning {:.3e} Na+ to the cell",
            self.id,
            self.atp_wait_sec,
            self.bound_na
        );
        deposit(ctx, cell, Species::Sodium, self.bound_na);
        self.bound_na = 0.0;
        self.atp_wait_sec = 0.0;
        self.cycles_aborted += 1;
        self.cycling = false;
        self.state = PumpState::E1;
    }

    fn timer_elapsed(&mut self, duration_sec: f64, delta_sec: f64) -> bool {
        self.state_timer_sec += delta_sec;
        if self.state_timer_sec >= duration_sec {
            self.state_timer_sec = 0.0;
            true
        } else {
            false
        }
    }
}

impl Transporter for NaKAtpase {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TransporterKind {
        TransporterKind::NaKAtpase
    }

    fn advance(&mut self, ctx: &mut SimulationContext, delta_sec: f64, rng: &mut dyn RngCore) {
        let (cell, blood) = match (self.cell, self.blood) {
            (Some(cell), Some(blood)) => (cell, blood),
            _ => return,
        };
        if delta_sec.is_nan() || delta_sec <= 0.0 {
            return;
        }

        match self.state {
            PumpState::E1 => {
                let site = BindingSite {
                    species: Species::Sodium,
                    source: cell,
                    stoichiometry: self.config.na_per_cycle,
                    km_mM: self.config.km_na_mM,
                };
                let rate = self.config.binding_rate_per_sec;
                if let Some(batch) = try_bind(ctx, &site, self.config.pump_count, rate, delta_sec, rng) {
                    self.bound_na = batch;
                    self.atp_wait_sec = 0.0;
                    self.state = PumpState::E1Na3;
                }
            }
            PumpState::E1Na3 => {
                if !self.config.auto_activate {
                    return;
                }
                if let Err(err) = self.phosphorylate(ctx, cell) {
                    self.atp_wait_sec += delta_sec;
                    log::debug!("{}: waiting for ATP ({})", self.id, err);
                    if self.atp_wait_sec >= self.config.atp_wait_timeout_sec {
                        self.abort_to_e1(ctx, cell);
                    }
                }
            }
            PumpState::E1PNa3 => {
                if self.timer_elapsed(self.config.phosphorylation_duration_sec, delta_sec) {
                    self.release.reset();
                    self.state = PumpState::E2PReleasingNa;
                }
            }
            PumpState::E2PReleasingNa => {
                let (flux, done) = self.release.step(self.bound_na, self.config.na_release_duration_sec, delta_sec);
                // Na+ leaving the cell
                ctx.add_transporter_current(cell, &self.id, flux, -1.0);
                if done {
                    deposit(ctx, blood, Species::Sodium, self.bound_na);
                    self.bound_na = 0.0;
                    self.state = PumpState::E2P;
                }
            }
            PumpState::E2P => {
                let site = BindingSite {
                    species: Species::Potassium,
                    source: blood,
                    stoichiometry: self.config.k_per_cycle,
                    km_mM: self.config.km_k_mM,
                };
                let rate = self.config.binding_rate_per_sec;
                if let Some(batch) = try_bind(ctx, &site, self.config.pump_count, rate, delta_sec, rng) {
                    self.bound_k = batch;
                    self.state_timer_sec = 0.0;
                    self.state = PumpState::E2K2;
                }
            }
            PumpState::E2K2 => {
                if self.timer_elapsed(self.config.occlusion_duration_sec, delta_sec) {
                    self.release.reset();
                    self.state = PumpState::E1ReleasingK;
                }
            }
            PumpState::E1ReleasingK => {
                let (flux, done) = self.release.step(self.bound_k, self.config.k_release_duration_sec, delta_sec);
                ctx.add_transporter_current(cell, &self.id, flux, 1.0);
                if done {
                    deposit(ctx, cell, Species::Potassium, self.bound_k);
                    self.bound_k = 0.0;
                    self.cycles_completed += 1;
                    self.cycling = false;
                    self.state = PumpState::E1;
                    log::debug!("{}: cycle {} complete", self.id, self.cycles_completed);
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
            Species::Potassium => self.bound_k,
            _ => 0.0,
        }
    }

    fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    fn is_inert(&self) -> bool {
        self.cell.is_none() || self.blood.is_none()
    }

    /// True from phosphorylation until K+ is released into the cell
    fn is_cycling(&self) -> bool {
        self.cycling
    }

    /// Phosphorylate the Na+-loaded pump
    ///
    /// Requires state E1·Na3 and enough ATP in the cell. On failure nothing
    /// changes and the reason is returned.
    fn activate(&mut self, ctx: &mut SimulationContext) -> Result<(), ActivationError> {
        let cell = match (self.cell, self.blood) {
            (Some(cell), Some(_)) => cell,
            _ => return Err(ActivationError::Inert(self.id.clone())),
        };
        self.phosphorylate(ctx, cell)
    }

    fn diagnostics(&self) -> TransporterDiagnostics {
        TransporterDiagnostics {
            id: self.id.clone(),
            kind: self.kind(),
            state: self.state.name(),
            inert: self.is_inert(),
            cycling: self.cycling,
            cycles_completed: self.cycles_completed,
            cycles_reversed: self.cycles_aborted,
            bound: vec![(Species::Sodium, self.bound_na), (Species::Potassium, self.bound_k)],
            last_delta_g_J_per_mol: None,
            last_rates: None,
        }
    }
}
