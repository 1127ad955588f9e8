//! Membrane transporters of the PCT epithelium.
//!
//! Each transporter is a discrete state machine that moves fixed batches of
//! particles between compartments:
//! - Na+/K+-ATPase: 3 Na+ cell → blood, 2 K+ blood → cell, 1 ATP (basolateral)
//! - SGLT2: 1 Na+ + 1 glucose lumen → cell (apical symport)
//! - NHE3: 1 Na+ lumen → cell, 1 H+ cell → lumen (apical antiport)
//!
//! Shared lifecycle:
//! Unbound → probabilistic binding → fully bound → gated transition →
//! translocating → release → Unbound.
//!
//! Binding is Michaelis-Menten saturable: per tick the probability of
//! binding a substrate is `[S]/(Km + [S]) · k_bind · Δt`. A bound batch is
//! debited from the source immediately, so the transporter holds it off the
//! compartment books until release. Depleted pools bind less often; no
//! explicit feedback is needed.
//!
//! References:
//! - Post RL et al. J Biol Chem. 1972;247:6530-6540 (Post-Albers cycle)
//! - Wright EM, Loo DDF, Hirayama BA. Physiol Rev. 2011;91:733-794 (SGLT)
//! - Orlowski J, Grinstein S. Pflugers Arch. 2004;447:549-565 (NHE)

mod definition;
mod na_k_atpase;
mod nhe3;
mod sglt2;
pub mod thermodynamics;

pub use definition::{default_pct_table, TransporterDefinition};
pub use na_k_atpase::{NaKAtpase, NaKAtpaseConfig, PumpState};
pub use nhe3::{Nhe3, Nhe3Config, Nhe3State};
pub use sglt2::{Sglt2, Sglt2Config, Sglt2State};
pub use thermodynamics::{
    decide_transition, free_energy_J_per_mol, GateOutcome, TransitionBarrier, TransitionRates, TransportLeg,
};

use std::fmt;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::biochemistry::{event_probability, fractional_saturation};
use crate::compartment::{CompartmentId, IonPool, SimulationContext, Species};
use crate::error::ActivationError;

/// Transporter family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransporterKind {
    NaKAtpase,
    Sglt2,
    Nhe3,
}

impl fmt::Display for TransporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransporterKind::NaKAtpase => "Na+/K+-ATPase",
            TransporterKind::Sglt2 => "SGLT2",
            TransporterKind::Nhe3 => "NHE3",
        };
        f.write_str(name)
    }
}

/// A membrane transporter advanced once per tick by the simulation driver
pub trait Transporter: Send {
    /// Unique instance id, used as the current-breakdown key
    fn id(&self) -> &str;

    fn kind(&self) -> TransporterKind;

    /// Advance the state machine by `delta_sec`
    ///
    /// At most one state transition happens per call. Inert transporters do
    /// nothing.
    fn advance(&mut self, ctx: &mut SimulationContext, delta_sec: f64, rng: &mut dyn RngCore);

    /// Current state name
    fn state_name(&self) -> &'static str;

    /// Particles of `species` currently held off the compartment books
    fn bound(&self, species: Species) -> f64;

    /// Completed forward cycles
    fn cycles_completed(&self) -> u64;

    /// Whether wiring failed and the transporter is a no-op
    fn is_inert(&self) -> bool;

    /// Whether the transporter has committed to an irreversible transition
    /// sequence that ends with release to the destination
    fn is_cycling(&self) -> bool;

    /// External trigger for transporters with a committed step
    ///
    /// A refused activation leaves every compartment unchanged.
    fn activate(&mut self, _ctx: &mut SimulationContext) -> Result<(), ActivationError> {
        Err(ActivationError::NotSupported {
            kind: self.kind().to_string(),
        })
    }

    /// Snapshot for diagnostics and export
    fn diagnostics(&self) -> TransporterDiagnostics;
}

/// One substrate site: which species, from where, and how tightly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindingSite {
    pub species: Species,
    /// Compartment the substrate is bound from
    pub source: CompartmentId,
    /// Particles per transport unit
    pub stoichiometry: f64,
    /// Half-saturation constant (mM)
    pub km_mM: f64,
}

impl BindingSite {
    /// Particles bound per event for `transport_count` units
    pub fn batch(&self, transport_count: f64) -> f64 {
        self.stoichiometry * transport_count
    }

    /// Per-tick binding probability `[S]/(Km+[S]) · k_bind · Δt`
    pub fn binding_probability<P: IonPool + ?Sized>(&self, pool: &P, binding_rate_per_sec: f64, delta_sec: f64) -> f64 {
        let saturation = fractional_saturation(pool.concentration_mM(self.species), self.km_mM);
        event_probability(saturation * binding_rate_per_sec, delta_sec)
    }
}

/// Attempt one binding event
///
/// Draws first, then requires the source to hold the whole batch. A failed
/// draw or a short pool is not an error; the caller simply retries next
/// tick. Returns the bound amount on success.
pub fn try_bind(
    ctx: &mut SimulationContext,
    site: &BindingSite,
    transport_count: f64,
    binding_rate_per_sec: f64,
    delta_sec: f64,
    rng: &mut dyn RngCore,
) -> Option<f64> {
    let draw: f64 = rng.gen();
    let batch = site.batch(transport_count);
    if batch.is_nan() || batch <= 0.0 {
        return None;
    }
    let pool = ctx.compartment_mut(site.source)?;
    let p = site.binding_probability(&*pool, binding_rate_per_sec, delta_sec);
    if draw < p && pool.debit(site.species, batch) {
        Some(batch)
    } else {
        None
    }
}

/// Credit a bound amount back into a compartment
pub(crate) fn deposit(ctx: &mut SimulationContext, target: CompartmentId, species: Species, amount: f64) {
    match ctx.compartment_mut(target) {
        Some(pool) => pool.credit(species, amount),
        None => log::warn!("Dropping {:.3e} {} for missing compartment {}", amount, species, target),
    }
}

/// Timed release of a bound batch spread across ticks
///
/// Reports `batch / duration` as the ion flux for the part of each tick that
/// falls inside the release window, so the integrated charge equals the
/// batch exactly regardless of tick size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct ReleaseTimer {
    elapsed_sec: f64,
}

impl ReleaseTimer {
    const EPSILON_SEC: f64 = 1e-12;

    /// Advance by one tick; returns (ion flux per second, finished)
    pub(crate) fn step(&mut self, batch: f64, duration_sec: f64, delta_sec: f64) -> (f64, bool) {
        if delta_sec.is_nan() || delta_sec <= 0.0 {
            return (0.0, false);
        }
        if duration_sec.is_nan() || duration_sec <= 0.0 {
            self.elapsed_sec = 0.0;
            return (batch / delta_sec, true);
        }
        let remaining = (duration_sec - self.elapsed_sec).max(0.0);
        let covered = remaining.min(delta_sec);
        self.elapsed_sec += delta_sec;
        let flux = batch / duration_sec * (covered / delta_sec);
        let finished = self.elapsed_sec >= duration_sec - Self::EPSILON_SEC;
        if finished {
            self.elapsed_sec = 0.0;
        }
        (flux, finished)
    }

    pub(crate) fn reset(&mut self) {
        self.elapsed_sec = 0.0;
    }
}

/// Snapshot of one transporter
#[derive(Debug, Clone, Serialize)]
pub struct TransporterDiagnostics {
    pub id: String,
    pub kind: TransporterKind,
    pub state: &'static str,
    pub inert: bool,
    /// Committed to finishing the current cycle
    pub cycling: bool,
    pub cycles_completed: u64,
    /// Cycles aborted toward the source (backward transitions or ATP aborts)
    pub cycles_reversed: u64,
    /// Particles currently bound, by species
    pub bound: Vec<(Species, f64)>,
    /// Free energy at the last gating attempt (J/mol)
    pub last_delta_g_J_per_mol: Option<f64>,
    /// Rates at the last gating attempt
    pub last_rates: Option<TransitionRates>,
}

impl TransporterDiagnostics {
    /// Print a formatted summary
    pub fn print_summary(&self) {
        println!("--- {} ({}) ---", self.id, self.kind);
        if self.inert {
            println!("  INERT (wiring failed)");
            return;
        }
        println!("  State:            {}{}", self.state, if self.cycling { " (cycling)" } else { "" });
        println!("  Cycles completed: {}", self.cycles_completed);
        println!("  Cycles reversed:  {}", self.cycles_reversed);
        for (species, amount) in &self.bound {
            if *amount > 0.0 {
                println!("  Bound {:<5}       {:.3e}", species.symbol(), amount);
            }
        }
        if let Some(dg) = self.last_delta_g_J_per_mol {
            println!("  Last ΔG:          {:.2} kJ/mol", dg / 1000.0);
        }
        if let Some(rates) = self.last_rates {
            println!(
                "  k_fwd / k_bwd:    {:.3e} / {:.3e} /s{}",
                rates.forward_per_sec,
                rates.backward_per_sec,
                if rates.is_clamped() { " (clamped)" } else { "" }
            );
        }
    }
}
