//! Tick driver for one PCT epithelial patch.
//!
//! `TubuleSimulation` owns a [`SimulationContext`], the buffer chemistry of
//! every compartment and the transporter population, and advances them in a
//! fixed order each tick:
//!
//! 1. carbonic anhydrase, per compartment
//! 2. carbonic acid dissociation, per compartment
//! 3. transporters, in table order (later transporters see earlier
//!    transporters' mutations within the same tick)
//! 4. field integration
//! 5. change notifications for compartments whose counts changed
//!
//! Simulated time is explicit: nothing advances unless [`TubuleSimulation::advance`]
//! is called.

mod diagnostics;

pub use diagnostics::TubuleDiagnostics;

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::biochemistry::{CarbonicAcidEquilibrium, CarbonicAnhydrase, CompartmentReaction};
use crate::compartment::{CompartmentId, IonPool, SimulationContext, Species, BLOOD_ID, CELL_ID, LUMEN_ID};
use crate::config::Parameters;
use crate::error::{ActivationError, TransportError};
use crate::state::SimulationMetrics;
use crate::transport::Transporter;

/// A reaction bound to the compartment it runs in
struct ReactionSlot {
    compartment: CompartmentId,
    reaction: Box<dyn CompartmentReaction>,
}

/// One simulated tubule patch
pub struct TubuleSimulation {
    ctx: SimulationContext,
    reactions: Vec<ReactionSlot>,
    transporters: Vec<Box<dyn Transporter>>,
    rng: StdRng,
    dt_sec: f64,
    time_sec: f64,
    steps: u64,
    initial_lumen_na: f64,
    initial_lumen_glucose: f64,
}

impl TubuleSimulation {
    /// Build compartments, chemistry and transporters from parameters
    ///
    /// Fails only on a duplicate compartment id; unresolved transporter
    /// wiring yields inert transporters instead.
    pub fn new(params: &Parameters) -> Result<Self, TransportError> {
        let mut ctx = SimulationContext::new(params.membrane.clone());
        let debug_scale = params.compartments.debug_scale;

        for spec in &params.compartments.specs {
            ctx.add_compartment(spec.id.clone(), spec.build(debug_scale))?;
        }
        for spec in &params.compartments.specs {
            let reference = match &spec.reference {
                Some(reference) => reference,
                None => continue,
            };
            let inside = ctx.registry().resolve(&spec.id)?;
            match ctx.lookup(reference) {
                Some(outside) => {
                    ctx.set_field_reference(inside, outside);
                }
                None => log::warn!(
                    "Compartment {} references unknown compartment {}; no GHK reference",
                    spec.id,
                    reference
                ),
            }
        }

        let mut reactions = Vec::new();
        if params.chemistry.enabled {
            let ids: Vec<CompartmentId> = ctx.compartment_ids().collect();
            for &id in &ids {
                reactions.push(ReactionSlot {
                    compartment: id,
                    reaction: Box::new(CarbonicAnhydrase::new(params.chemistry.anhydrase.clone())),
                });
            }
            for &id in &ids {
                reactions.push(ReactionSlot {
                    compartment: id,
                    reaction: Box::new(CarbonicAcidEquilibrium::new(params.chemistry.carbonic_acid.clone())),
                });
            }
        }

        let mut seen = HashSet::new();
        let mut transporters = Vec::new();
        for definition in &params.transporters.transporters {
            if !seen.insert(definition.id().to_string()) {
                log::warn!("Duplicate transporter id {}; currents will be merged", definition.id());
            }
            transporters.push(definition.build(&ctx));
        }

        let rng = match params.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let lumen = ctx.compartment_by_name(LUMEN_ID);
        let initial_lumen_na = lumen.map(|c| c.actual(Species::Sodium)).unwrap_or(0.0);
        let initial_lumen_glucose = lumen.map(|c| c.actual(Species::Glucose)).unwrap_or(0.0);

        log::info!(
            "Tubule simulation ready: {} compartments, {} reactions, {} transporters",
            ctx.len(),
            reactions.len(),
            transporters.len()
        );

        Ok(Self {
            ctx,
            reactions,
            transporters,
            rng,
            dt_sec: params.simulation.dt_sec,
            time_sec: 0.0,
            steps: 0,
            initial_lumen_na,
            initial_lumen_glucose,
        })
    }

    /// Default PCT layout and kinetics
    pub fn with_defaults() -> Result<Self, TransportError> {
        Self::new(&Parameters::default())
    }

    /// Advance every component by `delta_sec`
    pub fn advance(&mut self, delta_sec: f64) {
        if delta_sec.is_nan() || delta_sec <= 0.0 {
            log::warn!("Ignoring non-positive tick {}", delta_sec);
            return;
        }

        for slot in self.reactions.iter_mut() {
            if let Some(pool) = self.ctx.compartment_mut(slot.compartment) {
                slot.reaction.react(pool, delta_sec);
            }
        }

        for transporter in self.transporters.iter_mut() {
            transporter.advance(&mut self.ctx, delta_sec, &mut self.rng);
        }

        self.ctx.tick_fields(delta_sec);
        self.ctx.flush_notifications();

        self.time_sec += delta_sec;
        self.steps += 1;
    }

    /// Advance by the configured tick length
    pub fn step(&mut self) {
        self.advance(self.dt_sec);
    }

    /// Run for `duration_sec` of simulated time; returns ticks executed
    pub fn run(&mut self, duration_sec: f64) -> u64 {
        if self.dt_sec.is_nan() || self.dt_sec <= 0.0 || !duration_sec.is_finite() {
            return 0;
        }
        let n = (duration_sec / self.dt_sec).round().max(0.0) as u64;
        for _ in 0..n {
            self.step();
        }
        n
    }

    /// Forward an activation request to the transporter with `id`
    pub fn activate(&mut self, id: &str) -> Result<(), ActivationError> {
        let transporter = self
            .transporters
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or_else(|| ActivationError::UnknownTransporter(id.to_string()))?;
        transporter.activate(&mut self.ctx)
    }

    pub fn transporter(&self, id: &str) -> Option<&dyn Transporter> {
        self.transporters.iter().find(|t| t.id() == id).map(|t| t.as_ref())
    }

    pub fn transporters(&self) -> impl Iterator<Item = &dyn Transporter> + '_ {
        self.transporters.iter().map(|t| t.as_ref())
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.ctx
    }

    /// Register a change subscriber on the underlying context
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(CompartmentId) + Send + 'static,
    {
        self.ctx.subscribe(subscriber);
    }

    /// Count of a species across compartments plus everything transporters
    /// currently hold
    pub fn total_count(&self, species: Species) -> f64 {
        let bound: f64 = self.transporters.iter().map(|t| t.bound(species)).sum();
        self.ctx.total_count(species) + bound
    }

    pub fn time_sec(&self) -> f64 {
        self.time_sec
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn dt_sec(&self) -> f64 {
        self.dt_sec
    }

    /// Flat snapshot of the current state
    pub fn metrics(&self) -> SimulationMetrics {
        let mut m = SimulationMetrics::new();
        m.simulation_time_sec = self.time_sec;
        m.total_steps = self.steps;

        let conc = |name: &str, species: Species| {
            self.ctx
                .compartment_by_name(name)
                .map(|c| c.get_concentration(species))
                .unwrap_or(0.0)
        };
        let ph = |name: &str| self.ctx.compartment_by_name(name).map(|c| c.ph()).unwrap_or(7.4);

        m.cell_na_mM = conc(CELL_ID, Species::Sodium);
        m.cell_k_mM = conc(CELL_ID, Species::Potassium);
        m.cell_glucose_mM = conc(CELL_ID, Species::Glucose);
        m.cell_atp_mM = conc(CELL_ID, Species::Atp);
        m.cell_ph = ph(CELL_ID);

        m.lumen_na_mM = conc(LUMEN_ID, Species::Sodium);
        m.lumen_glucose_mM = conc(LUMEN_ID, Species::Glucose);
        m.lumen_hco3_mM = conc(LUMEN_ID, Species::Bicarbonate);
        m.lumen_ph = ph(LUMEN_ID);

        m.blood_na_mM = conc(BLOOD_ID, Species::Sodium);
        m.blood_k_mM = conc(BLOOD_ID, Species::Potassium);
        m.blood_glucose_mM = conc(BLOOD_ID, Species::Glucose);

        if let Some(field) = self.ctx.lookup(CELL_ID).and_then(|id| self.ctx.field(id)) {
            m.membrane_potential_mV = field.membrane_potential_mV();
            m.ghk_potential_mV = field.equilibrium_potential_mV();
            m.drift_mV = field.drift_mV();
            m.net_current_A = field.last_total_current_A();
            m.transporter_currents_A = field.last_transporter_currents().clone();
        }

        for t in &self.transporters {
            m.transporter_cycles.insert(t.id().to_string(), t.cycles_completed());
        }

        if let Some(lumen) = self.ctx.compartment_by_name(LUMEN_ID) {
            m.na_reabsorbed_fraction = depletion(self.initial_lumen_na, lumen.actual(Species::Sodium));
            m.glucose_reabsorbed_fraction = depletion(self.initial_lumen_glucose, lumen.actual(Species::Glucose));
        }

        m.update_status();
        m
    }

    /// Metrics plus per-transporter detail and conservation totals
    pub fn diagnostics(&self) -> TubuleDiagnostics {
        TubuleDiagnostics {
            metrics: self.metrics(),
            transporters: self.transporters.iter().map(|t| t.diagnostics()).collect(),
            total_na: self.total_count(Species::Sodium),
            total_k: self.total_count(Species::Potassium),
            total_glucose: self.total_count(Species::Glucose),
            min_count: self.min_count(),
        }
    }

    /// Smallest particle count in any compartment
    fn min_count(&self) -> f64 {
        self.ctx
            .compartment_ids()
            .filter_map(|id| self.ctx.compartment(id))
            .flat_map(|c| Species::ALL.iter().map(move |&s| c.actual(s)))
            .fold(f64::INFINITY, f64::min)
    }
}

fn depletion(initial: f64, current: f64) -> f64 {
    if initial > 0.0 {
        (initial - current) / initial
    } else {
        0.0
    }
}
