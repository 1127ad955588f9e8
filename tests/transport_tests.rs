//! Integration tests for the transporter state machines.
//!
//! Tests verify:
//! - Na+/K+-ATPase end-to-end stoichiometry (3 Na+ out, 2 K+ in, 1 ATP)
//! - ATP gating: refused activation leaves every count unchanged
//! - SGLT2 end-to-end: downhill ΔG, forward fires, forward:backward ≈ exp(-ΔG/RT)
//! - Detailed balance of the rate law over ΔG ∈ [-50, 50] kJ/mol
//! - NHE3 exchanges Na+ for H+ without net charge

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tubule_simulator_x::constants::{rt_J_per_mol, BODY_TEMPERATURE_K, ELEMENTARY_CHARGE_C};
use tubule_simulator_x::transport::{
    decide_transition, GateOutcome, NaKAtpaseConfig, Nhe3Config, PumpState, Sglt2Config, Sglt2State,
    TransitionBarrier,
};
use tubule_simulator_x::{
    ActivationError, Compartment, CompartmentId, CompartmentKind, IonPool, NaKAtpase, Nhe3, Sglt2,
    SimulationContext, Species, Transporter,
};

const DT: f64 = 1e-3;

/// Cell 2 pL (12 mM Na+, 140 mM K+), blood 5 pL (140 mM Na+, 5 mM K+)
fn pump_context(atp_mM: f64) -> (SimulationContext, CompartmentId, CompartmentId) {
    let mut ctx = SimulationContext::default();
    let mut cell = Compartment::new(CompartmentKind::Cell, 2e-12);
    cell.set_concentration(Species::Sodium, 12.0);
    cell.set_concentration(Species::Potassium, 140.0);
    cell.set_concentration(Species::Atp, atp_mM);
    let mut blood = Compartment::new(CompartmentKind::Blood, 5e-12);
    blood.set_concentration(Species::Sodium, 140.0);
    blood.set_concentration(Species::Potassium, 5.0);
    let cell = ctx.add_compartment("cell", cell).unwrap();
    let blood = ctx.add_compartment("blood", blood).unwrap();
    (ctx, cell, blood)
}

fn apical_context() -> (SimulationContext, CompartmentId, CompartmentId) {
    let mut ctx = SimulationContext::default();
    let lumen = ctx.add_compartment("lumen", Compartment::lumen()).unwrap();
    let cell = ctx.add_compartment("cell", Compartment::cell()).unwrap();
    (ctx, lumen, cell)
}

fn count(ctx: &SimulationContext, id: CompartmentId, species: Species) -> f64 {
    ctx.compartment(id).unwrap().actual(species)
}

fn manual_pump(cell: CompartmentId, blood: CompartmentId) -> NaKAtpase {
    NaKAtpase::new(
        "pump",
        cell,
        blood,
        NaKAtpaseConfig {
            auto_activate: false,
            ..Default::default()
        },
    )
}

fn advance_until<F>(t: &mut dyn Transporter, ctx: &mut SimulationContext, rng: &mut StdRng, done: F)
where
    F: Fn(&dyn Transporter) -> bool,
{
    for _ in 0..1_000_000 {
        if done(&*t) {
            return;
        }
        t.advance(ctx, DT, rng);
        ctx.tick_fields(DT);
    }
    panic!("{} stuck in {}", t.id(), t.state_name());
}

// ============================================================================
// Na+/K+-ATPase
// ============================================================================

#[test]
fn test_pump_end_to_end_stoichiometry() {
    let (mut ctx, cell, blood) = pump_context(4.0);
    let mut pump = manual_pump(cell, blood);
    let mut rng = StdRng::seed_from_u64(42);

    let na_cell0 = count(&ctx, cell, Species::Sodium);
    let na_blood0 = count(&ctx, blood, Species::Sodium);
    let k_cell0 = count(&ctx, cell, Species::Potassium);
    let k_blood0 = count(&ctx, blood, Species::Potassium);
    let atp0 = count(&ctx, cell, Species::Atp);
    let v0 = ctx.membrane_potential_mV(cell).unwrap();

    advance_until(&mut pump, &mut ctx, &mut rng, |t| t.state_name() == PumpState::E1Na3.name());
    pump.activate(&mut ctx).unwrap();
    advance_until(&mut pump, &mut ctx, &mut rng, |t| t.cycles_completed() == 1);

    assert!((na_cell0 - count(&ctx, cell, Species::Sodium) - 3e6).abs() < 1e-2);
    assert!((count(&ctx, blood, Species::Sodium) - na_blood0 - 3e6).abs() < 1e-2);
    assert!((count(&ctx, cell, Species::Potassium) - k_cell0 - 2e6).abs() < 1e-2);
    assert!((k_blood0 - count(&ctx, blood, Species::Potassium) - 2e6).abs() < 1e-2);
    assert!((atp0 - count(&ctx, cell, Species::Atp) - 1e6).abs() < 1e-2);
    assert_eq!(pump.atp_consumed(), 1e6);

    // Net one positive charge out per pump
    let expected_dv_mV = -1e6 * ELEMENTARY_CHARGE_C / 1e-8 * 1000.0;
    let dv = ctx.membrane_potential_mV(cell).unwrap() - v0;
    assert!((dv / expected_dv_mV - 1.0).abs() < 1e-6, "ΔV = {} mV", dv);
}

#[test]
fn test_activation_without_atp_is_noop() {
    let (mut ctx, cell, blood) = pump_context(0.0);
    let mut pump = manual_pump(cell, blood);
    let mut rng = StdRng::seed_from_u64(8);
    advance_until(&mut pump, &mut ctx, &mut rng, |t| t.state_name() == PumpState::E1Na3.name());

    let snapshot: Vec<f64> = [cell, blood]
        .iter()
        .flat_map(|&id| Species::ALL.iter().map(move |&s| (id, s)))
        .map(|(id, s)| count(&ctx, id, s))
        .collect();

    let err = pump.activate(&mut ctx).unwrap_err();
    assert!(matches!(err, ActivationError::InsufficientAtp { .. }));
    assert_eq!(pump.state(), PumpState::E1Na3);

    let after: Vec<f64> = [cell, blood]
        .iter()
        .flat_map(|&id| Species::ALL.iter().map(move |&s| (id, s)))
        .map(|(id, s)| count(&ctx, id, s))
        .collect();
    assert_eq!(snapshot, after);
}

#[test]
fn test_atp_starved_pump_conserves_sodium() {
    let (mut ctx, cell, blood) = pump_context(0.0);
    let mut pump = NaKAtpase::new("pump", cell, blood, NaKAtpaseConfig::default());
    let mut rng = StdRng::seed_from_u64(99);
    let na_total0 = ctx.total_count(Species::Sodium);

    for _ in 0..2_000 {
        pump.advance(&mut ctx, DT, &mut rng);
        ctx.tick_fields(DT);
        let na_total = ctx.total_count(Species::Sodium) + pump.bound(Species::Sodium);
        assert!((na_total - na_total0).abs() < 1e-2);
    }

    assert!(pump.cycles_aborted() > 0);
    assert_eq!(pump.cycles_completed(), 0);
    assert_eq!(count(&ctx, cell, Species::Atp), 0.0);
}

#[test]
fn test_autonomous_pump_keeps_cycling() {
    let (mut ctx, cell, blood) = pump_context(4.0);
    let mut pump = NaKAtpase::new("pump", cell, blood, NaKAtpaseConfig::default());
    let mut rng = StdRng::seed_from_u64(1);
    let atp0 = count(&ctx, cell, Species::Atp);

    for _ in 0..1_000 {
        pump.advance(&mut ctx, DT, &mut rng);
        ctx.tick_fields(DT);
    }

    let cycles = pump.cycles_completed();
    assert!(cycles > 5, "only {} cycles in 1 s", cycles);
    // Every started cycle consumed exactly one batch of ATP
    let consumed = atp0 - count(&ctx, cell, Species::Atp);
    assert!((consumed - pump.atp_consumed()).abs() < 1e-2);
    assert!(pump.atp_consumed() >= cycles as f64 * 1e6);
}

// ============================================================================
// SGLT2
// ============================================================================

/// Lumen and cell at equal glucose, so only the Na+ leg drives the cycle
fn equal_glucose_context() -> (SimulationContext, CompartmentId, CompartmentId) {
    let (mut ctx, lumen, cell) = apical_context();
    ctx.compartment_mut(cell).unwrap().set_concentration(Species::Glucose, 5.0);
    (ctx, lumen, cell)
}

#[test]
fn test_sglt2_downhill_cycle_completes() {
    let (mut ctx, lumen, cell) = equal_glucose_context();
    let mut sglt = Sglt2::new("sglt2", lumen, cell, Sglt2Config::default());
    let mut rng = StdRng::seed_from_u64(5);

    let dg = sglt.free_energy(&ctx).unwrap();
    // 140 → 12 mM Na+ into a cell at -70 mV
    assert!((dg + 13_090.0).abs() < 100.0, "ΔG = {} J/mol", dg);

    let glucose_cell0 = count(&ctx, cell, Species::Glucose);
    let glucose_lumen0 = count(&ctx, lumen, Species::Glucose);
    advance_until(&mut sglt, &mut ctx, &mut rng, |t| t.cycles_completed() >= 1);

    assert_eq!(sglt.state(), Sglt2State::Empty);
    // Backward transitions hand glucose back, so exactly one batch moved
    assert!((count(&ctx, cell, Species::Glucose) - glucose_cell0 - 1e4).abs() < 1e-3);
    assert!((glucose_lumen0 - count(&ctx, lumen, Species::Glucose) - 1e4).abs() < 1e-3);
    assert!(sglt.last_rates().unwrap().forward_per_sec > sglt.last_rates().unwrap().backward_per_sec);
}

#[test]
fn test_sglt2_forward_backward_ratio() {
    let (mut ctx, lumen, cell) = equal_glucose_context();
    // One transporter per cycle keeps concentrations effectively constant
    let config = Sglt2Config {
        transport_count: 1.0,
        ..Default::default()
    };
    let mut sglt = Sglt2::new("sglt2", lumen, cell, config);
    let mut rng = StdRng::seed_from_u64(2024);

    let rt = rt_J_per_mol(BODY_TEMPERATURE_K);
    let dg = sglt.free_energy(&ctx).unwrap();
    let expected = (-dg / rt).exp();
    assert!(expected > 100.0 && expected < 250.0, "expected ratio {}", expected);

    for _ in 0..3_000_000 {
        sglt.advance(&mut ctx, DT, &mut rng);
        if sglt.cycles_completed() >= 20_000 {
            break;
        }
    }

    let forward = sglt.cycles_completed() as f64;
    let backward = sglt.backward_transitions() as f64;
    assert!(forward >= 20_000.0);
    assert!(backward > 0.0, "no backward transitions observed");
    let observed = forward / backward;
    assert!(
        observed > 0.6 * expected && observed < 1.6 * expected,
        "observed {:.1}, expected {:.1}",
        observed,
        expected
    );
}

#[test]
fn test_sglt2_inert_without_wiring() {
    let (mut ctx, _, _) = apical_context();
    let mut sglt = Sglt2::inert("sglt2", Sglt2Config::default());
    let mut rng = StdRng::seed_from_u64(0);
    let glucose0 = ctx.total_count(Species::Glucose);
    for _ in 0..100 {
        sglt.advance(&mut ctx, DT, &mut rng);
    }
    assert!(sglt.is_inert());
    assert_eq!(ctx.total_count(Species::Glucose), glucose0);
}

// ============================================================================
// Thermodynamic gate
// ============================================================================

#[test]
fn test_detailed_balance_over_range() {
    let barrier = TransitionBarrier::default();
    let rt = rt_J_per_mol(barrier.temperature_K);

    for step in -10..=10 {
        let dg = step as f64 * 5_000.0;
        let rates = barrier.rates(dg);
        let boltzmann = (-dg / rt).exp();

        let unclamped = rates.unclamped_forward_per_sec / rates.unclamped_backward_per_sec;
        assert!((unclamped / boltzmann - 1.0).abs() < 1e-9, "ΔG = {}", dg);

        if !rates.is_clamped() {
            assert!((rates.ratio() / boltzmann - 1.0).abs() < 1e-9, "ΔG = {}", dg);
        }
        assert!(rates.forward_per_sec >= barrier.min_rate_per_sec);
        assert!(rates.forward_per_sec <= barrier.max_rate_per_sec);
    }
}

#[test]
fn test_gate_event_ratio_matches_rates() {
    let barrier = TransitionBarrier::default();
    let rates = barrier.rates(-5_000.0);
    assert!(!rates.is_clamped());

    let mut rng = StdRng::seed_from_u64(77);
    let (mut forward, mut backward) = (0u64, 0u64);
    for _ in 0..2_000_000 {
        match decide_transition(&rates, DT, rng.gen()) {
            GateOutcome::Forward => forward += 1,
            GateOutcome::Backward => backward += 1,
            GateOutcome::Hold => {}
        }
    }

    let observed = forward as f64 / backward as f64;
    assert!((observed / rates.ratio() - 1.0).abs() < 0.05, "observed {}", observed);
}

// ============================================================================
// NHE3
// ============================================================================

#[test]
fn test_nhe3_conserves_sodium_and_protons() {
    let (mut ctx, lumen, cell) = apical_context();
    let mut nhe = Nhe3::new("nhe3", lumen, cell, Nhe3Config::default());
    let mut rng = StdRng::seed_from_u64(31);

    let na0 = ctx.total_count(Species::Sodium);
    let h0 = ctx.total_count(Species::Hydrogen);
    let v0 = ctx.membrane_potential_mV(cell).unwrap();

    for _ in 0..50_000 {
        nhe.advance(&mut ctx, DT, &mut rng);
        ctx.tick_fields(DT);
        let na = ctx.total_count(Species::Sodium) + nhe.bound(Species::Sodium);
        let h = ctx.total_count(Species::Hydrogen) + nhe.bound(Species::Hydrogen);
        assert!((na - na0).abs() < 1e-2);
        assert!((h - h0).abs() < 1e-6);
    }

    assert!(nhe.cycles_completed() > 0);
    // Electroneutral: the membrane potential never moves
    assert_eq!(ctx.membrane_potential_mV(cell).unwrap(), v0);
}
