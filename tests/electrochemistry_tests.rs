//! Integration tests for the electrochemical field.
//!
//! Tests verify:
//! - GHK potential for canonical cell/blood composition (≈ -70.1 mV)
//! - Dynamic potential is stable with zero current
//! - Net charge moved by transporters integrates to ΔV = Q / C

use tubule_simulator_x::constants::ELEMENTARY_CHARGE_C;
use tubule_simulator_x::electrochemistry::{ghk_potential_mV, goldman_hodgkin_katz, GhkPermeabilities};
use tubule_simulator_x::{Compartment, MembraneConfig, SimulationContext, BLOOD_ID, CELL_ID};

fn cell_and_blood() -> SimulationContext {
    let mut ctx = SimulationContext::new(MembraneConfig::default());
    let cell = ctx.add_compartment(CELL_ID, Compartment::cell()).unwrap();
    let blood = ctx.add_compartment(BLOOD_ID, Compartment::blood()).unwrap();
    assert!(ctx.set_field_reference(cell, blood));
    ctx
}

#[test]
fn test_canonical_ghk_potential() {
    let v = ghk_potential_mV(140.0, 12.0, 7.0, 5.0, 140.0, 110.0, &GhkPermeabilities::default());
    assert!((v + 70.1).abs() < 0.5, "GHK = {:.2} mV", v);
}

#[test]
fn test_ghk_from_compartments() {
    let v = goldman_hodgkin_katz(&Compartment::cell(), &Compartment::blood(), &GhkPermeabilities::default());
    assert!((v + 70.1).abs() < 0.5, "GHK = {:.2} mV", v);
}

#[test]
fn test_zero_current_voltage_is_stable() {
    let mut ctx = cell_and_blood();
    let cell = ctx.lookup(CELL_ID).unwrap();
    let v0 = ctx.membrane_potential_mV(cell).unwrap();

    for _ in 0..10_000 {
        ctx.tick_fields(1e-3);
    }

    let field = ctx.field(cell).unwrap();
    assert_eq!(field.membrane_potential_mV(), v0);
    // The GHK reference is refreshed even though nothing moves
    assert!((field.equilibrium_potential_mV() + 70.1).abs() < 0.5);
    assert!(field.drift_mV().abs() < 0.5);
}

#[test]
fn test_charge_integrates_to_voltage_step() {
    let mut ctx = cell_and_blood();
    let cell = ctx.lookup(CELL_ID).unwrap();
    let v0 = ctx.membrane_potential_mV(cell).unwrap();

    // 1e6 positive charges leave over 2 ms in 1 ms ticks
    for _ in 0..2 {
        ctx.add_transporter_current(cell, "pump", 5e8, -1.0);
        ctx.tick_fields(1e-3);
    }

    let expected_dv_mV = -1e6 * ELEMENTARY_CHARGE_C / 1e-8 * 1000.0;
    let dv = ctx.membrane_potential_mV(cell).unwrap() - v0;
    assert!((dv - expected_dv_mV).abs() < 1e-9, "ΔV = {} mV", dv);
}

#[test]
fn test_uninvolved_field_ignores_other_currents() {
    let mut ctx = cell_and_blood();
    let cell = ctx.lookup(CELL_ID).unwrap();
    let blood = ctx.lookup(BLOOD_ID).unwrap();
    ctx.add_transporter_current(cell, "pump", 1e12, -1.0);
    ctx.tick_fields(1e-3);
    assert_eq!(ctx.membrane_potential_mV(blood), Some(-70.0));
    assert!(ctx.membrane_potential_mV(cell).unwrap() < -70.0);
}
