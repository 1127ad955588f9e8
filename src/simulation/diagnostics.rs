//! Diagnostic summary and physiological sanity checks.

use serde::Serialize;

use crate::state::{SimulationMetrics, TubuleStatus};
use crate::transport::TransporterDiagnostics;

/// Tolerance below zero before a count is reported as negative
const NEGATIVE_COUNT_TOLERANCE: f64 = -1e-6;

/// Full diagnostic snapshot of a tubule simulation
#[derive(Debug, Clone, Serialize)]
pub struct TubuleDiagnostics {
    pub metrics: SimulationMetrics,
    pub transporters: Vec<TransporterDiagnostics>,
    /// Na+ in all compartments plus bound on transporters
    pub total_na: f64,
    /// K+ in all compartments plus bound on transporters
    pub total_k: f64,
    /// Glucose in all compartments plus bound on transporters
    pub total_glucose: f64,
    /// Smallest count of any species in any compartment
    pub min_count: f64,
}

impl TubuleDiagnostics {
    /// Print a formatted summary
    pub fn print_summary(&self) {
        let m = &self.metrics;
        println!("=== PCT Epithelium ===");
        println!("Time: {:.3} s ({} steps)  Status: {:?}", m.simulation_time_sec, m.total_steps, m.status);
        println!();
        println!("Cell:");
        println!("  Na+:      {:.2} mM (target: 10-20 mM)", m.cell_na_mM);
        println!("  K+:       {:.2} mM (target: 120-145 mM)", m.cell_k_mM);
        println!("  Glucose:  {:.3} mM", m.cell_glucose_mM);
        println!("  ATP:      {:.3} mM (target: 2-5 mM)", m.cell_atp_mM);
        println!("  pH:       {:.3} (target: 7.1-7.3)", m.cell_ph);
        println!();
        println!("Lumen:");
        println!("  Na+:      {:.2} mM", m.lumen_na_mM);
        println!("  Glucose:  {:.3} mM ({:.2}% reabsorbed)", m.lumen_glucose_mM, m.glucose_reabsorbed_fraction * 100.0);
        println!("  HCO3-:    {:.2} mM", m.lumen_hco3_mM);
        println!("  pH:       {:.3} (target: 7.35-7.45)", m.lumen_ph);
        println!();
        println!("Blood:");
        println!("  Na+:      {:.2} mM", m.blood_na_mM);
        println!("  K+:       {:.3} mM", m.blood_k_mM);
        println!("  Glucose:  {:.3} mM", m.blood_glucose_mM);
        println!();
        println!("Membrane:");
        println!("  V_m:      {:.3} mV (target: -80 to -50 mV)", m.membrane_potential_mV);
        println!("  V_GHK:    {:.3} mV", m.ghk_potential_mV);
        println!("  Drift:    {:+.3} mV", m.drift_mV);
        println!("  I_net:    {:.3e} A", m.net_current_A);
        println!();
        println!("Conservation totals (compartments + bound):");
        println!("  Na+:      {:.6e}", self.total_na);
        println!("  K+:       {:.6e}", self.total_k);
        println!("  Glucose:  {:.6e}", self.total_glucose);
        println!();
        for t in &self.transporters {
            t.print_summary();
        }
    }

    /// Validate against physiological targets and hard invariants
    pub fn validate_state(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let m = &self.metrics;

        if self.min_count < NEGATIVE_COUNT_TOLERANCE {
            warnings.push(format!("Negative particle count: {:.3e}", self.min_count));
        }

        // Na+ (target: 10-20 mM)
        if m.cell_na_mM < 10.0 {
            warnings.push(format!("Cell Na+ too low: {:.1} mM (target: 10-20 mM)", m.cell_na_mM));
        } else if m.cell_na_mM > 20.0 {
            warnings.push(format!("Cell Na+ too high: {:.1} mM (target: 10-20 mM)", m.cell_na_mM));
        }

        // K+ (target: 120-145 mM)
        if m.cell_k_mM < 120.0 {
            warnings.push(format!("Cell K+ too low: {:.1} mM (target: 120-145 mM)", m.cell_k_mM));
        } else if m.cell_k_mM > 145.0 {
            warnings.push(format!("Cell K+ too high: {:.1} mM (target: 120-145 mM)", m.cell_k_mM));
        }

        // pH (cytosol 7.1-7.3, lumen 7.35-7.45)
        if !(7.1..=7.3).contains(&m.cell_ph) {
            warnings.push(format!("Cell pH out of range: {:.3} (target: 7.1-7.3)", m.cell_ph));
        }
        if !(7.35..=7.45).contains(&m.lumen_ph) {
            warnings.push(format!("Lumen pH out of range: {:.3} (target: 7.35-7.45)", m.lumen_ph));
        }

        if m.status == TubuleStatus::EnergyDepleted {
            warnings.push("Cell ATP exhausted: Na+/K+-ATPase cannot cycle".to_string());
        }

        // V_m (target: -80 to -50 mV)
        if m.membrane_potential_mV < -80.0 || m.membrane_potential_mV > -50.0 {
            warnings.push(format!(
                "Membrane potential out of range: {:.1} mV (target: -80 to -50 mV)",
                m.membrane_potential_mV
            ));
        }

        for t in &self.transporters {
            if t.inert {
                warnings.push(format!("Transporter {} is inert", t.id));
            }
            if let Some(rates) = t.last_rates {
                if rates.is_clamped() {
                    warnings.push(format!("Transporter {} rates clamped; detailed balance not exact", t.id));
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(metrics: SimulationMetrics) -> TubuleDiagnostics {
        TubuleDiagnostics {
            metrics,
            transporters: Vec::new(),
            total_na: 0.0,
            total_k: 0.0,
            total_glucose: 0.0,
            min_count: 0.0,
        }
    }

    #[test]
    fn test_default_state_is_clean() {
        assert!(diag(SimulationMetrics::default()).validate_state().is_empty());
    }

    #[test]
    fn test_flags_negative_counts_and_high_na() {
        let mut m = SimulationMetrics::default();
        m.cell_na_mM = 35.0;
        let mut d = diag(m);
        d.min_count = -1.0;
        let warnings = d.validate_state();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("Negative")));
        assert!(warnings.iter().any(|w| w.contains("Na+ too high")));
    }

    #[test]
    fn test_flags_acidified_compartments() {
        let mut m = SimulationMetrics::default();
        m.cell_ph = 6.1;
        m.lumen_ph = 6.2;
        let warnings = diag(m).validate_state();
        assert!(warnings.iter().any(|w| w.contains("Cell pH")));
        assert!(warnings.iter().any(|w| w.contains("Lumen pH")));
    }
}
