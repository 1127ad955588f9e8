//! Unified simulation metrics for diagnostics and export.
//!
//! Aggregates the observable state of one tubule patch into a flat,
//! serialisable snapshot suitable for CSV/JSON export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Status indicator for a value relative to its physiological range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SoluteStatus {
    /// Within the normal physiological range
    #[default]
    Normal,
    /// Just outside the range
    Warning,
    /// Well outside the range
    Critical,
}

impl SoluteStatus {
    /// Determine status based on value and normal range
    pub fn from_value(value: f64, normal_min: f64, normal_max: f64) -> Self {
        // 20% margin for warning zone
        let margin = (normal_max - normal_min) * 0.2;

        if value < normal_min - margin || value > normal_max + margin {
            SoluteStatus::Critical
        } else if value < normal_min || value > normal_max {
            SoluteStatus::Warning
        } else {
            SoluteStatus::Normal
        }
    }
}

/// Overall condition of the epithelium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TubuleStatus {
    #[default]
    Normal,
    /// A gradient or potential is out of range
    Stressed,
    /// Cell ATP is exhausted; the pump can no longer cycle
    EnergyDepleted,
}

/// Snapshot of one tubule patch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationMetrics {
    // === Timing ===
    /// Simulated time (s)
    pub simulation_time_sec: f64,
    /// Ticks executed
    pub total_steps: u64,
    pub status: TubuleStatus,

    // === Cell ===
    /// Cytosolic Na+ (mM) - target: 10-20 mM
    pub cell_na_mM: f64,
    pub cell_na_status: SoluteStatus,
    /// Cytosolic K+ (mM) - target: 120-145 mM
    pub cell_k_mM: f64,
    pub cell_k_status: SoluteStatus,
    /// Cytosolic glucose (mM)
    pub cell_glucose_mM: f64,
    /// Cytosolic ATP (mM) - target: 2-5 mM
    pub cell_atp_mM: f64,
    pub cell_atp_status: SoluteStatus,
    /// Cytosolic pH - target: 7.1-7.3
    pub cell_ph: f64,
    pub cell_ph_status: SoluteStatus,

    // === Lumen ===
    pub lumen_na_mM: f64,
    pub lumen_glucose_mM: f64,
    pub lumen_hco3_mM: f64,
    /// Luminal pH - target: 7.35-7.45
    pub lumen_ph: f64,

    // === Blood ===
    pub blood_na_mM: f64,
    pub blood_k_mM: f64,
    pub blood_glucose_mM: f64,

    // === Electrical ===
    /// Dynamic cell membrane potential (mV) - target: -80 to -50 mV
    pub membrane_potential_mV: f64,
    pub membrane_potential_status: SoluteStatus,
    /// GHK equilibrium reference (mV)
    pub ghk_potential_mV: f64,
    /// Dynamic minus GHK (mV)
    pub drift_mV: f64,
    /// Net transporter current into the cell during the last tick (A)
    pub net_current_A: f64,
    /// Per-transporter currents during the last tick (A)
    pub transporter_currents_A: BTreeMap<String, f64>,

    // === Transport ===
    /// Completed cycles per transporter id
    pub transporter_cycles: BTreeMap<String, u64>,
    /// Fraction of the initially filtered glucose that has left the lumen
    pub glucose_reabsorbed_fraction: f64,
    /// Fraction of the initially filtered Na+ that has left the lumen
    pub na_reabsorbed_fraction: f64,
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self {
            simulation_time_sec: 0.0,
            total_steps: 0,
            status: TubuleStatus::Normal,

            // Cell (physiological defaults)
            cell_na_mM: 12.0,
            cell_na_status: SoluteStatus::Normal,
            cell_k_mM: 140.0,
            cell_k_status: SoluteStatus::Normal,
            cell_glucose_mM: 2.0,
            cell_atp_mM: 4.0,
            cell_atp_status: SoluteStatus::Normal,
            cell_ph: 7.2,
            cell_ph_status: SoluteStatus::Normal,

            lumen_na_mM: 140.0,
            lumen_glucose_mM: 5.0,
            lumen_hco3_mM: 24.0,
            lumen_ph: 7.4,

            blood_na_mM: 140.0,
            blood_k_mM: 5.0,
            blood_glucose_mM: 5.0,

            membrane_potential_mV: -70.0,
            membrane_potential_status: SoluteStatus::Normal,
            ghk_potential_mV: -70.0,
            drift_mV: 0.0,
            net_current_A: 0.0,
            transporter_currents_A: BTreeMap::new(),

            transporter_cycles: BTreeMap::new(),
            glucose_reabsorbed_fraction: 0.0,
            na_reabsorbed_fraction: 0.0,
        }
    }
}

impl SimulationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update status indicators based on current values
    pub fn update_status(&mut self) {
        // Reference: Boron & Boulpaep 2017; Weinstein 2003
        self.cell_na_status = SoluteStatus::from_value(self.cell_na_mM, 10.0, 20.0);
        self.cell_k_status = SoluteStatus::from_value(self.cell_k_mM, 120.0, 145.0);
        self.cell_atp_status = SoluteStatus::from_value(self.cell_atp_mM, 2.0, 5.0);
        self.cell_ph_status = SoluteStatus::from_value(self.cell_ph, 7.1, 7.3);
        self.membrane_potential_status = SoluteStatus::from_value(self.membrane_potential_mV, -80.0, -50.0);

        self.status = if self.cell_atp_mM <= 0.0 {
            TubuleStatus::EnergyDepleted
        } else if [
            self.cell_na_status,
            self.cell_k_status,
            self.cell_ph_status,
            self.membrane_potential_status,
        ]
        .contains(&SoluteStatus::Critical)
        {
            TubuleStatus::Stressed
        } else {
            TubuleStatus::Normal
        };
    }
}
