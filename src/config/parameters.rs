//! Parameter structures with citation metadata.
//!
//! All biological parameters must include their source citation. Each group
//! lives in its own JSON file under `data/parameters/`; a missing or
//! malformed file falls back to the cited defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::biochemistry::{CarbonicAcidConfig, CarbonicAnhydraseConfig};
use crate::compartment::{Compartment, CompartmentSpec};
use crate::electrochemistry::MembraneConfig;
use crate::transport::{default_pct_table, TransporterDefinition};

/// Default parameter directory
pub const DEFAULT_PARAMETER_DIR: &str = "data/parameters";

/// Top-level parameters container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Compartment layout and initial composition
    pub compartments: CompartmentParameters,
    /// Membrane electrical properties
    pub membrane: MembraneConfig,
    /// Intracompartment chemistry
    pub chemistry: ChemistryParameters,
    /// Transporter topology and kinetics
    pub transporters: TransportTable,
    /// Time stepping
    pub simulation: SimulationParameters,
}

impl Parameters {
    /// Load parameters from JSON files, or use defaults if files don't exist
    pub fn load_or_default() -> Self {
        Self::load_from_dir(DEFAULT_PARAMETER_DIR)
    }

    /// Load parameters from specific directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            compartments: load_json_or_default(dir.join("compartments.json"), "compartment"),
            membrane: load_json_or_default(dir.join("membrane.json"), "membrane"),
            chemistry: load_json_or_default(dir.join("chemistry.json"), "chemistry"),
            transporters: load_json_or_default(dir.join("transporters.json"), "transporter"),
            simulation: load_json_or_default(dir.join("simulation.json"), "simulation"),
        }
    }

    /// Load a single combined parameter file; unlike the directory loader
    /// this reports errors instead of falling back
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading parameters from {}", path.display()))?;
        let params = serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        log::info!("Loaded parameters from {:?}", path);
        Ok(params)
    }

    /// Write all groups into one combined file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Read `path` as JSON, logging and falling back to `T::default()`
pub fn load_json_or_default<T, P>(path: P, label: &str) -> T
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    match std::fs::read_to_string(path.as_ref()) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(params) => {
                log::info!("Loaded {} parameters from {:?}", label, path.as_ref());
                params
            }
            Err(e) => {
                log::warn!("Failed to parse {} parameters: {}, using defaults", label, e);
                T::default()
            }
        },
        Err(_) => {
            log::info!("{} parameters file not found, using defaults", label);
            T::default()
        }
    }
}

/// Compartment layout
///
/// Default: single-voxel PCT with lumen, cell and peritubular blood.
/// Reference: Weinstein AM. Am J Physiol Renal Physiol. 2003;284:F1087-F1098
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompartmentParameters {
    /// Display scale applied to counts for presentation
    pub debug_scale: f64,
    /// Compartments, registered in order
    pub specs: Vec<CompartmentSpec>,
}

impl Default for CompartmentParameters {
    fn default() -> Self {
        Self {
            debug_scale: Compartment::DEFAULT_DEBUG_SCALE,
            specs: vec![CompartmentSpec::lumen(), CompartmentSpec::cell(), CompartmentSpec::blood()],
        }
    }
}

/// CO2/HCO3- buffer chemistry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemistryParameters {
    /// Run carbonic anhydrase and carbonic acid dissociation each tick
    pub enabled: bool,
    pub carbonic_acid: CarbonicAcidConfig,
    pub anhydrase: CarbonicAnhydraseConfig,
}

impl Default for ChemistryParameters {
    fn default() -> Self {
        Self {
            enabled: true,
            carbonic_acid: CarbonicAcidConfig::default(),
            anhydrase: CarbonicAnhydraseConfig::default(),
        }
    }
}

/// Transport-definition table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportTable {
    /// Transporters, advanced in this order every tick
    pub transporters: Vec<TransporterDefinition>,
}

impl Default for TransportTable {
    fn default() -> Self {
        Self {
            transporters: default_pct_table(),
        }
    }
}

/// Time stepping and reproducibility
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Tick length (s); transporter timers run on the millisecond scale
    pub dt_sec: f64,
    /// Default run length for the headless runner (s)
    pub duration_sec: f64,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            dt_sec: 1e-3,
            duration_sec: 1.0,
            seed: None,
        }
    }
}

impl SimulationParameters {
    /// Reject tick and run lengths the driver cannot step through
    pub fn validate(&self) -> Result<()> {
        if !self.dt_sec.is_finite() || self.dt_sec <= 0.0 {
            anyhow::bail!("dt must be positive and finite, got {}", self.dt_sec);
        }
        if !self.duration_sec.is_finite() || self.duration_sec < 0.0 {
            anyhow::bail!("duration must be non-negative and finite, got {}", self.duration_sec);
        }
        Ok(())
    }

    /// Ticks needed to cover `duration_sec`
    pub fn step_count(&self) -> Result<u64> {
        self.validate()?;
        Ok((self.duration_sec / self.dt_sec).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let params = Parameters::default();
        assert_eq!(params.compartments.specs.len(), 3);
        assert_eq!(params.transporters.transporters.len(), 3);
        assert!((params.simulation.dt_sec - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn test_rejects_degenerate_tick() {
        for dt in [0.0, -1e-3, f64::NAN, f64::INFINITY] {
            let sim = SimulationParameters {
                dt_sec: dt,
                ..Default::default()
            };
            assert!(sim.validate().is_err(), "dt {} accepted", dt);
            assert!(sim.step_count().is_err());
        }
        assert_eq!(SimulationParameters::default().step_count().unwrap(), 1000);
    }

    #[test]
    fn test_serialization() {
        let params = Parameters::default();
        let json = serde_json::to_string_pretty(&params).unwrap();
        let parsed: Parameters = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.compartments.specs.len(), params.compartments.specs.len());
        assert!((parsed.membrane.capacitance_F - params.membrane.capacitance_F).abs() < 1e-20);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: SimulationParameters = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(parsed.seed, Some(7));
        assert!((parsed.dt_sec - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn test_missing_dir_falls_back() {
        let params = Parameters::load_from_dir("definitely/not/a/real/dir");
        assert_eq!(params.transporters.transporters.len(), 3);
    }
}
