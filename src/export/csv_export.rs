//! CSV time-series export for simulation metrics.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use crate::state::SimulationMetrics;

/// Record for CSV time-series export
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesRecord {
    /// Simulation time (seconds)
    pub time_sec: f64,
    /// Cell Na+ (mM)
    pub cell_na_mM: f64,
    /// Cell K+ (mM)
    pub cell_k_mM: f64,
    /// Cell glucose (mM)
    pub cell_glucose_mM: f64,
    /// Cell ATP (mM)
    pub cell_atp_mM: f64,
    /// Cell pH
    pub cell_ph: f64,
    /// Lumen Na+ (mM)
    pub lumen_na_mM: f64,
    /// Lumen glucose (mM)
    pub lumen_glucose_mM: f64,
    /// Lumen pH
    pub lumen_ph: f64,
    /// Blood Na+ (mM)
    pub blood_na_mM: f64,
    /// Blood K+ (mM)
    pub blood_k_mM: f64,
    /// Dynamic membrane potential (mV)
    pub membrane_potential_mV: f64,
    /// GHK reference (mV)
    pub ghk_potential_mV: f64,
    /// Net cell current (A)
    pub net_current_A: f64,
    /// Fraction of filtered glucose reabsorbed
    pub glucose_reabsorbed_fraction: f64,
}

impl From<&SimulationMetrics> for TimeSeriesRecord {
    fn from(m: &SimulationMetrics) -> Self {
        Self {
            time_sec: m.simulation_time_sec,
            cell_na_mM: m.cell_na_mM,
            cell_k_mM: m.cell_k_mM,
            cell_glucose_mM: m.cell_glucose_mM,
            cell_atp_mM: m.cell_atp_mM,
            cell_ph: m.cell_ph,
            lumen_na_mM: m.lumen_na_mM,
            lumen_glucose_mM: m.lumen_glucose_mM,
            lumen_ph: m.lumen_ph,
            blood_na_mM: m.blood_na_mM,
            blood_k_mM: m.blood_k_mM,
            membrane_potential_mV: m.membrane_potential_mV,
            ghk_potential_mV: m.ghk_potential_mV,
            net_current_A: m.net_current_A,
            glucose_reabsorbed_fraction: m.glucose_reabsorbed_fraction,
        }
    }
}

/// CSV exporter for time-series data
pub struct CsvExporter {
    writer: csv::Writer<File>,
    /// Sample interval in seconds
    sample_interval_sec: f64,
    /// Last sample time
    last_sample_time: f64,
    /// Path to output file
    path: PathBuf,
}

impl CsvExporter {
    /// Create a new CSV exporter with the given sample interval
    ///
    /// Creates the exports directory if it doesn't exist.
    /// Filename is auto-generated with timestamp.
    pub fn new(sample_interval_sec: f64) -> Result<Self> {
        let dir = PathBuf::from("exports");
        std::fs::create_dir_all(&dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("timeseries_{}.csv", timestamp));
        Self::create(path, sample_interval_sec)
    }

    /// Create an exporter writing to an explicit path
    pub fn create<P: AsRef<Path>>(path: P, sample_interval_sec: f64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let writer = csv::Writer::from_writer(file);

        log::info!("CSV export started: {}", path.display());

        Ok(Self {
            writer,
            sample_interval_sec,
            last_sample_time: -sample_interval_sec, // Ensure first sample is recorded
            path,
        })
    }

    /// Record a sample if the interval has elapsed
    pub fn maybe_record(&mut self, metrics: &SimulationMetrics) -> Result<bool> {
        let time = metrics.simulation_time_sec;

        if time - self.last_sample_time >= self.sample_interval_sec {
            self.record(metrics)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Force record a sample regardless of interval
    pub fn record(&mut self, metrics: &SimulationMetrics) -> Result<()> {
        let record = TimeSeriesRecord::from(metrics);
        self.writer.serialize(&record)?;
        self.last_sample_time = metrics.simulation_time_sec;
        Ok(())
    }

    /// Finish writing and return the output path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        log::info!("CSV export completed: {}", self.path.display());
        Ok(self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_sampling() {
        let path = std::env::temp_dir().join(format!("tubule_ts_{}.csv", std::process::id()));
        let mut exporter = CsvExporter::create(&path, 0.01).unwrap();
        let mut m = SimulationMetrics::default();
        let mut written = 0;
        for i in 0..100 {
            m.simulation_time_sec = i as f64 * 1e-3;
            if exporter.maybe_record(&m).unwrap() {
                written += 1;
            }
        }
        let out = exporter.finish().unwrap();
        let contents = std::fs::read_to_string(&out).unwrap();
        // header + one row per recorded sample
        assert_eq!(contents.lines().count(), written + 1);
        assert!(written >= 9 && written <= 11, "wrote {}", written);
        assert!(contents.starts_with("time_sec,cell_na_mM"));
        let _ = std::fs::remove_file(out);
    }
}
